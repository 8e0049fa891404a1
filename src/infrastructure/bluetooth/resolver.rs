//! Transport characteristic resolution
//!
//! Probes the known service candidates in priority order and returns the
//! first one whose service and characteristic both resolve.

use crate::error::PrinterError;
use crate::infrastructure::bluetooth::platform::{BleCharacteristic, BleLink};
use crate::infrastructure::bluetooth::protocol::ServiceCandidate;
use tracing::{debug, info};

/// A resolved print characteristic. Invalid as soon as its link drops.
pub struct WriteEndpoint<C> {
    candidate: ServiceCandidate,
    characteristic: C,
}

impl<C: BleCharacteristic> WriteEndpoint<C> {
    pub fn new(candidate: ServiceCandidate, characteristic: C) -> Self {
        Self {
            candidate,
            characteristic,
        }
    }

    pub fn candidate(&self) -> &ServiceCandidate {
        &self.candidate
    }

    pub fn characteristic(&self) -> &C {
        &self.characteristic
    }

    pub fn supports_write_without_response(&self) -> bool {
        self.characteristic.supports_write_without_response()
    }
}

impl<C> std::fmt::Debug for WriteEndpoint<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteEndpoint")
            .field("candidate", &self.candidate)
            .finish_non_exhaustive()
    }
}

pub async fn resolve<L: BleLink>(
    link: &L,
    candidates: &[ServiceCandidate],
) -> Result<WriteEndpoint<L::Characteristic>, PrinterError> {
    for candidate in candidates {
        match probe(link, candidate).await {
            Ok(characteristic) => {
                info!(
                    "Print characteristic resolved via {} ({} / {})",
                    candidate.name, candidate.service_uuid, candidate.characteristic_uuid
                );
                return Ok(WriteEndpoint::new(candidate.clone(), characteristic));
            }
            Err(e) => debug!("{} not available, trying next: {}", candidate.name, e),
        }
    }

    Err(PrinterError::NoCompatibleService)
}

async fn probe<L: BleLink>(
    link: &L,
    candidate: &ServiceCandidate,
) -> Result<L::Characteristic, PrinterError> {
    let service = link.service(candidate.service_uuid).await?;
    link.characteristic(&service, candidate.characteristic_uuid)
        .await
}
