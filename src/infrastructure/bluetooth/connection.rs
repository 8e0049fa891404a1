//! BLE Connection Module
//!
//! Opens a link to a chosen device and resolves its print characteristic.

use crate::error::PrinterError;
use crate::infrastructure::bluetooth::platform::{BleLink, BlePlatform, DeviceHandle};
use crate::infrastructure::bluetooth::protocol::ServiceCandidate;
use crate::infrastructure::bluetooth::resolver::{self, WriteEndpoint};
use tracing::info;

/// The device, its open link and the endpoint resolved on that link.
///
/// The link is held so the connection stays up for as long as the endpoint
/// is in use.
pub struct ActiveConnection<L: BleLink> {
    device: DeviceHandle,
    endpoint: WriteEndpoint<L::Characteristic>,
    _link: L,
}

impl<L: BleLink> ActiveConnection<L> {
    /// Connect to `device` and resolve a fresh endpoint against `candidates`.
    pub async fn open<P>(
        platform: &P,
        device: DeviceHandle,
        candidates: &[ServiceCandidate],
    ) -> Result<Self, PrinterError>
    where
        P: BlePlatform<Link = L>,
    {
        info!("Connecting to {}", device.display_name());
        let link = platform.connect(&device).await?;
        let endpoint = resolver::resolve(&link, candidates).await?;
        info!("Connected to {}", device.display_name());

        Ok(Self {
            device,
            endpoint,
            _link: link,
        })
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    pub fn endpoint(&self) -> &WriteEndpoint<L::Characteristic> {
        &self.endpoint
    }
}
