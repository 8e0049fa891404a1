//! Platform seams
//!
//! The pairing subsystem, the GATT link and the writable characteristic are
//! owned by the host platform. The core only consumes the operations below.

use crate::domain::models::ScannedDevice;
use crate::error::PrinterError;
use async_trait::async_trait;
use uuid::Uuid;

/// Opaque identifier plus display name of a paired peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    id: String,
    name: Option<String>,
}

impl DeviceHandle {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.filter(|n| !n.is_empty()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Scope of the device chooser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    /// Services the client wants permission to access once connected.
    pub optional_services: Vec<Uuid>,
    /// List devices even if they advertise none of `optional_services`.
    pub accept_all: bool,
}

/// Pairing and discovery subsystem.
#[async_trait(?Send)]
pub trait BlePlatform {
    type Link: BleLink;

    /// Prompt the user to pick a device. Dismissal is [`PrinterError::UserCancelled`].
    async fn request_device(&self, filter: &DeviceFilter) -> Result<DeviceHandle, PrinterError>;

    /// Devices the user already authorized, without prompting.
    async fn authorized_devices(&self) -> Result<Vec<DeviceHandle>, PrinterError>;

    async fn connect(&self, device: &DeviceHandle) -> Result<Self::Link, PrinterError>;
}

/// An open GATT link. Dropping it tears the connection down.
#[async_trait(?Send)]
pub trait BleLink {
    type Service;
    type Characteristic: BleCharacteristic;

    async fn service(&self, uuid: Uuid) -> Result<Self::Service, PrinterError>;

    async fn characteristic(
        &self,
        service: &Self::Service,
        uuid: Uuid,
    ) -> Result<Self::Characteristic, PrinterError>;
}

#[async_trait(?Send)]
pub trait BleCharacteristic {
    fn supports_write_without_response(&self) -> bool;

    /// Fire-and-forget write; settles once the platform accepted the bytes.
    async fn write_without_response(&self, data: &[u8]) -> Result<(), PrinterError>;

    /// Acknowledged write; settles once the peripheral confirmed it.
    async fn write_with_response(&self, data: &[u8]) -> Result<(), PrinterError>;
}

/// Host-supplied device picker used by backends without a system chooser.
pub trait DeviceChooser {
    /// Index into `devices`, or `None` when the user backs out.
    fn choose(&self, devices: &[ScannedDevice]) -> Option<usize>;
}
