//! GATT link and writable characteristic over `Windows.Devices.Bluetooth`.

use crate::error::PrinterError;
use crate::infrastructure::bluetooth::platform::{BleCharacteristic, BleLink};
use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;
use windows::core::GUID;
use windows::Devices::Bluetooth::BluetoothLEDevice;
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCharacteristicProperties, GattCommunicationStatus, GattDeviceService,
    GattSession, GattWriteOption,
};
use windows::Storage::Streams::DataWriter;

pub(crate) fn to_guid(uuid: Uuid) -> GUID {
    GUID::from_u128(uuid.as_u128())
}

fn check_status(status: GattCommunicationStatus) -> Result<(), PrinterError> {
    if status == GattCommunicationStatus::Success {
        Ok(())
    } else if status == GattCommunicationStatus::Unreachable {
        Err(PrinterError::LinkLost)
    } else {
        Err(PrinterError::TransportRejected(format!("{:?}", status)))
    }
}

/// An open device plus the session keeping it connected. Closed on drop.
pub struct GattLink {
    device: BluetoothLEDevice,
    _session: Option<GattSession>,
}

impl GattLink {
    pub async fn open(device: BluetoothLEDevice) -> Result<Self, PrinterError> {
        let session = match Self::create_gatt_session(&device).await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Could not create GattSession: {}", e);
                None
            }
        };

        Ok(Self {
            device,
            _session: session,
        })
    }

    async fn create_gatt_session(device: &BluetoothLEDevice) -> Result<GattSession, PrinterError> {
        let device_id = device.BluetoothDeviceId()?;
        let session = GattSession::FromDeviceIdAsync(&device_id)?.await?;
        session.SetMaintainConnection(true)?;
        Ok(session)
    }
}

impl Drop for GattLink {
    fn drop(&mut self) {
        let _ = self.device.Close();
    }
}

#[async_trait(?Send)]
impl BleLink for GattLink {
    type Service = GattDeviceService;
    type Characteristic = GattWriteCharacteristic;

    async fn service(&self, uuid: Uuid) -> Result<GattDeviceService, PrinterError> {
        let result = self.device.GetGattServicesForUuidAsync(to_guid(uuid))?.await?;
        check_status(result.Status()?)?;

        let services = result.Services()?;
        if services.Size()? == 0 {
            return Err(PrinterError::Connection(format!("service {} not found", uuid)));
        }
        Ok(services.GetAt(0)?)
    }

    async fn characteristic(
        &self,
        service: &GattDeviceService,
        uuid: Uuid,
    ) -> Result<GattWriteCharacteristic, PrinterError> {
        let result = service.GetCharacteristicsForUuidAsync(to_guid(uuid))?.await?;
        check_status(result.Status()?)?;

        let characteristics = result.Characteristics()?;
        if characteristics.Size()? == 0 {
            return Err(PrinterError::Connection(format!(
                "characteristic {} not found",
                uuid
            )));
        }

        let inner = characteristics.GetAt(0)?;
        let properties = inner.CharacteristicProperties()?;
        let without_response =
            (properties.0 & GattCharacteristicProperties::WriteWithoutResponse.0) != 0;
        debug!(
            "Characteristic {} properties: {:#x}",
            uuid, properties.0
        );

        Ok(GattWriteCharacteristic {
            inner,
            without_response,
        })
    }
}

pub struct GattWriteCharacteristic {
    inner: GattCharacteristic,
    without_response: bool,
}

impl GattWriteCharacteristic {
    async fn write(&self, data: &[u8], option: GattWriteOption) -> Result<(), PrinterError> {
        let writer = DataWriter::new()?;
        writer.WriteBytes(data)?;
        let buffer = writer.DetachBuffer()?;

        let status = self.inner.WriteValueWithOptionAsync(&buffer, option)?.await?;
        check_status(status)
    }
}

#[async_trait(?Send)]
impl BleCharacteristic for GattWriteCharacteristic {
    fn supports_write_without_response(&self) -> bool {
        self.without_response
    }

    async fn write_without_response(&self, data: &[u8]) -> Result<(), PrinterError> {
        self.write(data, GattWriteOption::WriteWithoutResponse).await
    }

    async fn write_with_response(&self, data: &[u8]) -> Result<(), PrinterError> {
        self.write(data, GattWriteOption::WriteWithResponse).await
    }
}
