use super::gatt::GattLink;
use super::scanner::BleScanner;
use crate::error::PrinterError;
use crate::infrastructure::bluetooth::platform::{
    BlePlatform, DeviceChooser, DeviceFilter, DeviceHandle,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use windows::core::HSTRING;
use windows::Devices::Bluetooth::BluetoothLEDevice;
use windows::Devices::Enumeration::DeviceInformation;

const ADDRESS_ID_PREFIX: &str = "ble-address:";

/// Device handles for scanned devices carry the raw address.
fn address_id(address: u64) -> String {
    format!("{}{:012x}", ADDRESS_ID_PREFIX, address)
}

fn parse_address_id(id: &str) -> Option<u64> {
    u64::from_str_radix(id.strip_prefix(ADDRESS_ID_PREFIX)?, 16).ok()
}

/// Windows pairing subsystem. Device selection is an advertisement scan
/// followed by `chooser`.
pub struct WinRtPlatform<C: DeviceChooser> {
    chooser: C,
    scan_duration: Duration,
}

impl<C: DeviceChooser> WinRtPlatform<C> {
    pub fn new(chooser: C, scan_duration: Duration) -> Self {
        Self {
            chooser,
            scan_duration,
        }
    }
}

#[async_trait(?Send)]
impl<C: DeviceChooser> BlePlatform for WinRtPlatform<C> {
    type Link = GattLink;

    async fn request_device(&self, filter: &DeviceFilter) -> Result<DeviceHandle, PrinterError> {
        let devices = BleScanner::scan(filter, self.scan_duration).await?;
        if devices.is_empty() {
            return Err(PrinterError::Connection(
                "No Bluetooth LE devices found".to_string(),
            ));
        }

        let device = self
            .chooser
            .choose(&devices)
            .and_then(|index| devices.get(index))
            .ok_or(PrinterError::UserCancelled)?;

        info!("Selected {} ({:012x})", device.name, device.address);
        Ok(DeviceHandle::new(
            address_id(device.address),
            Some(device.name.clone()),
        ))
    }

    async fn authorized_devices(&self) -> Result<Vec<DeviceHandle>, PrinterError> {
        let selector = BluetoothLEDevice::GetDeviceSelectorFromPairingState(true)?;
        let infos = DeviceInformation::FindAllAsyncAqsFilter(&selector)?.await?;

        let mut devices = Vec::new();
        for i in 0..infos.Size()? {
            let info = infos.GetAt(i)?;
            devices.push(DeviceHandle::new(
                info.Id()?.to_string(),
                Some(info.Name()?.to_string()),
            ));
        }
        debug!("{} paired Bluetooth LE devices", devices.len());
        Ok(devices)
    }

    async fn connect(&self, device: &DeviceHandle) -> Result<GattLink, PrinterError> {
        let ble_device = match parse_address_id(device.id()) {
            Some(address) => BluetoothLEDevice::FromBluetoothAddressAsync(address)?.await?,
            None => BluetoothLEDevice::FromIdAsync(&HSTRING::from(device.id()))?.await?,
        };
        GattLink::open(ble_device).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_id_round_trip() {
        let id = address_id(0xdc0d_30a1_b2c3);
        assert_eq!(id, "ble-address:dc0d30a1b2c3");
        assert_eq!(parse_address_id(&id), Some(0xdc0d_30a1_b2c3));
    }

    #[test]
    fn test_system_ids_are_not_addresses() {
        assert_eq!(
            parse_address_id("BluetoothLE#BluetoothLEdc:0d:30:a1:b2:c3"),
            None
        );
    }
}
