//! BLE Scanner Module
//!
//! Advertisement discovery backing the device chooser.

use super::gatt::to_guid;
use crate::domain::models::ScannedDevice;
use crate::error::PrinterError;
use crate::infrastructure::bluetooth::platform::DeviceFilter;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use windows::core::GUID;
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEScanningMode,
};
use windows::Foundation::TypedEventHandler;

/// BLE Scanner collecting advertisements until stopped
#[derive(Default)]
pub struct BleScanner {
    watcher: Option<BluetoothLEAdvertisementWatcher>,
    found: Arc<Mutex<Vec<ScannedDevice>>>,
}

impl BleScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start scanning for devices matching `filter`.
    pub fn start(&mut self, filter: &DeviceFilter) -> Result<(), PrinterError> {
        self.stop()?;

        info!(
            "Starting BLE scan ({} print services, accept all: {})",
            filter.optional_services.len(),
            filter.accept_all
        );

        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let found = self.found.clone();
        let print_services: Vec<GUID> = filter.optional_services.iter().map(|u| to_guid(*u)).collect();
        let accept_all = filter.accept_all;

        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let adv = args.Advertisement()?;
                    let service_uuids = adv.ServiceUuids()?;

                    let mut advertises_print_service = false;
                    for i in 0..service_uuids.Size()? {
                        if print_services.contains(&service_uuids.GetAt(i)?) {
                            advertises_print_service = true;
                            break;
                        }
                    }

                    if accept_all || advertises_print_service {
                        let name = adv.LocalName()?.to_string();
                        let device = ScannedDevice {
                            name: if name.is_empty() {
                                "Unknown".to_string()
                            } else {
                                name
                            },
                            address: args.BluetoothAddress()?,
                            signal_strength: args.RawSignalStrengthInDBm()?,
                            advertises_print_service,
                        };
                        if let Ok(mut found) = found.lock() {
                            record(&mut found, device);
                        }
                    }
                }
                Ok(())
            },
        );

        watcher.Received(&handler)?;
        watcher.Start()?;
        self.watcher = Some(watcher);

        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), PrinterError> {
        if let Some(watcher) = self.watcher.take() {
            debug!("Stopping BLE scan");
            watcher.Stop()?;
        }
        Ok(())
    }

    /// Devices seen so far, print services first, then strongest signal.
    pub fn devices(&self) -> Vec<ScannedDevice> {
        let mut devices = self
            .found
            .lock()
            .map(|found| found.clone())
            .unwrap_or_default();
        devices.sort_by(|a, b| {
            b.advertises_print_service
                .cmp(&a.advertises_print_service)
                .then(b.signal_strength.cmp(&a.signal_strength))
        });
        devices
    }

    /// Scan for `duration` and return what was seen.
    pub async fn scan(
        filter: &DeviceFilter,
        duration: Duration,
    ) -> Result<Vec<ScannedDevice>, PrinterError> {
        let mut scanner = Self::new();
        scanner.start(filter)?;
        tokio::time::sleep(duration).await;
        scanner.stop()?;

        let devices = scanner.devices();
        info!("Scan finished, {} devices found", devices.len());
        Ok(devices)
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Keep one entry per address; a later advertisement refreshes it.
fn record(found: &mut Vec<ScannedDevice>, device: ScannedDevice) {
    match found.iter_mut().find(|d| d.address == device.address) {
        Some(existing) => {
            existing.signal_strength = device.signal_strength;
            existing.advertises_print_service |= device.advertises_print_service;
            if existing.name == "Unknown" {
                existing.name = device.name;
            }
        }
        None => found.push(device),
    }
}
