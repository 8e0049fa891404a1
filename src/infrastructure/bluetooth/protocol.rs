//! MHT Printer BLE Protocol
//!
//! GATT addresses used by the MHT-L1081 family and compatible thermal label
//! printers. Firmware revisions expose the print characteristic under
//! different UUIDs, so the addresses are kept as an ordered candidate list.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bluetooth SIG base UUID `00000000-0000-1000-8000-00805f9b34fb`.
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// Expand a 16-bit assigned number into a full 128-bit UUID.
pub const fn bluetooth_uuid(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// Print service on newer MHT firmware.
pub const SERVICE_18F0: Uuid = bluetooth_uuid(0x18f0);
/// Write characteristic under [`SERVICE_18F0`].
pub const CHAR_2AF1: Uuid = bluetooth_uuid(0x2af1);

/// Print service on older MHT firmware and generic serial-over-GATT printers.
pub const SERVICE_FF00: Uuid = bluetooth_uuid(0xff00);
/// Write characteristic under [`SERVICE_FF00`].
pub const CHAR_FF02: Uuid = bluetooth_uuid(0xff02);

/// Vendor service some printers require permission for before any GATT access.
pub const SERVICE_AE30: Uuid = bluetooth_uuid(0xae30);

/// One known firmware dialect: the service hosting the print characteristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCandidate {
    pub name: String,
    pub service_uuid: Uuid,
    pub characteristic_uuid: Uuid,
}

impl ServiceCandidate {
    pub fn new(name: impl Into<String>, service_uuid: Uuid, characteristic_uuid: Uuid) -> Self {
        Self {
            name: name.into(),
            service_uuid,
            characteristic_uuid,
        }
    }
}

pub fn default_service_candidates() -> Vec<ServiceCandidate> {
    vec![
        ServiceCandidate::new("MHT 18F0", SERVICE_18F0, CHAR_2AF1),
        ServiceCandidate::new("MHT FF00", SERVICE_FF00, CHAR_FF02),
    ]
}

pub fn default_extra_services() -> Vec<Uuid> {
    vec![SERVICE_AE30]
}

pub fn default_printer_name_patterns() -> Vec<String> {
    vec!["MTH".to_string(), "Printer".to_string()]
}

/// Case-sensitive substring match against the known model tokens.
pub fn matches_printer_name(name: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| !pattern.is_empty() && name.contains(pattern.as_str()))
}
