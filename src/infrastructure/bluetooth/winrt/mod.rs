//! Windows Runtime backend
//!
//! - [`scanner`] - advertisement discovery for the device chooser
//! - [`gatt`] - GATT link and write characteristic
//! - [`platform`] - pairing subsystem tying both together

pub mod gatt;
pub mod platform;
pub mod scanner;

pub use platform::WinRtPlatform;
