//! Client for MHT-series BLE thermal label printers.
//!
//! [`domain`] turns label descriptions into TSPL jobs, [`infrastructure`]
//! finds the printer, keeps the link and streams jobs to it.

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::encoder::{encode, CommandBuffer, LabelLayout};
pub use domain::label::{LabelDescriptor, PieceRow, UnitMode};
pub use error::PrinterError;
pub use infrastructure::bluetooth::{ConnectOutcome, PrinterSession};
