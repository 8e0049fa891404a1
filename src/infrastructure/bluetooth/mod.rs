//! Bluetooth Module
//!
//! Provides BLE communication with MHT-series thermal label printers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     PrinterSession                       │
//! │  (Main coordinator - public API for the application)     │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │ Connection│  │  Resolver  │  │  Writer  │
//! │           │  │            │  │          │
//! │ - Link    │  │ - Dialect  │  │ - Chunks │
//! │ - Endpoint│  │   probing  │  │ - Pacing │
//! └─────┬─────┘  └────────────┘  └──────────┘
//!       │
//!       ▼
//! ┌─────────────────────────────┐
//! │  Platform (traits)          │
//! │  - winrt    (Windows)       │
//! └─────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Service and characteristic UUIDs of the known firmware dialects
//! - [`platform`] - Pairing, link and characteristic seams
//! - [`resolver`] - Picks the write characteristic on an open link
//! - [`connection`] - Opens a link and holds it with its endpoint
//! - [`writer`] - Chunked, paced transmission
//! - [`service`] - Main session coordinator

pub mod connection;
pub mod platform;
pub mod protocol;
pub mod resolver;
pub mod service;
pub mod writer;

#[cfg(windows)]
pub mod winrt;

#[cfg(test)]
pub(crate) mod fake;

// Re-export main service for convenience
pub use service::{ConnectOutcome, PrinterSession};
