//! Chunked writer
//!
//! The printer's receive buffer is small and has no hardware handshake.
//! Commands go out in MTU-sized chunks, strictly one after another, with a
//! fixed pause after each chunk.

use crate::error::PrinterError;
use crate::infrastructure::bluetooth::platform::BleCharacteristic;
use crate::infrastructure::bluetooth::resolver::WriteEndpoint;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default payload per write. Fits the 23-byte default ATT MTU.
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Pause after every chunk so the printer can drain its buffer.
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: Duration::from_millis(DEFAULT_CHUNK_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    WithoutResponse,
    WithResponse,
}

impl WriteMode {
    /// Modes to try for one chunk, in order.
    pub fn strategies(supports_without_response: bool) -> &'static [WriteMode] {
        if supports_without_response {
            &[WriteMode::WithoutResponse, WriteMode::WithResponse]
        } else {
            &[WriteMode::WithResponse]
        }
    }

    async fn write<C: BleCharacteristic>(
        self,
        characteristic: &C,
        data: &[u8],
    ) -> Result<(), PrinterError> {
        match self {
            WriteMode::WithoutResponse => characteristic.write_without_response(data).await,
            WriteMode::WithResponse => characteristic.write_with_response(data).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    pub chunks: usize,
    pub bytes: usize,
}

/// Deliver `data` over `endpoint`.
///
/// Fails on the first chunk for which every write mode failed. Chunks already
/// delivered are not rolled back, so the printer may emit a truncated label.
pub async fn send<C: BleCharacteristic>(
    endpoint: &WriteEndpoint<C>,
    data: &[u8],
    config: &WriterConfig,
) -> Result<SendReport, PrinterError> {
    if config.chunk_size == 0 {
        return Err(PrinterError::TransportRejected(
            "chunk size must be non-zero".to_string(),
        ));
    }

    let total = data.len().div_ceil(config.chunk_size);
    debug!(
        chunk_count = total,
        chunk_size = config.chunk_size,
        total_bytes = data.len(),
        "Writing data in chunks"
    );

    for (index, chunk) in data.chunks(config.chunk_size).enumerate() {
        let mode = write_chunk(endpoint, chunk).await.map_err(|e| {
            warn!("Chunk {}/{} failed: {}", index + 1, total, e);
            e
        })?;
        trace!("Chunk {}/{} sent ({:?})", index + 1, total, mode);

        tokio::time::sleep(config.chunk_delay).await;
    }

    Ok(SendReport {
        chunks: total,
        bytes: data.len(),
    })
}

async fn write_chunk<C: BleCharacteristic>(
    endpoint: &WriteEndpoint<C>,
    chunk: &[u8],
) -> Result<WriteMode, PrinterError> {
    let mut last_error = None;

    for &mode in WriteMode::strategies(endpoint.supports_write_without_response()) {
        match mode.write(endpoint.characteristic(), chunk).await {
            Ok(()) => return Ok(mode),
            Err(e) => {
                debug!("{:?} write failed: {}", mode, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        PrinterError::TransportRejected("no write mode available".to_string())
    }))
}
