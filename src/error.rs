use thiserror::Error;

/// Failures surfaced by the printer connection and transmission pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrinterError {
    /// The device chooser was dismissed. Callers treat this as a non-error.
    #[error("device selection was cancelled by the user")]
    UserCancelled,

    /// The peripheral is reachable but exposes none of the known print characteristics.
    #[error("no compatible print service found on the device")]
    NoCompatibleService,

    /// A write was attempted against an endpoint whose link has dropped.
    #[error("connection to the printer was lost")]
    LinkLost,

    /// A specific write call was refused by the transport.
    #[error("write rejected by transport: {0}")]
    TransportRejected(String),

    /// No printer endpoint is active for this session.
    #[error("printer not connected")]
    NotConnected,

    /// Generic platform failure while discovering or opening a link.
    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid label description: {0}")]
    InvalidLabel(String),
}

/// HRESULT_FROM_WIN32(ERROR_CANCELLED), raised when the user dismisses a system prompt.
#[cfg(windows)]
const E_CANCELLED: u32 = 0x800704C7;

#[cfg(windows)]
impl From<windows::core::Error> for PrinterError {
    fn from(error: windows::core::Error) -> Self {
        if error.code().0 as u32 == E_CANCELLED {
            PrinterError::UserCancelled
        } else {
            PrinterError::Connection(error.to_string())
        }
    }
}

impl From<serde_json::Error> for PrinterError {
    fn from(error: serde_json::Error) -> Self {
        PrinterError::InvalidLabel(error.to_string())
    }
}
