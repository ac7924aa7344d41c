//! Error types for the meter service.

use atorch_packet::PacketError;
use thiserror::Error;

/// Errors that can occur while talking to a meter.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// I/O error on the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame could not be decoded or encoded.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Configuration values are out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
