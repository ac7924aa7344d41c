//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding or encoding meter frames.
///
/// Every decode failure is local to the frame that produced it; callers
/// report it and move on to the next frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Trailing checksum byte does not match the payload.
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the payload.
        expected: u8,
        /// Checksum carried by the frame.
        actual: u8,
    },

    /// Message type tag is not the one required by the context.
    #[error("unexpected message type: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedMessageType {
        /// Required message type tag.
        expected: u8,
        /// Tag carried by the frame.
        actual: u8,
    },

    /// Device type discriminant is not AC, DC or USB.
    #[error("unknown device type: 0x{0:02X}")]
    UnknownDeviceType(u8),

    /// Frame length does not match its claimed type.
    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        /// Required length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Frame does not start with `FF 55`.
    #[error("frame does not start with header FF 55")]
    MissingHeader,

    /// Encoder invoked with an unsupported operation/device combination.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl PacketError {
    /// Create an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        PacketError::InvalidOperation(message.into())
    }
}
