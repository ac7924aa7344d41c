//! Frame checksum and validation.
//!
//! The checksum is a single byte: the wrapping sum of every byte between the
//! header and the checksum itself, XORed with `0x44`.
//!
//! ```text
//! +----+----+------+----------------------+----------+
//! | FF | 55 | type | body ...             | checksum |
//! +----+----+------+----------------------+----------+
//!           |<------ summed payload ----->|
//! ```

use crate::constants::*;
use crate::error::PacketError;
use crate::types::MessageType;

/// Compute the checksum of a payload (header and checksum byte excluded).
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)) ^ CHECKSUM_XOR
}

/// Compute the checksum for a frame that does not yet carry one.
///
/// The leading header bytes are skipped if present.
pub fn frame_checksum(frame: &[u8]) -> u8 {
    let payload = frame.strip_prefix(&HEADER[..]).unwrap_or(frame);
    checksum(payload)
}

/// Check that `frame` is well formed, its checksum matches, and it carries
/// the `expected` message type.
pub fn validate(frame: &[u8], expected: MessageType) -> Result<(), PacketError> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(PacketError::MalformedFrame {
            expected: MIN_FRAME_SIZE,
            actual: frame.len(),
        });
    }
    if !frame.starts_with(&HEADER) {
        return Err(PacketError::MissingHeader);
    }

    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_SIZE);
    let computed = frame_checksum(body);
    if trailer[0] != computed {
        return Err(PacketError::ChecksumMismatch {
            expected: computed,
            actual: trailer[0],
        });
    }

    let tag = frame[OFFSET_MESSAGE_TYPE];
    if tag != expected.code() {
        return Err(PacketError::UnexpectedMessageType {
            expected: expected.code(),
            actual: tag,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_reference() {
        // resetWh on an AC meter
        assert_eq!(checksum(&[0x11, 0x01, 0x01, 0, 0, 0, 0]), 0x57);
        assert_eq!(
            frame_checksum(&[0xFF, 0x55, 0x11, 0x01, 0x01, 0, 0, 0, 0]),
            0x57
        );
        // enter on an AC meter sums to exactly the XOR constant
        assert_eq!(checksum(&[0x11, 0x01, 0x32, 0, 0, 0, 0]), 0x00);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01 ^ 0x44);
    }

    #[test]
    fn test_validate_ok() {
        let frame = [0xFF, 0x55, 0x11, 0x01, 0x01, 0, 0, 0, 0, 0x57];
        assert_eq!(validate(&frame, MessageType::Command), Ok(()));
    }

    #[test]
    fn test_validate_checksum_mismatch() {
        let frame = [0xFF, 0x55, 0x11, 0x01, 0x01, 0, 0, 0, 0, 0x58];
        assert_eq!(
            validate(&frame, MessageType::Command),
            Err(PacketError::ChecksumMismatch {
                expected: 0x57,
                actual: 0x58
            })
        );
    }

    #[test]
    fn test_validate_wrong_type() {
        let frame = [0xFF, 0x55, 0x11, 0x01, 0x01, 0, 0, 0, 0, 0x57];
        assert_eq!(
            validate(&frame, MessageType::Report),
            Err(PacketError::UnexpectedMessageType {
                expected: 0x01,
                actual: 0x11
            })
        );
    }

    #[test]
    fn test_validate_structure() {
        assert_eq!(
            validate(&[0xFF, 0x55, 0x01], MessageType::Report),
            Err(PacketError::MalformedFrame {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            validate(&[0xFF, 0x56, 0x01, 0x45], MessageType::Report),
            Err(PacketError::MissingHeader)
        );
    }
}
