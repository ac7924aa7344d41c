//! Frame type and notification reassembly.
//!
//! The BLE characteristic delivers notifications with no length prefix, and
//! a single frame may arrive split over several notifications or several
//! frames may share one. The only boundary signal is the `FF 55` header at
//! the start of a notification:
//!
//! ```text
//! notification:  [FF 55 01 01 ..]  [.. ..]  [.. ..]  [FF 55 01 01 ..]
//!                 \________ frame N _______/          \__ frame N+1 ..
//! ```
//!
//! A frame is therefore only complete once the next header-leading
//! notification arrives, or when the session is flushed.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::constants::*;
use crate::types::MessageType;

/// An immutable, complete frame as exchanged with a meter.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Frame(Bytes);

impl Frame {
    /// Wrap raw bytes as a frame. No validation is performed.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Frame(bytes.into())
    }

    /// Parse a frame from a hex string (whitespace is ignored).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(Frame(Bytes::from(hex::decode(compact)?)))
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the frame, returning its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Frame length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The declared message type, if the tag is present and known.
    pub fn message_type(&self) -> Option<MessageType> {
        self.0
            .get(OFFSET_MESSAGE_TYPE)
            .copied()
            .and_then(MessageType::from_code)
    }

    /// Upper-case hex rendering, as used in logs and the CLI.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.to_hex())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Accumulates notification chunks into complete frames.
///
/// Holds only the fragments of the frame currently in flight. One assembler
/// belongs to one connection; clear it when the connection is re-established.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    /// Bytes of the frame in flight.
    buffer: BytesMut,
    /// Number of chunks that make up `buffer`.
    fragments: usize,
}

impl FrameAssembler {
    /// Create a new, empty assembler.
    pub fn new() -> Self {
        FrameAssembler {
            buffer: BytesMut::with_capacity(REPORT_FRAME_SIZE * 2),
            fragments: 0,
        }
    }

    /// Feed one transport chunk.
    ///
    /// Returns the previously buffered frame when `chunk` starts a new one,
    /// or `None` if the chunk was appended to the frame in flight.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<Frame> {
        if chunk.starts_with(&HEADER) {
            let completed = self.take();
            self.buffer.extend_from_slice(chunk);
            self.fragments = 1;
            return completed;
        }

        if chunk.is_empty() {
            return None;
        }

        if self.buffer.len() + chunk.len() > MAX_BUFFERED_BYTES {
            log::warn!(
                "discarding {} buffered bytes in {} fragments: no frame header within {} bytes",
                self.buffer.len() + chunk.len(),
                self.fragments + 1,
                MAX_BUFFERED_BYTES
            );
            self.clear();
            return None;
        }

        self.buffer.extend_from_slice(chunk);
        self.fragments += 1;
        None
    }

    /// Emit whatever is buffered as a final frame (end of session).
    pub fn flush(&mut self) -> Option<Frame> {
        self.take()
    }

    /// Number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of chunks making up the frame in flight.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Drop the frame in flight.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.fragments = 0;
    }

    fn take(&mut self) -> Option<Frame> {
        if self.buffer.is_empty() {
            return None;
        }
        let frame = Frame(self.buffer.split().freeze());
        log::trace!("reassembled {} bytes from {} fragments", frame.len(), self.fragments);
        self.fragments = 0;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMAND: [u8; 10] = [0xFF, 0x55, 0x11, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x57];

    #[test]
    fn test_first_chunk_emits_nothing() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.feed(&COMMAND).is_none());
        assert_eq!(assembler.buffered_len(), 10);
        assert_eq!(assembler.fragment_count(), 1);
    }

    #[test]
    fn test_frame_emitted_on_next_header() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.feed(&COMMAND[..4]).is_none());
        assert!(assembler.feed(&COMMAND[4..]).is_none());
        assert_eq!(assembler.fragment_count(), 2);

        let frame = assembler.feed(&HEADER).expect("should emit frame");
        assert_eq!(frame.as_bytes(), &COMMAND);
        assert_eq!(assembler.buffered_len(), 2);
    }

    #[test]
    fn test_flush_drains_tail() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&COMMAND);
        let frame = assembler.flush().expect("should flush frame");
        assert_eq!(frame.as_bytes(), &COMMAND);
        assert!(assembler.flush().is_none());
        assert_eq!(assembler.fragment_count(), 0);
    }

    #[test]
    fn test_headerless_start_is_kept_separate() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.feed(&[0x01, 0x02]).is_none());
        let stray = assembler.feed(&COMMAND).expect("stray bytes emitted");
        assert_eq!(stray.as_bytes(), &[0x01, 0x02]);
        assert_eq!(assembler.flush().expect("command").as_bytes(), &COMMAND);
    }

    #[test]
    fn test_single_ff_is_not_a_header() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&COMMAND[..9]);
        assert!(assembler.feed(&[0xFF]).is_none());
        assert_eq!(assembler.buffered_len(), 10);
    }

    #[test]
    fn test_overflow_discards_buffer() {
        let mut assembler = FrameAssembler::new();
        let junk = [0u8; 100];
        for _ in 0..5 {
            assembler.feed(&junk);
        }
        assert_eq!(assembler.buffered_len(), 500);
        assembler.feed(&junk);
        assert_eq!(assembler.buffered_len(), 0);
        assert!(assembler.flush().is_none());
    }

    #[test]
    fn test_clear() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&COMMAND);
        assembler.clear();
        assert_eq!(assembler.buffered_len(), 0);
        assert!(assembler.feed(&COMMAND).is_none());
    }

    #[test]
    fn test_frame_hex() {
        let frame = Frame::from_hex("ff55 1101 0100 0000 0057").expect("valid hex");
        assert_eq!(frame.as_bytes(), &COMMAND);
        assert_eq!(frame.to_hex(), "FF551101010000000057");
        assert_eq!(frame.message_type(), Some(MessageType::Command));
    }
}
