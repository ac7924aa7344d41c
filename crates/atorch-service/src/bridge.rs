//! Framing between the host and the BLE-UART bridge.
//!
//! TCP does not preserve write boundaries, but the meter protocol relies on
//! notification boundaries to find frames. The bridge therefore wraps every
//! BLE notification it forwards, and the host wraps every write it wants sent
//! as one BLE write:
//!
//! ```text
//! +--------+--------+--------+-------------------+
//! | marker | len_lo | len_hi | data[0..len]      |
//! +--------+--------+--------+-------------------+
//! ```
//!
//! The marker is `>` for bridge→host notifications and `<` for host→bridge
//! writes.

use bytes::{Buf, BufMut, BytesMut};
use tracing::warn;

/// Marker for notifications forwarded by the bridge.
pub const NOTIFICATION_MARKER: u8 = b'>';

/// Marker for writes sent to the bridge.
pub const WRITE_MARKER: u8 = b'<';

/// Size of marker plus length prefix.
pub const BRIDGE_HEADER_SIZE: usize = 3;

/// Largest payload a single BLE notification or write can carry.
pub const MAX_NOTIFICATION_SIZE: usize = 512;

/// Splits the bridge byte stream back into BLE notifications.
#[derive(Debug, Default)]
pub struct BridgeCodec {
    buffer: BytesMut,
}

impl BridgeCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        BridgeCodec {
            buffer: BytesMut::with_capacity(MAX_NOTIFICATION_SIZE),
        }
    }

    /// Add bytes read from the stream.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete notification, if one is buffered.
    ///
    /// Bytes before a marker are discarded, as is a marker whose length
    /// exceeds [`MAX_NOTIFICATION_SIZE`].
    pub fn decode(&mut self) -> Option<Vec<u8>> {
        loop {
            let skipped = self
                .buffer
                .iter()
                .position(|b| *b == NOTIFICATION_MARKER)
                .unwrap_or(self.buffer.len());
            if skipped > 0 {
                warn!(skipped, "discarding bytes outside a notification");
                self.buffer.advance(skipped);
            }

            if self.buffer.len() < BRIDGE_HEADER_SIZE {
                return None;
            }

            let len = u16::from_le_bytes([self.buffer[1], self.buffer[2]]) as usize;
            if len > MAX_NOTIFICATION_SIZE {
                warn!(len, "notification length out of range, resyncing");
                self.buffer.advance(1);
                continue;
            }

            if self.buffer.len() < BRIDGE_HEADER_SIZE + len {
                return None;
            }

            self.buffer.advance(BRIDGE_HEADER_SIZE);
            return Some(self.buffer.split_to(len).to_vec());
        }
    }

    /// Wrap `data` as one write for the bridge to forward.
    pub fn encode(data: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BRIDGE_HEADER_SIZE + data.len());
        buf.put_u8(WRITE_MARKER);
        buf.put_u16_le(data.len() as u16);
        buf.extend_from_slice(data);
        buf
    }

    /// Wrap `data` as a notification, the way the bridge forwards it.
    pub fn encode_notification(data: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BRIDGE_HEADER_SIZE + data.len());
        buf.put_u8(NOTIFICATION_MARKER);
        buf.put_u16_le(data.len() as u16);
        buf.extend_from_slice(data);
        buf
    }

    /// Number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}
