//! Primitive field readers.
//!
//! All multi-byte fields in meter reports are big-endian. Callers check the
//! frame length before reading, so offsets are assumed to be in range.

/// Read a big-endian `u16` at `offset`.
pub fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Read a big-endian 24-bit unsigned integer at `offset`.
pub fn read_u24_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([0, buf[offset], buf[offset + 1], buf[offset + 2]])
}

/// Read a big-endian `u32` at `offset`.
pub fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Read a packed running duration and render it as `HHH:MM:SS`.
///
/// Layout: hours (u16 BE), minutes (u8), seconds (u8).
pub fn read_duration(buf: &[u8], offset: usize) -> String {
    let hours = read_u16_be(buf, offset);
    let minutes = buf[offset + 2];
    let seconds = buf[offset + 3];
    format!("{:03}:{:02}:{:02}", hours, minutes, seconds)
}
