//! Protocol constants
//!
//! These constants define the framing bytes, message and device type tags,
//! command opcodes and report layout used by Atorch meters.

// ============================================================================
// Framing
// ============================================================================

/// Fixed two-byte header that starts every frame.
pub const HEADER: [u8; 2] = [0xFF, 0x55];
/// Length of the frame header.
pub const HEADER_SIZE: usize = 2;
/// Length of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 1;
/// Smallest frame that can carry a message type tag and a checksum.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 1 + CHECKSUM_SIZE;
/// Length of every report frame, regardless of device type.
pub const REPORT_FRAME_SIZE: usize = 36;
/// Length of every command frame.
pub const COMMAND_FRAME_SIZE: usize = 10;
/// Length of the command payload (tag, device type, opcode, 4-byte value).
pub const COMMAND_PAYLOAD_SIZE: usize = 7;
/// Upper bound on buffered reassembly bytes before the buffer is discarded.
pub const MAX_BUFFERED_BYTES: usize = 512;

/// Constant folded into the payload sum to produce the checksum.
pub const CHECKSUM_XOR: u8 = 0x44;

// ============================================================================
// Message Types
// ============================================================================

/// Telemetry report pushed by the meter.
pub const MSG_TYPE_REPORT: u8 = 0x01;
/// Control command sent to the meter.
pub const MSG_TYPE_COMMAND: u8 = 0x11;

// ============================================================================
// Device Types
// ============================================================================

/// AC meter (mains plug-in).
pub const DEVICE_TYPE_AC: u8 = 0x01;
/// DC meter / electronic load.
pub const DEVICE_TYPE_DC: u8 = 0x02;
/// USB inline meter.
pub const DEVICE_TYPE_USB: u8 = 0x03;

// ============================================================================
// Command Opcodes
// ============================================================================

/// Reset the accumulated energy counter.
pub const OP_RESET_WH: u8 = 0x01;
/// Reset the accumulated charge counter.
pub const OP_RESET_AH: u8 = 0x02;
/// Reset the running duration.
pub const OP_RESET_DURATION: u8 = 0x03;
/// Reset all counters.
pub const OP_RESET_ALL: u8 = 0x05;
/// Set the backlight timeout.
pub const OP_SET_BACKLIGHT_TIME: u8 = 0x21;
/// Set the price per kWh (in cents).
pub const OP_SET_PRICE: u8 = 0x22;
/// Enter the setup menu.
pub const OP_SETUP: u8 = 0x31;
/// Confirm the current menu entry.
pub const OP_ENTER: u8 = 0x32;
/// Menu "+" button.
pub const OP_SET_PLUS: u8 = 0x33;
/// Menu "-" button.
pub const OP_SET_MINUS: u8 = 0x34;
/// Menu "+" button on USB meters.
pub const OP_USB_SET_PLUS: u8 = 0x11;
/// Menu "-" button on USB meters.
pub const OP_USB_SET_MINUS: u8 = 0x12;

// ============================================================================
// Command Argument Bounds
// ============================================================================

/// Backlight timeout that keeps the display off.
pub const BACKLIGHT_ALWAYS_OFF: u8 = 0;
/// Backlight timeout that keeps the display on.
pub const BACKLIGHT_ALWAYS_ON: u8 = 60;
/// Smallest accepted price (cents).
pub const PRICE_MIN: i64 = 1;
/// Largest accepted price (cents).
pub const PRICE_MAX: i64 = 999_999;

// ============================================================================
// Report Layout
// ============================================================================

/// Offset of the message type tag.
pub const OFFSET_MESSAGE_TYPE: usize = 2;
/// Offset of the device type discriminant.
pub const OFFSET_DEVICE_TYPE: usize = 3;

/// Default CO2 emission factor in grams per milli-watt-hour (0.997 kg/kWh).
pub const DEFAULT_CO2_FACTOR: f64 = 0.000997;
