//! Atorch Meter Protocol
//!
//! This crate provides the codec for Atorch handheld power meters (AC, DC and
//! USB variants) as they talk over a BLE UART characteristic. The transport
//! delivers notifications in arbitrary chunks; this crate turns those chunks
//! back into frames, decodes telemetry reports into typed readings, and
//! builds control command frames.
//!
//! # Protocol Overview
//!
//! Every frame starts with the fixed header `FF 55`, followed by a message
//! type tag, a type-specific body and a trailing checksum byte:
//!
//! - **Reports** (meter → host): tag `0x01`, 36 bytes, periodic telemetry
//! - **Commands** (host → meter): tag `0x11`, 10 bytes, control operations
//!
//! # Example
//!
//! ```rust,ignore
//! use atorch_packet::{FrameAssembler, Operation, Reading};
//!
//! // Reassemble and decode notifications
//! let mut assembler = FrameAssembler::new();
//! if let Some(frame) = assembler.feed(&chunk) {
//!     let reading = Reading::decode_default(&frame)?;
//! }
//!
//! // Build a command
//! let frame = Operation::SetPrice(150).encode(0x01)?;
//! ```

mod checksum;
mod codec;
mod commands;
mod constants;
mod error;
mod frame;
mod readings;
mod types;

pub use checksum::*;
pub use codec::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use readings::*;
pub use types::*;
