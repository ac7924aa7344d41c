//! Commands that can be sent to a meter.
//!
//! Every command is a fixed 10-byte frame:
//!
//! ```text
//! +----+----+----+--------+--------+-------------------+----------+
//! | FF | 55 | 11 | device | opcode | value (u32, BE)   | checksum |
//! +----+----+----+--------+--------+-------------------+----------+
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};

use crate::checksum::checksum;
use crate::constants::*;
use crate::error::PacketError;
use crate::frame::Frame;

/// Named control operations understood by the meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Reset the energy counter.
    ResetWh,
    /// Reset the charge counter.
    ResetAh,
    /// Reset the running duration.
    ResetDuration,
    /// Reset all counters.
    ResetAll,
    /// Set the backlight timeout in seconds (clamped to 0..=60).
    SetBacklightTime(i64),
    /// Set the price per kWh in cents (clamped to 1..=999999).
    SetPrice(i64),
    /// Enter the setup menu.
    Setup,
    /// Confirm the current menu entry.
    Enter,
    /// Menu "+" button.
    SetPlus,
    /// Menu "-" button.
    SetMinus,
}

impl Operation {
    /// Opcode for this operation on the given device type.
    ///
    /// USB meters use their own opcodes for the "+" and "-" buttons.
    pub fn opcode(&self, device_type: u8) -> u8 {
        match self {
            Operation::ResetWh => OP_RESET_WH,
            Operation::ResetAh => OP_RESET_AH,
            Operation::ResetDuration => OP_RESET_DURATION,
            Operation::ResetAll => OP_RESET_ALL,
            Operation::SetBacklightTime(_) => OP_SET_BACKLIGHT_TIME,
            Operation::SetPrice(_) => OP_SET_PRICE,
            Operation::Setup => OP_SETUP,
            Operation::Enter => OP_ENTER,
            Operation::SetPlus if device_type == DEVICE_TYPE_USB => OP_USB_SET_PLUS,
            Operation::SetPlus => OP_SET_PLUS,
            Operation::SetMinus if device_type == DEVICE_TYPE_USB => OP_USB_SET_MINUS,
            Operation::SetMinus => OP_SET_MINUS,
        }
    }

    /// The 32-bit argument carried by the command, after clamping.
    pub fn value(&self) -> u32 {
        match self {
            Operation::SetBacklightTime(secs) => {
                (*secs).clamp(i64::from(BACKLIGHT_ALWAYS_OFF), i64::from(BACKLIGHT_ALWAYS_ON)) as u32
            }
            Operation::SetPrice(cents) => (*cents).clamp(PRICE_MIN, PRICE_MAX) as u32,
            _ => 0,
        }
    }

    /// Kebab-case name, as accepted by [`Operation::from_str`].
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ResetWh => "reset-wh",
            Operation::ResetAh => "reset-ah",
            Operation::ResetDuration => "reset-duration",
            Operation::ResetAll => "reset-all",
            Operation::SetBacklightTime(_) => "set-backlight-time",
            Operation::SetPrice(_) => "set-price",
            Operation::Setup => "setup",
            Operation::Enter => "enter",
            Operation::SetPlus => "set-plus",
            Operation::SetMinus => "set-minus",
        }
    }

    /// Build the command frame for the given device type.
    pub fn encode(&self, device_type: u8) -> Result<Frame, PacketError> {
        Ok(Command::new(*self, device_type)?.encode())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SetBacklightTime(v) | Operation::SetPrice(v) => {
                write!(f, "{} {}", self.name(), v)
            }
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for Operation {
    type Err = PacketError;

    /// Parse `"<name> [value]"`, e.g. `"reset-wh"` or `"set-price 150"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| PacketError::invalid_operation("empty operation"))?;
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(PacketError::invalid_operation(format!(
                "too many arguments: {}",
                s.trim()
            )));
        }

        let value = || -> Result<i64, PacketError> {
            let raw = arg.ok_or_else(|| {
                PacketError::invalid_operation(format!("{} requires a value", name))
            })?;
            raw.parse::<i64>()
                .map_err(|_| PacketError::invalid_operation(format!("invalid value: {}", raw)))
        };
        let no_value = |op: Operation| -> Result<Operation, PacketError> {
            match arg {
                Some(_) => Err(PacketError::invalid_operation(format!(
                    "{} takes no value",
                    name
                ))),
                None => Ok(op),
            }
        };

        match name {
            "reset-wh" => no_value(Operation::ResetWh),
            "reset-ah" => no_value(Operation::ResetAh),
            "reset-duration" => no_value(Operation::ResetDuration),
            "reset-all" => no_value(Operation::ResetAll),
            "set-backlight-time" => Ok(Operation::SetBacklightTime(value()?)),
            "set-price" => Ok(Operation::SetPrice(value()?)),
            "setup" => no_value(Operation::Setup),
            "enter" => no_value(Operation::Enter),
            "set-plus" => no_value(Operation::SetPlus),
            "set-minus" => no_value(Operation::SetMinus),
            other => Err(PacketError::invalid_operation(format!(
                "unknown operation: {}",
                other
            ))),
        }
    }
}

/// A resolved command: device type, opcode and clamped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    /// Target device type.
    pub device_type: u8,
    /// Operation code.
    pub opcode: u8,
    /// Argument value.
    pub value: u32,
}

impl Command {
    /// Resolve an operation for a device type.
    ///
    /// Fails if the device type is not one of AC, DC or USB.
    pub fn new(operation: Operation, device_type: u8) -> Result<Self, PacketError> {
        if !matches!(
            device_type,
            DEVICE_TYPE_AC | DEVICE_TYPE_DC | DEVICE_TYPE_USB
        ) {
            return Err(PacketError::invalid_operation(format!(
                "{} on unsupported device type 0x{:02X}",
                operation.name(),
                device_type
            )));
        }
        Ok(Command {
            device_type,
            opcode: operation.opcode(device_type),
            value: operation.value(),
        })
    }

    /// Encode the command payload (without header and checksum).
    pub fn payload(&self) -> [u8; COMMAND_PAYLOAD_SIZE] {
        let mut payload = [0u8; COMMAND_PAYLOAD_SIZE];
        payload[0] = MSG_TYPE_COMMAND;
        payload[1] = self.device_type;
        payload[2] = self.opcode;
        payload[3..].copy_from_slice(&self.value.to_be_bytes());
        payload
    }

    /// Encode the complete command frame.
    pub fn encode(&self) -> Frame {
        let payload = self.payload();
        let mut buf = BytesMut::with_capacity(COMMAND_FRAME_SIZE);
        buf.put_slice(&HEADER);
        buf.put_slice(&payload);
        buf.put_u8(checksum(&payload));
        Frame::new(buf.freeze())
    }
}
