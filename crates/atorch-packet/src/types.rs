//! Common types used in the protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::PacketError;

/// Message type tag carried at offset 2 of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Telemetry pushed by the meter.
    Report,
    /// Control command sent by the host.
    Command,
}

impl MessageType {
    /// Get the wire tag for this message type.
    pub fn code(self) -> u8 {
        match self {
            MessageType::Report => MSG_TYPE_REPORT,
            MessageType::Command => MSG_TYPE_COMMAND,
        }
    }

    /// Look up a message type by its wire tag.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            MSG_TYPE_REPORT => Some(MessageType::Report),
            MSG_TYPE_COMMAND => Some(MessageType::Command),
            _ => None,
        }
    }
}

/// The meter family, selected by the byte at offset 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// AC meter.
    Ac,
    /// DC meter.
    Dc,
    /// USB meter.
    Usb,
}

impl DeviceType {
    /// Get the wire discriminant.
    pub fn code(self) -> u8 {
        match self {
            DeviceType::Ac => DEVICE_TYPE_AC,
            DeviceType::Dc => DEVICE_TYPE_DC,
            DeviceType::Usb => DEVICE_TYPE_USB,
        }
    }

    /// Human-readable family name.
    pub fn name(self) -> &'static str {
        match self {
            DeviceType::Ac => "AC Meter",
            DeviceType::Dc => "DC Meter",
            DeviceType::Usb => "USB Meter",
        }
    }
}

impl TryFrom<u8> for DeviceType {
    type Error = PacketError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            DEVICE_TYPE_AC => Ok(DeviceType::Ac),
            DEVICE_TYPE_DC => Ok(DeviceType::Dc),
            DEVICE_TYPE_USB => Ok(DeviceType::Usb),
            other => Err(PacketError::UnknownDeviceType(other)),
        }
    }
}

impl From<DeviceType> for u8 {
    fn from(device: DeviceType) -> Self {
        device.code()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display backlight timeout.
///
/// The raw byte is seconds, except for the two sentinels 0 (display stays
/// off) and 60 (display stays on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum Backlight {
    /// Display never lights up.
    AlwaysOff,
    /// Display never turns off.
    AlwaysOn,
    /// Display turns off after the given number of seconds.
    Seconds(u8),
}

impl Backlight {
    /// The raw byte as sent by the meter.
    pub fn raw(self) -> u8 {
        match self {
            Backlight::AlwaysOff => BACKLIGHT_ALWAYS_OFF,
            Backlight::AlwaysOn => BACKLIGHT_ALWAYS_ON,
            Backlight::Seconds(secs) => secs,
        }
    }
}

impl From<u8> for Backlight {
    fn from(raw: u8) -> Self {
        match raw {
            BACKLIGHT_ALWAYS_OFF => Backlight::AlwaysOff,
            BACKLIGHT_ALWAYS_ON => Backlight::AlwaysOn,
            secs => Backlight::Seconds(secs),
        }
    }
}

impl From<Backlight> for u8 {
    fn from(backlight: Backlight) -> Self {
        backlight.raw()
    }
}

impl fmt::Display for Backlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backlight::AlwaysOff => write!(f, "Always Off"),
            Backlight::AlwaysOn => write!(f, "Always On"),
            Backlight::Seconds(secs) => write!(f, "{} sec", secs),
        }
    }
}

/// Convert a Celsius reading to Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: u16) -> f64 {
    f64::from(celsius) * 9.0 / 5.0 + 32.0
}
