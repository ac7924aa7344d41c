//! Telemetry reports decoded into typed readings.
//!
//! All three meter families push a 36-byte report with the same header and
//! framing, but field offsets, widths and scale factors diverge per family.
//! Each family therefore gets its own record and decode routine.
//!
//! Units follow the meter's own fixed-point scales: milli-volts,
//! milli-amps, milli-watts and milli-watt-hours. CO2 is in grams.

use serde::{Deserialize, Serialize};

use crate::checksum::validate;
use crate::codec::*;
use crate::constants::*;
use crate::error::PacketError;
use crate::types::*;

/// A decoded telemetry report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device", rename_all = "lowercase")]
pub enum Reading {
    /// Report from an AC meter.
    Ac(AcReading),
    /// Report from a DC meter.
    Dc(DcReading),
    /// Report from a USB meter.
    Usb(UsbReading),
}

impl Reading {
    /// Decode a report frame.
    ///
    /// `co2_factor` converts milli-watt-hours to grams of CO2.
    pub fn decode(frame: &[u8], co2_factor: f64) -> Result<Self, PacketError> {
        // Header, type tag, device byte and checksum at the very least
        if frame.len() < OFFSET_DEVICE_TYPE + 1 + CHECKSUM_SIZE {
            return Err(PacketError::MalformedFrame {
                expected: REPORT_FRAME_SIZE,
                actual: frame.len(),
            });
        }
        if !frame.starts_with(&HEADER) {
            return Err(PacketError::MissingHeader);
        }
        validate(frame, MessageType::Report)?;

        match DeviceType::try_from(frame[OFFSET_DEVICE_TYPE])? {
            DeviceType::Ac => Ok(Reading::Ac(AcReading::parse(frame, co2_factor)?)),
            DeviceType::Dc => Ok(Reading::Dc(DcReading::parse(frame, co2_factor)?)),
            DeviceType::Usb => Ok(Reading::Usb(UsbReading::parse(frame, co2_factor)?)),
        }
    }

    /// Decode a report frame using [`DEFAULT_CO2_FACTOR`].
    pub fn decode_default(frame: &[u8]) -> Result<Self, PacketError> {
        Self::decode(frame, DEFAULT_CO2_FACTOR)
    }

    /// The meter family that produced this reading.
    pub fn device_type(&self) -> DeviceType {
        match self {
            Reading::Ac(_) => DeviceType::Ac,
            Reading::Dc(_) => DeviceType::Dc,
            Reading::Usb(_) => DeviceType::Usb,
        }
    }

    /// Bus voltage in milli-volts.
    pub fn millivolts(&self) -> u32 {
        match self {
            Reading::Ac(r) => r.millivolts,
            Reading::Dc(r) => r.millivolts,
            Reading::Usb(r) => r.millivolts,
        }
    }

    /// Current in milli-amps.
    pub fn milliamps(&self) -> u32 {
        match self {
            Reading::Ac(r) => r.milliamps,
            Reading::Dc(r) => r.milliamps,
            Reading::Usb(r) => r.milliamps,
        }
    }

    /// Power in milli-watts.
    pub fn milliwatts(&self) -> u64 {
        match self {
            Reading::Ac(r) => u64::from(r.milliwatts),
            Reading::Dc(r) => r.milliwatts,
            Reading::Usb(r) => r.milliwatts,
        }
    }

    /// Accumulated energy in milli-watt-hours.
    pub fn milliwatt_hours(&self) -> u64 {
        match self {
            Reading::Ac(r) => r.milliwatt_hours,
            Reading::Dc(r) => r.milliwatt_hours,
            Reading::Usb(r) => r.milliwatt_hours,
        }
    }

    /// Meter temperature in degrees Celsius.
    pub fn temperature(&self) -> u16 {
        match self {
            Reading::Ac(r) => r.temperature,
            Reading::Dc(r) => r.temperature,
            Reading::Usb(r) => r.temperature,
        }
    }
}

/// Check the exact report length and the device discriminant.
fn check_report(frame: &[u8], device: DeviceType) -> Result<(), PacketError> {
    if frame.len() != REPORT_FRAME_SIZE {
        return Err(PacketError::MalformedFrame {
            expected: REPORT_FRAME_SIZE,
            actual: frame.len(),
        });
    }
    let actual = frame[OFFSET_DEVICE_TYPE];
    if actual != device.code() {
        return Err(PacketError::UnknownDeviceType(actual));
    }
    Ok(())
}

fn co2_grams(milliwatt_hours: u64, co2_factor: f64) -> u64 {
    (milliwatt_hours as f64 * co2_factor).round() as u64
}

/// Derived power, rounded to the nearest milli-watt.
fn derived_milliwatts(millivolts: u32, milliamps: u32) -> u64 {
    (u64::from(millivolts) * u64::from(milliamps) + 500) / 1000
}

// ============================================================================
// AC
// ============================================================================

/// Reading from an AC meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcReading {
    /// Voltage (mV).
    pub millivolts: u32,
    /// Current (mA).
    pub milliamps: u32,
    /// Active power (mW).
    pub milliwatts: u32,
    /// Accumulated energy (mWh).
    pub milliwatt_hours: u64,
    /// Price per kWh.
    pub price: f64,
    /// Accumulated cost.
    pub fee: f64,
    /// Estimated CO2 (g).
    pub co2: u64,
    /// Line frequency (Hz).
    pub frequency: f64,
    /// Power factor.
    pub power_factor: f64,
    /// Temperature (°C).
    pub temperature: u16,
    /// Running time as `HHH:MM:SS`.
    pub duration: String,
    /// Backlight timeout.
    pub backlight: Backlight,
}

impl AcReading {
    /// Decode an AC report.
    pub fn decode(frame: &[u8], co2_factor: f64) -> Result<Self, PacketError> {
        validate(frame, MessageType::Report)?;
        Self::parse(frame, co2_factor)
    }

    /// Field extraction for a frame whose checksum and type tag are already
    /// known to be good.
    fn parse(frame: &[u8], co2_factor: f64) -> Result<Self, PacketError> {
        check_report(frame, DeviceType::Ac)?;

        let milliwatt_hours = u64::from(read_u32_be(frame, 0x0d)) * 10_000;
        let price = f64::from(read_u24_be(frame, 0x11)) / 100.0;
        Ok(AcReading {
            millivolts: read_u24_be(frame, 0x04) * 100,
            milliamps: read_u24_be(frame, 0x07),
            milliwatts: read_u24_be(frame, 0x0a) * 100,
            milliwatt_hours,
            price,
            fee: milliwatt_hours as f64 * price / 1000.0,
            co2: co2_grams(milliwatt_hours, co2_factor),
            frequency: f64::from(read_u16_be(frame, 0x14)) / 10.0,
            power_factor: f64::from(read_u16_be(frame, 0x16)) / 1000.0,
            temperature: read_u16_be(frame, 0x18),
            duration: read_duration(frame, 0x1a),
            backlight: Backlight::from(frame[0x1e]),
        })
    }
}

// ============================================================================
// DC
// ============================================================================

/// Reading from a DC meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcReading {
    /// Voltage (mV).
    pub millivolts: u32,
    /// Current (mA).
    pub milliamps: u32,
    /// Power derived from voltage and current (mW).
    pub milliwatts: u64,
    /// Accumulated energy (mWh).
    pub milliwatt_hours: u64,
    /// Price per kWh.
    pub price: f64,
    /// Accumulated cost.
    pub fee: f64,
    /// Estimated CO2 (g).
    pub co2: u64,
    /// Temperature (°C).
    pub temperature: u16,
    /// Running time as `HHH:MM:SS`.
    pub duration: String,
    /// Backlight timeout.
    pub backlight: Backlight,
}

impl DcReading {
    /// Decode a DC report.
    pub fn decode(frame: &[u8], co2_factor: f64) -> Result<Self, PacketError> {
        validate(frame, MessageType::Report)?;
        Self::parse(frame, co2_factor)
    }

    fn parse(frame: &[u8], co2_factor: f64) -> Result<Self, PacketError> {
        check_report(frame, DeviceType::Dc)?;

        let millivolts = read_u24_be(frame, 0x04) * 100;
        let milliamps = read_u24_be(frame, 0x07);
        let milliwatt_hours = u64::from(read_u32_be(frame, 0x0a)) * 10;
        let price = f64::from(read_u24_be(frame, 0x11)) / 100.0;
        Ok(DcReading {
            millivolts,
            milliamps,
            milliwatts: derived_milliwatts(millivolts, milliamps),
            milliwatt_hours,
            price,
            // DC energy has 1000x finer raw precision than AC
            fee: milliwatt_hours as f64 * price / 1_000_000.0,
            co2: co2_grams(milliwatt_hours, co2_factor),
            temperature: read_u16_be(frame, 0x18),
            duration: read_duration(frame, 0x1a),
            backlight: Backlight::from(frame[0x1e]),
        })
    }
}

// ============================================================================
// USB
// ============================================================================

/// Reading from a USB meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsbReading {
    /// VBUS voltage (mV).
    pub millivolts: u32,
    /// VBUS current (mA).
    pub milliamps: u32,
    /// Power derived from voltage and current (mW).
    pub milliwatts: u64,
    /// Accumulated charge (mAh).
    pub milliamp_hours: u32,
    /// Accumulated energy (mWh).
    pub milliwatt_hours: u64,
    /// Estimated CO2 (g).
    pub co2: u64,
    /// D- line voltage (V).
    pub data_minus: f64,
    /// D+ line voltage (V).
    pub data_plus: f64,
    /// Temperature (°C).
    pub temperature: u16,
    /// Running time as `HHH:MM:SS`.
    pub duration: String,
    /// Backlight timeout.
    pub backlight: Backlight,
}

impl UsbReading {
    /// Decode a USB report.
    pub fn decode(frame: &[u8], co2_factor: f64) -> Result<Self, PacketError> {
        validate(frame, MessageType::Report)?;
        Self::parse(frame, co2_factor)
    }

    fn parse(frame: &[u8], co2_factor: f64) -> Result<Self, PacketError> {
        check_report(frame, DeviceType::Usb)?;

        let millivolts = read_u24_be(frame, 0x04) * 10;
        let milliamps = read_u24_be(frame, 0x07) * 10;
        let milliwatt_hours = u64::from(read_u32_be(frame, 0x0d)) * 10;
        Ok(UsbReading {
            millivolts,
            milliamps,
            milliwatts: derived_milliwatts(millivolts, milliamps),
            milliamp_hours: read_u24_be(frame, 0x0a),
            milliwatt_hours,
            co2: co2_grams(milliwatt_hours, co2_factor),
            data_minus: f64::from(read_u16_be(frame, 0x11)) / 100.0,
            data_plus: f64::from(read_u16_be(frame, 0x13)) / 100.0,
            temperature: read_u16_be(frame, 0x15),
            duration: read_duration(frame, 0x17),
            backlight: Backlight::from(frame[0x1b]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::frame_checksum;
    use approx::assert_relative_eq;

    /// Build a report frame with the given fields written at their offsets.
    fn report(device: u8, fields: &[(usize, &[u8])]) -> Vec<u8> {
        let mut frame = vec![0u8; REPORT_FRAME_SIZE];
        frame[..2].copy_from_slice(&HEADER);
        frame[2] = MSG_TYPE_REPORT;
        frame[3] = device;
        for (offset, bytes) in fields {
            frame[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }
        let last = REPORT_FRAME_SIZE - 1;
        frame[last] = frame_checksum(&frame[..last]);
        frame
    }

    fn ac_frame() -> Vec<u8> {
        report(
            DEVICE_TYPE_AC,
            &[
                (0x04, &[0x00, 0x08, 0xFC]),       // 230.0 V
                (0x07, &[0x00, 0x03, 0xE8]),       // 1.000 A
                (0x0a, &[0x00, 0x08, 0xFC]),       // 230.0 W
                (0x0d, &[0x00, 0x00, 0x00, 0x0C]), // 0.12 kWh
                (0x11, &[0x00, 0x00, 0x32]),       // 0.50
                (0x14, &[0x01, 0xF4]),             // 50.0 Hz
                (0x16, &[0x03, 0xB6]),             // 0.950
                (0x18, &[0x00, 0x19]),             // 25 °C
                (0x1a, &[0x00, 0x01, 0x02, 0x03]),
                (0x1e, &[30]),
            ],
        )
    }

    #[test]
    fn test_decode_ac() {
        let reading = Reading::decode_default(&ac_frame()).expect("valid AC report");
        let Reading::Ac(ac) = reading else {
            panic!("Expected AC reading");
        };
        assert_eq!(ac.millivolts, 230_000);
        assert_eq!(ac.milliamps, 1_000);
        assert_eq!(ac.milliwatts, 230_000);
        assert_eq!(ac.milliwatt_hours, 120_000);
        assert_relative_eq!(ac.price, 0.5);
        assert_relative_eq!(ac.fee, 60.0);
        assert_eq!(ac.co2, 120); // 119.64 rounds up
        assert_relative_eq!(ac.frequency, 50.0);
        assert_relative_eq!(ac.power_factor, 0.95);
        assert_eq!(ac.temperature, 25);
        assert_eq!(ac.duration, "001:02:03");
        assert_eq!(ac.backlight, Backlight::Seconds(30));
    }

    #[test]
    fn test_decode_dc() {
        let frame = report(
            DEVICE_TYPE_DC,
            &[
                (0x04, &[0x00, 0x00, 0x78]),       // 12.0 V
                (0x07, &[0x00, 0x07, 0xD0]),       // 2.000 A
                (0x0a, &[0x00, 0x00, 0x03, 0xE8]), // 10 Wh
                (0x11, &[0x00, 0x00, 0x64]),       // 1.00
                (0x18, &[0x00, 0x1E]),
                (0x1a, &[0x00, 0x0A, 0x3B, 0x00]),
                (0x1e, &[60]),
            ],
        );
        let Reading::Dc(dc) = Reading::decode(&frame, 0.001).expect("valid DC report") else {
            panic!("Expected DC reading");
        };
        assert_eq!(dc.millivolts, 12_000);
        assert_eq!(dc.milliamps, 2_000);
        assert_eq!(dc.milliwatts, 24_000);
        assert_eq!(dc.milliwatt_hours, 10_000);
        assert_relative_eq!(dc.fee, 0.01);
        assert_eq!(dc.co2, 10);
        assert_eq!(dc.temperature, 30);
        assert_eq!(dc.duration, "010:59:00");
        assert_eq!(dc.backlight, Backlight::AlwaysOn);
    }

    #[test]
    fn test_decode_dc_power_rounds() {
        let frame = report(
            DEVICE_TYPE_DC,
            &[(0x04, &[0x00, 0x00, 0x01]), (0x07, &[0x00, 0x00, 0x05])],
        );
        // 100 mV * 5 mA = 0.5 mW
        let Reading::Dc(dc) = Reading::decode_default(&frame).expect("valid DC report") else {
            panic!("Expected DC reading");
        };
        assert_eq!(dc.milliwatts, 1);
    }

    #[test]
    fn test_decode_usb() {
        let frame = report(
            DEVICE_TYPE_USB,
            &[
                (0x04, &[0x00, 0x01, 0xF4]),       // 5.00 V
                (0x07, &[0x00, 0x00, 0x64]),       // 1.00 A
                (0x0a, &[0x00, 0x01, 0x2C]),       // 300 mAh
                (0x0d, &[0x00, 0x00, 0x00, 0x96]), // 1.5 Wh
                (0x11, &[0x00, 0x3C]),             // 0.60 V
                (0x13, &[0x00, 0x3D]),             // 0.61 V
                (0x15, &[0x00, 0x1C]),
                (0x17, &[0x00, 0x00, 0x05, 0x06]),
                (0x1b, &[0]),
            ],
        );
        let Reading::Usb(usb) = Reading::decode_default(&frame).expect("valid USB report") else {
            panic!("Expected USB reading");
        };
        assert_eq!(usb.millivolts, 5_000);
        assert_eq!(usb.milliamps, 1_000);
        assert_eq!(usb.milliwatts, 5_000);
        assert_eq!(usb.milliamp_hours, 300);
        assert_eq!(usb.milliwatt_hours, 1_500);
        assert_eq!(usb.co2, 1);
        assert_relative_eq!(usb.data_minus, 0.6);
        assert_relative_eq!(usb.data_plus, 0.61);
        assert_eq!(usb.temperature, 28);
        assert_eq!(usb.duration, "000:05:06");
        assert_eq!(usb.backlight, Backlight::AlwaysOff);
    }

    #[test]
    fn test_unknown_device_type() {
        let frame = report(0x09, &[]);
        assert_eq!(
            Reading::decode_default(&frame),
            Err(PacketError::UnknownDeviceType(0x09))
        );
    }

    #[test]
    fn test_wrong_length() {
        let mut frame = ac_frame();
        frame.truncate(20);
        let last = frame.len() - 1;
        frame[last] = frame_checksum(&frame[..last]);
        assert_eq!(
            Reading::decode_default(&frame),
            Err(PacketError::MalformedFrame {
                expected: REPORT_FRAME_SIZE,
                actual: 20
            })
        );
        assert!(matches!(
            Reading::decode_default(&[0xFF, 0x55, 0x01]),
            Err(PacketError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_frame_too_short_for_device_byte() {
        // Valid checksum, but the only byte after the tag is the checksum itself
        let frame = [0xFF, 0x55, 0x01, 0x45];
        assert_eq!(frame_checksum(&frame[..3]), 0x45);
        assert_eq!(
            Reading::decode_default(&frame),
            Err(PacketError::MalformedFrame {
                expected: REPORT_FRAME_SIZE,
                actual: 4
            })
        );

        let frame = [0xFF, 0x55, 0x01, 0x01, 0x46];
        assert_eq!(
            Reading::decode_default(&frame),
            Err(PacketError::MalformedFrame {
                expected: REPORT_FRAME_SIZE,
                actual: 5
            })
        );
    }

    #[test]
    fn test_corrupted_report() {
        let mut frame = ac_frame();
        frame[0x05] ^= 0x01;
        assert!(matches!(
            Reading::decode_default(&frame),
            Err(PacketError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_command_frame_is_not_a_report() {
        let frame = [0xFF, 0x55, 0x11, 0x01, 0x01, 0, 0, 0, 0, 0x57];
        assert_eq!(
            Reading::decode_default(&frame),
            Err(PacketError::UnexpectedMessageType {
                expected: MSG_TYPE_REPORT,
                actual: MSG_TYPE_COMMAND
            })
        );
    }

    #[test]
    fn test_family_decoder_rejects_other_family() {
        assert_eq!(
            DcReading::decode(&ac_frame(), DEFAULT_CO2_FACTOR),
            Err(PacketError::UnknownDeviceType(DEVICE_TYPE_AC))
        );
    }

    #[test]
    fn test_reading_accessors() {
        let reading = Reading::decode_default(&ac_frame()).expect("valid AC report");
        assert_eq!(reading.device_type(), DeviceType::Ac);
        assert_eq!(reading.millivolts(), 230_000);
        assert_eq!(reading.milliamps(), 1_000);
        assert_eq!(reading.milliwatts(), 230_000);
        assert_eq!(reading.milliwatt_hours(), 120_000);
    }
}
