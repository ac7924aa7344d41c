//! JSON lines printed for decoded readings.

use atorch_packet::{celsius_to_fahrenheit, Frame, Reading};
use chrono::{DateTime, Local};
use serde::Serialize;

/// One output line: a reading with optional receive time and raw frame.
#[derive(Debug, Serialize)]
pub struct ReadingLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Local>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<String>,
    reading: &'a Reading,
    /// Meter temperature converted from the reported Celsius value.
    temperature_f: f64,
}

impl<'a> ReadingLine<'a> {
    pub fn new(reading: &'a Reading) -> Self {
        ReadingLine {
            timestamp: None,
            frame: None,
            reading,
            temperature_f: celsius_to_fahrenheit(reading.temperature()),
        }
    }

    /// Attach the current local time.
    pub fn stamped(mut self) -> Self {
        self.timestamp = Some(Local::now());
        self
    }

    /// Attach the frame the reading was decoded from.
    pub fn with_frame(mut self, frame: &Frame) -> Self {
        self.frame = Some(frame.to_hex());
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atorch_packet::{frame_checksum, HEADER, REPORT_FRAME_SIZE};

    #[test]
    fn test_reading_line_json() {
        let mut bytes = vec![0u8; REPORT_FRAME_SIZE];
        bytes[..2].copy_from_slice(&HEADER);
        bytes[2] = 0x01;
        bytes[3] = 0x02;
        bytes[0x18..0x1a].copy_from_slice(&25u16.to_be_bytes());
        bytes[0x1e] = 60;
        let last = bytes.len() - 1;
        bytes[last] = frame_checksum(&bytes[..last]);
        let frame = Frame::new(bytes);
        let reading = Reading::decode_default(frame.as_bytes()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&ReadingLine::new(&reading).with_frame(&frame).to_json().unwrap())
                .unwrap();
        assert!(json.get("timestamp").is_none());
        assert_eq!(json["frame"], frame.to_hex());
        assert_eq!(json["reading"]["device"], "dc");
        assert_eq!(json["reading"]["backlight"], 60);
        assert_eq!(json["reading"]["temperature"], 25);
        assert_eq!(json["temperature_f"], 77.0);

        let stamped = ReadingLine::new(&reading).stamped().to_json().unwrap();
        assert!(stamped.contains("\"timestamp\""));
    }
}
