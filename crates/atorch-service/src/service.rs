//! Notification handling and command writes for one meter.

use atorch_packet::{validate, Frame, FrameAssembler, MessageType, Reading};
use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::bridge::BridgeCodec;
use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::events::{EventHub, ServiceEvent, Subscription};

/// One meter session: reassembly state plus listeners.
///
/// Notifications must be fed in transport order. The reassembly buffer sits
/// behind a mutex, so a shared service serializes concurrent feeders, but
/// interleaving chunks from two streams still corrupts frames; use one
/// service per connection.
#[derive(Debug)]
pub struct AtorchService {
    assembler: Mutex<FrameAssembler>,
    events: EventHub,
    co2_factor: f64,
}

impl AtorchService {
    /// Create a service using the configured CO2 factor.
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_co2_factor(config.co2_factor)
    }

    /// Create a service with an explicit CO2 factor.
    pub fn with_co2_factor(co2_factor: f64) -> Self {
        AtorchService {
            assembler: Mutex::new(FrameAssembler::new()),
            events: EventHub::new(),
            co2_factor,
        }
    }

    /// Register a listener for all service events.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ServiceEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Handle one raw notification from the transport.
    pub fn handle_notification(&self, chunk: &[u8]) {
        trace!(len = chunk.len(), "notification");
        let completed = self.assembler.lock().feed(chunk);
        if let Some(frame) = completed {
            self.emit_frame(frame);
        }
    }

    /// Flush the frame in flight at the end of a session.
    pub fn finish(&self) {
        let completed = self.assembler.lock().flush();
        if let Some(frame) = completed {
            self.emit_frame(frame);
        }
    }

    /// Record a connection state change.
    ///
    /// A fresh connection starts with an empty reassembly buffer so that
    /// fragments from the previous link never join a new frame.
    pub fn set_connected(&self, connected: bool) {
        if connected {
            self.assembler.lock().clear();
        }
        self.events.emit(&ServiceEvent::Connected(connected));
    }

    /// Validate a command frame and write it to the bridge as one
    /// length-prefixed record.
    ///
    /// The write does not touch reassembly state, so dropping the returned
    /// future mid-write leaves decoding unaffected.
    pub async fn send_command<W>(&self, writer: &mut W, frame: &Frame) -> ServiceResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        validate(frame.as_bytes(), MessageType::Command)?;
        debug!(frame = %frame, "sending command");
        writer.write_all(&BridgeCodec::encode(frame.as_bytes())).await?;
        writer.flush().await?;
        Ok(())
    }

    /// The CO2 factor applied to decoded readings.
    pub fn co2_factor(&self) -> f64 {
        self.co2_factor
    }

    fn emit_frame(&self, frame: Frame) {
        debug!(frame = %frame, "block");
        match Reading::decode(frame.as_bytes(), self.co2_factor) {
            Ok(reading) => self.events.emit(&ServiceEvent::Packet(reading)),
            Err(error) => {
                warn!(frame = %frame, %error, "discarding undecodable frame");
                self.events.emit(&ServiceEvent::Wrong { frame, error });
            }
        }
    }
}
