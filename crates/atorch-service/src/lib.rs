//! Atorch Meter Service
//!
//! This crate sits between a byte transport and the [`atorch_packet`] codec.
//! It turns raw BLE notifications into decoded readings, fans them out to
//! registered listeners, and writes command frames back to the meter.
//!
//! The BLE link itself is owned by a bridge process that exposes the meter's
//! UART characteristic as a TCP stream. Each notification travels over that
//! stream with a length prefix ([`BridgeCodec`]), since TCP alone does not
//! keep notification boundaries. [`run_connection`] drives the stream,
//! reconnecting when it drops.
//!
//! # Example
//!
//! ```rust,ignore
//! use atorch_service::{AtorchService, ServiceConfig, ServiceEvent};
//!
//! let service = Arc::new(AtorchService::new(&config));
//! let subscription = service.subscribe(|event| {
//!     if let ServiceEvent::Packet(reading) = event {
//!         println!("{:?}", reading);
//!     }
//! });
//!
//! run_connection(config, service.clone(), command_rx).await?;
//! subscription.unsubscribe();
//! ```

mod bridge;
mod config;
mod connection;
mod error;
mod events;
mod service;

pub use bridge::*;
pub use config::*;
pub use connection::*;
pub use error::*;
pub use events::*;
pub use service::*;
