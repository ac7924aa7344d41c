//! TCP connection to a BLE-UART bridge.
//!
//! The bridge forwards each BLE notification from the meter as one
//! length-prefixed record on the TCP stream, and forwards each
//! length-prefixed record written to the stream to the meter's
//! characteristic as one BLE write. TCP reads may merge or split records
//! freely; [`BridgeCodec`] restores the notification boundaries that the
//! frame reassembler depends on.

use std::sync::Arc;

use atorch_packet::Frame;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::bridge::BridgeCodec;
use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::service::AtorchService;

/// Why a single connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The bridge closed the stream or the read failed.
    Dropped,
    /// The command channel closed; the owner wants to disconnect.
    Shutdown,
}

/// Drive a meter connection until the command channel closes.
///
/// Notifications read from the bridge are fed to `service`; frames received
/// on `commands` are written to the meter. When the bridge drops the
/// connection the loop waits `retry_interval` and reconnects, unless
/// reconnecting is disabled, in which case it returns.
pub async fn run_connection(
    config: ServiceConfig,
    service: Arc<AtorchService>,
    mut commands: mpsc::Receiver<Frame>,
) -> ServiceResult<()> {
    config.validate()?;

    loop {
        let stream = match TcpStream::connect(&config.address).await {
            Ok(stream) => stream,
            Err(e) if config.reconnect => {
                warn!(address = %config.address, error = %e, "connect failed, retrying");
                tokio::time::sleep(config.retry_interval()).await;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        info!(address = %config.address, "connected");
        service.set_connected(true);
        let end = run_session(stream, &config, &service, &mut commands).await;
        service.finish();
        service.set_connected(false);

        match end {
            SessionEnd::Shutdown => {
                info!("disconnected");
                return Ok(());
            }
            SessionEnd::Dropped if config.reconnect => {
                info!("retry reconnecting");
                tokio::time::sleep(config.retry_interval()).await;
            }
            SessionEnd::Dropped => return Ok(()),
        }
    }
}

async fn run_session(
    mut stream: TcpStream,
    config: &ServiceConfig,
    service: &AtorchService,
    commands: &mut mpsc::Receiver<Frame>,
) -> SessionEnd {
    let (mut reader, mut writer) = stream.split();
    let mut read_buf = vec![0u8; config.read_buffer_size];
    let mut codec = BridgeCodec::new();

    loop {
        tokio::select! {
            result = reader.read(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        info!("bridge closed the connection");
                        return SessionEnd::Dropped;
                    }
                    Ok(n) => {
                        codec.push(&read_buf[..n]);
                        while let Some(notification) = codec.decode() {
                            service.handle_notification(&notification);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "read failed");
                        return SessionEnd::Dropped;
                    }
                }
            }

            command = commands.recv() => {
                let Some(frame) = command else {
                    return SessionEnd::Shutdown;
                };
                if let Err(e) = service.send_command(&mut writer, &frame).await {
                    // A failed write leaves the read side usable
                    warn!(frame = %frame, error = %e, "command not sent");
                }
            }
        }
    }
}
