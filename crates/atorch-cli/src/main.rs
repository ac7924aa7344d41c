//! `atorch` command-line console.
//!
//! Decodes captured notifications, encodes command frames, and monitors a
//! live meter through a BLE-UART bridge.

mod output;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use atorch_packet::{
    Frame, FrameAssembler, Operation, PacketError, Reading, DEFAULT_CO2_FACTOR, DEVICE_TYPE_AC,
    DEVICE_TYPE_DC, DEVICE_TYPE_USB,
};
use atorch_service::{run_connection, AtorchService, ServiceConfig, ServiceEvent};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::output::ReadingLine;

#[derive(Parser, Debug)]
#[command(name = "atorch", version, about = "Console for Atorch AC/DC/USB power meters")]
struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reassemble and decode hex-encoded notification chunks.
    Decode {
        /// Grams of CO2 per mWh.
        #[arg(long, default_value_t = DEFAULT_CO2_FACTOR)]
        co2_factor: f64,

        /// Notification payloads in hex, in arrival order.
        #[arg(required = true)]
        chunks: Vec<String>,
    },

    /// Print the command frame for an operation.
    Encode {
        /// Operation name (reset-wh, reset-ah, reset-duration, reset-all,
        /// set-backlight-time, set-price, setup, enter, set-plus, set-minus).
        operation: String,

        /// Argument for set-backlight-time (seconds) or set-price (cents).
        #[arg(allow_negative_numbers = true)]
        value: Option<i64>,

        /// Target device: ac, dc, usb or a numeric type byte.
        #[arg(long, short, default_value = "ac", value_parser = parse_device)]
        device: u8,
    },

    /// Stream readings from a meter behind a BLE-UART TCP bridge.
    ///
    /// Operations typed on stdin (e.g. `set-price 150`) are sent to the meter.
    Monitor {
        /// YAML configuration file.
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Bridge address, overriding the config file.
        #[arg(long)]
        address: Option<String>,

        /// Grams of CO2 per mWh, overriding the config file.
        #[arg(long)]
        co2_factor: Option<f64>,

        /// Exit instead of reconnecting when the bridge drops.
        #[arg(long)]
        no_reconnect: bool,

        /// Device type used for commands typed on stdin.
        #[arg(long, short, default_value = "ac", value_parser = parse_device)]
        device: u8,
    },
}

/// Parse a device name or numeric type byte (decimal or `0x` hex).
fn parse_device(s: &str) -> Result<u8, String> {
    match s.to_ascii_lowercase().as_str() {
        "ac" => Ok(DEVICE_TYPE_AC),
        "dc" => Ok(DEVICE_TYPE_DC),
        "usb" => Ok(DEVICE_TYPE_USB),
        other => {
            let parsed = match other.strip_prefix("0x") {
                Some(hex) => u8::from_str_radix(hex, 16),
                None => other.parse::<u8>(),
            };
            parsed.map_err(|_| format!("unknown device '{}': expected ac, dc, usb or a byte", s))
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Decode { co2_factor, chunks } => decode(&chunks, co2_factor),
        Commands::Encode {
            operation,
            value,
            device,
        } => encode(&operation, value, device),
        Commands::Monitor {
            config,
            address,
            co2_factor,
            no_reconnect,
            device,
        } => {
            let mut config = match config {
                Some(path) => ServiceConfig::load(path)?,
                None => ServiceConfig::default(),
            };
            if let Some(address) = address {
                config.address = address;
            }
            if let Some(co2_factor) = co2_factor {
                config.co2_factor = co2_factor;
            }
            if no_reconnect {
                config.reconnect = false;
            }
            config.validate()?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(monitor(config, device));
            // stdin reads block a worker thread and cannot be cancelled
            runtime.shutdown_background();
            result
        }
    }
}

/// Run notification chunks through a fresh assembler and decode each frame.
fn decode_chunks(
    chunks: &[Vec<u8>],
    co2_factor: f64,
) -> Vec<(Frame, Result<Reading, PacketError>)> {
    let mut assembler = FrameAssembler::new();
    let mut frames: Vec<Frame> = chunks.iter().filter_map(|c| assembler.feed(c)).collect();
    frames.extend(assembler.flush());
    frames
        .into_iter()
        .map(|frame| {
            let result = Reading::decode(frame.as_bytes(), co2_factor);
            (frame, result)
        })
        .collect()
}

fn decode(chunks: &[String], co2_factor: f64) -> Result<(), Box<dyn Error>> {
    let raw = chunks
        .iter()
        .map(|c| Frame::from_hex(c).map(|f| f.as_bytes().to_vec()))
        .collect::<Result<Vec<_>, _>>()?;

    for (frame, result) in decode_chunks(&raw, co2_factor) {
        match result {
            Ok(reading) => println!("{}", ReadingLine::new(&reading).with_frame(&frame).to_json()?),
            Err(e) => warn!(frame = %frame, error = %e, "frame not decoded"),
        }
    }
    Ok(())
}

fn encode(operation: &str, value: Option<i64>, device: u8) -> Result<(), Box<dyn Error>> {
    let text = match value {
        Some(v) => format!("{} {}", operation, v),
        None => operation.to_string(),
    };
    let frame = text.parse::<Operation>()?.encode(device)?;
    println!("{}", frame.to_hex());
    Ok(())
}

async fn monitor(config: ServiceConfig, device: u8) -> Result<(), Box<dyn Error>> {
    let service = Arc::new(AtorchService::new(&config));
    info!(
        address = %config.address,
        co2_factor = service.co2_factor(),
        reconnect = config.reconnect,
        "monitoring"
    );
    let _subscription = service.subscribe(|event| match event {
        ServiceEvent::Connected(connected) => info!(connected, "connection state"),
        ServiceEvent::Packet(reading) => {
            match ReadingLine::new(reading).stamped().to_json() {
                Ok(line) => println!("{}", line),
                Err(e) => warn!(error = %e, "reading not printable"),
            }
        }
        ServiceEvent::Wrong { frame, error } => warn!(frame = %frame, %error, "wrong"),
    });

    let (command_tx, command_rx) = mpsc::channel(16);
    let stdin_task = tokio::spawn(read_operations(command_tx.clone(), device));
    let mut connection = tokio::spawn(run_connection(config, service.clone(), command_rx));

    tokio::select! {
        result = &mut connection => {
            stdin_task.abort();
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, disconnecting");
            stdin_task.abort();
            drop(command_tx);
            connection.await??;
        }
    }
    Ok(())
}

/// Forward operations typed on stdin to the connection as command frames.
async fn read_operations(commands: mpsc::Sender<Frame>, device: u8) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let frame = match line.parse::<Operation>().and_then(|op| op.encode(device)) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(input = %line.trim(), error = %e, "ignoring input");
                continue;
            }
        };
        if commands.send(frame).await.is_err() {
            return;
        }
    }
}
