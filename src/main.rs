//! # ELRS Receiver
//!
//! Reads RC channel frames from an ExpressLRS receiver over serial and
//! reports the decoded channel values.

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use elrs_receiver::config::{Config, LoggingConfig, ReceiverConfig};
use elrs_receiver::receiver::{spawn_receiver, ReceiverHandle};
use elrs_receiver::report::{format_channel_table, format_frame_hex, format_summary};
use elrs_receiver::serial::{pump_serial, ElrsSerial};

/// Main entry point for the ELRS receiver
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or built-in defaults)
///    - Set up logging, optionally mirrored to a daily log file
///    - Open the serial connection to the ELRS receiver
///
/// 2. **Main Loop**
///    - Serial task forwards raw chunks to the receiver task
///    - Receiver task synchronizes frames and publishes channel values
///    - Status line every `report_interval_ms`
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop the serial reader, let the receiver drain
///    - Log final counters
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be read or is invalid
/// - No serial port can be opened
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO elrs_receiver: ELRS Receiver v0.1.0 starting...
/// INFO elrs_receiver::serial: Successfully opened ELRS device at /dev/ttyACM0 (420000 baud)
/// INFO elrs_receiver: [14:02:51] 249.87 FPS | ch: 992 992 172 992 ... | frames=250 crc_fail=0 discarded=0
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;

    let _log_guard = init_logging(&config.logging)?;

    info!("ELRS Receiver v{} starting...", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path),
        None => info!("No configuration file given, using defaults"),
    }

    let serial = ElrsSerial::open(&config.serial)?;
    info!("ELRS serial port opened at: {}", serial.device_path());

    let read_timeout = Duration::from_millis(config.serial.read_timeout_ms);
    let (chunk_tx, chunk_rx) = mpsc::channel(config.serial.queue_depth);

    let mut pump = tokio::spawn(pump_serial(
        serial.into_reader(),
        chunk_tx,
        config.serial.read_buffer_size,
        read_timeout,
    ));
    let (receiver_task, handle) = spawn_receiver(chunk_rx, read_timeout);

    let mut report_interval = interval(Duration::from_millis(config.receiver.report_interval_ms));
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = report_interval.tick() => {
                log_report(&handle, &config.receiver);
            }

            result = &mut pump => {
                match result {
                    Ok(Ok(())) => info!("Serial port closed"),
                    Ok(Err(e)) => error!("Serial reader failed: {}", e),
                    Err(e) => error!("Serial reader task failed: {}", e),
                }
                break;
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    // dropping the pump closes the chunk channel and ends the receiver
    pump.abort();
    receiver_task.await.context("Receiver task failed")?;

    let stats = handle.stats();
    info!(
        "Total: {} bytes received, {} frames accepted",
        stats.bytes_received, stats.frames_accepted
    );

    Ok(())
}

/// Load the configuration file, or the defaults when no path is given
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path)),
        None => Ok(Config::default()),
    }
}

/// Install the tracing subscriber
///
/// Console output always; a non-blocking daily rolling file as well when a
/// log directory is configured. The returned guard flushes the file writer
/// and must live until exit.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory {}", directory))?;

            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn log_report(handle: &ReceiverHandle, config: &ReceiverConfig) {
    let snapshot = handle.snapshot();
    info!(
        "{}",
        format_summary(&Local::now(), handle.fps(), &snapshot.channels, &snapshot.stats)
    );

    if config.dump_frames {
        if let Some(frame) = snapshot.last_frame {
            debug!("Raw frame: {}", format_frame_hex(&frame));
        }
        debug!(
            "Channels:\n{}",
            format_channel_table(&snapshot.channels, config.bar_max_value, config.bar_length)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 420000);
    }

    #[test]
    fn test_load_config_from_path() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[receiver]\nreport_interval_ms = 250\n")
            .unwrap();
        temp_file.flush().unwrap();

        let path = temp_file.path().to_str().unwrap();
        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.receiver.report_interval_ms, 250);
    }

    #[test]
    fn test_load_config_error_names_path() {
        let err = load_config(Some("/nonexistent/receiver.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/receiver.toml"));
    }
}
