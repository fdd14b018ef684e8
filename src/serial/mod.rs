//! # Serial Communication Module
//!
//! Handles the serial link from the ELRS receiver.
//!
//! This module handles:
//! - Opening the serial port at 420,000 baud (8N1, no flow control)
//! - Reading raw bytes in small chunks
//! - Forwarding chunks to the receiver task over a channel
//!
//! The port knows nothing about frames; chunk boundaries are arbitrary.

pub mod port_trait;

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{ReceiverError, Result};
use port_trait::{SerialPortIO, TokioSerialPort};

/// CRSF baud rate for ELRS (420,000 baud)
pub const CRSF_BAUD_RATE: u32 = 420_000;

/// Default ELRS device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// ELRS Serial Port Handler
///
/// Manages the connection to the ELRS receiver's UART.
pub struct ElrsSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyACM0)
    device_path: String,
}

impl std::fmt::Debug for ElrsSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElrsSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl ElrsSerial {
    /// Open the configured port, falling back to the alternates in order
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if none of the paths can be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use elrs_receiver::config::Config;
    /// use elrs_receiver::serial::ElrsSerial;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let config = Config::default();
    ///     let serial = ElrsSerial::open(&config.serial)?;
    ///     println!("Listening on {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let paths: Vec<&str> = std::iter::once(config.port.as_str())
            .chain(config.fallback_ports.iter().map(String::as_str))
            .collect();

        Self::open_with_paths(&paths, config.baud_rate)
    }

    /// Open connection to the ELRS receiver with custom device paths
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyACM0"])
    /// * `baud_rate` - Line rate, normally [`CRSF_BAUD_RATE`]
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened ELRS device at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(ReceiverError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with CRSF settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| ReceiverError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Hand the port over to a reader
    pub fn into_reader(self) -> TokioSerialPort {
        TokioSerialPort::new(self.port)
    }
}

/// Read from `port` and forward every non-empty read to `tx`
///
/// Each read is bounded by `read_timeout`; an idle line is not an error.
///
/// # Arguments
///
/// * `port` - Byte source
/// * `tx` - Chunk channel to the receiver task
/// * `buffer_size` - Maximum bytes per read (and per chunk)
/// * `read_timeout` - How long a single read may wait
///
/// # Returns
///
/// * `Ok(())` - The port reached end of stream or the receiver went away
///
/// # Errors
///
/// Returns `Serial` if the port reports a read failure
pub async fn pump_serial<P: SerialPortIO>(
    mut port: P,
    tx: mpsc::Sender<Bytes>,
    buffer_size: usize,
    read_timeout: Duration,
) -> Result<()> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total: u64 = 0;

    loop {
        let n = match timeout(read_timeout, port.read(&mut buf)).await {
            Err(_) => {
                if tx.is_closed() {
                    debug!("Receiver gone, stopping serial pump after {} bytes", total);
                    return Ok(());
                }
                continue;
            }
            Ok(Ok(0)) => {
                info!("Serial port reached end of stream after {} bytes", total);
                return Ok(());
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                continue;
            }
            Ok(Err(e)) => {
                return Err(ReceiverError::Serial(format!(
                    "Failed to read from serial port: {}",
                    e
                )));
            }
        };

        total += n as u64;
        if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
            debug!("Receiver gone, stopping serial pump after {} bytes", total);
            return Ok(());
        }
    }
}
