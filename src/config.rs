//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every key has a default, so an empty file (or no file at all) yields a
//! working configuration for a receiver on `/dev/ttyACM0` at 420,000 baud.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::crsf::protocol::{CHANNEL_VALUE_MAX, PACKET_SIZE};
use crate::error::{ReceiverError, Result};
use crate::serial::{CRSF_BAUD_RATE, DEFAULT_DEVICE_PATHS};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub receiver: ReceiverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    /// Tried in order when `port` cannot be opened
    #[serde(default = "default_fallback_ports")]
    pub fallback_ports: Vec<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Wait for the next chunk before checking in (ms)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Bytes per serial read
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Chunks buffered between the serial reader and the receiver task
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Receiver diagnostics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    /// Interval between status reports (ms)
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    /// Log the last frame and a channel table with every report
    #[serde(default)]
    pub dump_frames: bool,

    /// Channel value drawn as a full bar
    #[serde(default = "default_bar_max_value")]
    pub bar_max_value: u16,

    /// Bar width in characters
    #[serde(default = "default_bar_length")]
    pub bar_length: usize,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Also write logs to daily rotated files in this directory
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_serial_port() -> String { DEFAULT_DEVICE_PATHS[0].to_string() }
fn default_fallback_ports() -> Vec<String> {
    DEFAULT_DEVICE_PATHS[1..].iter().map(|p| p.to_string()).collect()
}
fn default_baud_rate() -> u32 { CRSF_BAUD_RATE }
fn default_read_timeout_ms() -> u64 { 10 }
fn default_read_buffer_size() -> usize { 64 }
fn default_queue_depth() -> usize { 10 }

fn default_report_interval_ms() -> u64 { 1000 }
fn default_bar_max_value() -> u16 { CHANNEL_VALUE_MAX }
fn default_bar_length() -> usize { 50 }

fn default_file_prefix() -> String { "elrs-receiver.log".to_string() }

/// Baud rates supported by ELRS receivers
const VALID_BAUD_RATES: [u32; 7] = [115200, 400000, 416666, 420000, 921600, 1870000, 3750000];

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            fallback_ports: default_fallback_ports(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            read_buffer_size: default_read_buffer_size(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            report_interval_ms: default_report_interval_ms(),
            dump_frames: false,
            bar_max_value: default_bar_max_value(),
            bar_length: default_bar_length(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> ReceiverError {
    ReceiverError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use elrs_receiver::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if self.serial.fallback_ports.iter().any(String::is_empty) {
            return Err(invalid("fallback_ports cannot contain empty paths"));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                VALID_BAUD_RATES
            )));
        }

        if self.serial.read_timeout_ms == 0 || self.serial.read_timeout_ms > 10000 {
            return Err(invalid("read_timeout_ms must be between 1 and 10000"));
        }

        // a read must be able to hold at least one whole frame
        if self.serial.read_buffer_size < PACKET_SIZE || self.serial.read_buffer_size > 4096 {
            return Err(invalid(format!(
                "read_buffer_size must be between {} and 4096",
                PACKET_SIZE
            )));
        }

        if self.serial.queue_depth == 0 || self.serial.queue_depth > 1024 {
            return Err(invalid("queue_depth must be between 1 and 1024"));
        }

        if self.receiver.report_interval_ms == 0 || self.receiver.report_interval_ms > 60000 {
            return Err(invalid("report_interval_ms must be between 1 and 60000"));
        }

        if self.receiver.bar_max_value == 0 || self.receiver.bar_max_value > CHANNEL_VALUE_MAX {
            return Err(invalid(format!(
                "bar_max_value must be between 1 and {}",
                CHANNEL_VALUE_MAX
            )));
        }

        if self.receiver.bar_length == 0 || self.receiver.bar_length > 200 {
            return Err(invalid("bar_length must be between 1 and 200"));
        }

        if self.logging.directory.as_deref() == Some("") {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        if self.logging.file_prefix.is_empty() {
            return Err(invalid("logging file_prefix cannot be empty"));
        }

        Ok(())
    }
}
