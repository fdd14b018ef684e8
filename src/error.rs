//! # Error Types
//!
//! Custom error types for the ELRS receiver using `thiserror`.
//!
//! Line noise is not an error: the frame synchronizer recovers from it on its
//! own. These variants cover the collaborators around it (serial port,
//! configuration, task plumbing).

use thiserror::Error;

/// Main error type for the ELRS receiver
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// Frame protocol errors
    #[error("ELRS protocol error: {0}")]
    Protocol(String),

    /// Serial port read or configuration failure
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate device paths could be opened
    #[error("No ELRS serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The chunk channel between serial pump and receiver was closed
    #[error("Receiver channel closed")]
    ChannelClosed,
}

/// Result type alias for the ELRS receiver
pub type Result<T> = std::result::Result<T, ReceiverError>;
