//! # ELRS Receiver Library
//!
//! Frame synchronization and channel decoding for ExpressLRS receivers.
//!
//! This library reads the CRSF RC-channels stream an ELRS receiver emits on
//! its UART, recovers frame alignment from arbitrary chunk boundaries,
//! validates each frame's CRC-8 and publishes the 16 decoded 11-bit channel
//! values together with a frames-per-second estimate.

pub mod config;
pub mod error;
pub mod crsf;
pub mod receiver;
pub mod report;
pub mod serial;
