//! # ELRS Frame Protocol Module
//!
//! The CRSF-style RC channels frame delivered by an ExpressLRS receiver.
//!
//! This module handles:
//! - Frame layout constants (26-byte frame, 3-byte header)
//! - CRC8-DVB-S2 checksum calculation
//! - Unpacking 16 channels at 11-bit resolution
//! - Packing channels into frames (test and loopback use)

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
