//! # ELRS Frame Constants and Types
//!
//! Wire layout of the RC channels frame emitted by an ExpressLRS receiver.
//!
//! ```text
//! +------+------+------+---------------------------+-----+
//! | 0xC8 | 0x18 | 0x16 | 22 bytes: 16 x 11-bit ch  | CRC |
//! +------+------+------+---------------------------+-----+
//!    0      1      2     3 ..................... 24    25
//! ```
//!
//! The layout is fixed by the radio-link hardware.

use super::crc::frame_crc;
use super::decoder::decode_channels;
use crate::error::{ReceiverError, Result};

/// Sync byte (device address of the flight controller)
pub const ELRS_SYNC_BYTE: u8 = 0xC8;

/// Frame length byte (type + payload + crc = 24)
pub const ELRS_FRAME_LENGTH: u8 = 0x18;

/// RC channels packed frame type
pub const ELRS_FRAMETYPE_RC_CHANNELS: u8 = 0x16;

/// Header pattern used to locate a candidate frame in an unaligned stream
pub const FRAME_HEADER: [u8; 3] = [ELRS_SYNC_BYTE, ELRS_FRAME_LENGTH, ELRS_FRAMETYPE_RC_CHANNELS];

/// Complete frame size in bytes: header(3) + payload(22) + crc(1)
pub const PACKET_SIZE: usize = 26;

/// Offset of the first channel byte within a frame
pub const PAYLOAD_OFFSET: usize = FRAME_HEADER.len();

/// Packed channel payload size (16 channels x 11 bits = 176 bits)
pub const PAYLOAD_SIZE: usize = 22;

/// First byte covered by the CRC (the frame type byte)
pub const CRC_START: usize = 2;

/// Offset of the CRC byte
pub const CRC_OFFSET: usize = PACKET_SIZE - 1;

/// Number of RC channels per frame
pub const ELRS_NUM_CHANNELS: usize = 16;

/// Bits per packed channel
pub const CHANNEL_BITS: usize = 11;

/// Channel value range (11-bit: 0-2047)
pub const CHANNEL_VALUE_MIN: u16 = 0;
pub const CHANNEL_VALUE_MAX: u16 = 2047;
pub const CHANNEL_VALUE_CENTER: u16 = 1024;

/// Mask selecting the low 11 bits of a combined channel value
pub const CHANNEL_MASK: u16 = 0x07FF;

/// Decoded channel values, one 11-bit value per channel
pub type ChannelSet = [u16; ELRS_NUM_CHANNELS];

/// One complete RC channels frame
///
/// Frames come out of the synchronizer, the encoder, or a checked
/// `TryFrom<&[u8]>`, so a `Frame` always carries a matching checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; PACKET_SIZE]);

impl Frame {
    pub(crate) fn from_bytes(bytes: [u8; PACKET_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw frame bytes, header through CRC
    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }

    /// Packed channel payload (bytes 3..25)
    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_OFFSET..PAYLOAD_OFFSET + PAYLOAD_SIZE]
    }

    /// Trailing checksum byte
    pub fn crc(&self) -> u8 {
        self.0[CRC_OFFSET]
    }

    /// Decode the sixteen channel values carried by this frame
    pub fn channels(&self) -> ChannelSet {
        decode_channels(&self.0)
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = ReceiverError;

    /// Validate a captured frame: exact size, header and checksum
    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PACKET_SIZE] = bytes.try_into().map_err(|_| {
            ReceiverError::Protocol(format!(
                "Frame must be {} bytes, got {}",
                PACKET_SIZE,
                bytes.len()
            ))
        })?;

        if bytes[..PAYLOAD_OFFSET] != FRAME_HEADER {
            return Err(ReceiverError::Protocol(format!(
                "Invalid header: {:02X?}",
                &bytes[..PAYLOAD_OFFSET]
            )));
        }

        let calculated = frame_crc(&bytes);
        if calculated != bytes[CRC_OFFSET] {
            return Err(ReceiverError::Protocol(format!(
                "CRC mismatch: expected 0x{:02X}, got 0x{:02X}",
                calculated, bytes[CRC_OFFSET]
            )));
        }

        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::encoder::encode_frame;

    #[test]
    fn test_channel_value_ranges() {
        assert_eq!(CHANNEL_VALUE_MIN, 0);
        assert_eq!(CHANNEL_VALUE_MAX, 2047);
        assert_eq!(CHANNEL_VALUE_CENTER, 1024);
        assert_eq!(CHANNEL_MASK, CHANNEL_VALUE_MAX);
    }

    #[test]
    fn test_frame_constants() {
        assert_eq!(FRAME_HEADER, [0xC8, 0x18, 0x16]);
        assert_eq!(PACKET_SIZE, 26);
        assert_eq!(ELRS_NUM_CHANNELS, 16);
        assert_eq!(CRC_OFFSET, 25);
    }

    #[test]
    fn test_layout_is_consistent() {
        // header + payload + crc
        assert_eq!(PAYLOAD_OFFSET + PAYLOAD_SIZE + 1, PACKET_SIZE);
        // 16 channels x 11 bits fill the payload exactly
        assert_eq!(ELRS_NUM_CHANNELS * CHANNEL_BITS, PAYLOAD_SIZE * 8);
        // length byte counts everything after itself
        assert_eq!(ELRS_FRAME_LENGTH as usize, PACKET_SIZE - 2);
    }

    #[test]
    fn test_frame_accessors() {
        let mut bytes = [0u8; PACKET_SIZE];
        bytes[..3].copy_from_slice(&FRAME_HEADER);
        bytes[PAYLOAD_OFFSET] = 0xAB;
        bytes[CRC_OFFSET] = 0x5A;

        let frame = Frame::from_bytes(bytes);
        assert_eq!(frame.as_bytes()[0], ELRS_SYNC_BYTE);
        assert_eq!(frame.payload().len(), PAYLOAD_SIZE);
        assert_eq!(frame.payload()[0], 0xAB);
        assert_eq!(frame.crc(), 0x5A);
        assert_eq!(frame.as_ref().len(), PACKET_SIZE);
    }

    #[test]
    fn test_try_from_valid_frame() {
        let encoded = encode_frame(&[1500u16; ELRS_NUM_CHANNELS]);
        let frame = Frame::try_from(&encoded.as_bytes()[..]).unwrap();
        assert_eq!(frame, encoded);
        assert_eq!(frame.channels(), [1500u16; ELRS_NUM_CHANNELS]);
    }

    #[test]
    fn test_try_from_wrong_size() {
        let result = Frame::try_from(&[ELRS_SYNC_BYTE; 10][..]);
        match result {
            Err(ReceiverError::Protocol(msg)) => assert!(msg.contains("26 bytes")),
            other => panic!("Expected Protocol error, got: {:?}", other),
        }
    }

    #[test]
    fn test_try_from_bad_header() {
        let mut bytes = *encode_frame(&[0u16; ELRS_NUM_CHANNELS]).as_bytes();
        bytes[1] = 0x19;
        assert!(Frame::try_from(&bytes[..]).is_err());
    }

    #[test]
    fn test_try_from_crc_error() {
        let mut bytes = *encode_frame(&[CHANNEL_VALUE_CENTER; ELRS_NUM_CHANNELS]).as_bytes();
        bytes[CRC_OFFSET] ^= 0xFF;

        match Frame::try_from(&bytes[..]) {
            Err(ReceiverError::Protocol(msg)) => assert!(msg.contains("CRC mismatch")),
            other => panic!("Expected CRC error, got: {:?}", other),
        }
    }
}
