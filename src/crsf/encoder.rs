//! # RC Channels Encoder
//!
//! Packs channel values into a complete frame. The receiver never transmits;
//! encoding is used to build known-good frames for tests and loopback.

use super::crc::frame_crc;
use super::protocol::*;

/// Encode channels into a complete, checksummed frame
///
/// # Arguments
///
/// * `channels` - Sixteen channel values (values above 2047 are clamped)
///
/// # Returns
///
/// * `Frame` - 26 bytes: header + 22-byte payload + crc
///
/// # Examples
///
/// ```
/// use elrs_receiver::crsf::encoder::encode_frame;
///
/// let frame = encode_frame(&[1024u16; 16]);
/// assert_eq!(frame.as_bytes().len(), 26);
/// assert_eq!(frame.channels(), [1024u16; 16]);
/// ```
pub fn encode_frame(channels: &ChannelSet) -> Frame {
    let mut bytes = [0u8; PACKET_SIZE];
    bytes[..PAYLOAD_OFFSET].copy_from_slice(&FRAME_HEADER);
    bytes[PAYLOAD_OFFSET..CRC_OFFSET].copy_from_slice(&encode_channels_payload(channels));
    bytes[CRC_OFFSET] = frame_crc(&bytes);

    Frame::from_bytes(bytes)
}

/// Encode channels into the 22-byte packed payload
///
/// Channels are packed LSB-first as one continuous bitstream:
/// ```text
/// Byte 0: Ch1[0:7]
/// Byte 1: Ch1[8:10] | Ch2[0:4]
/// Byte 2: Ch2[5:10] | Ch3[0:1]
/// ...
/// ```
pub fn encode_channels_payload(channels: &ChannelSet) -> [u8; PAYLOAD_SIZE] {
    let mut payload = [0u8; PAYLOAD_SIZE];
    let mut bit_index = 0;

    for &channel in channels.iter() {
        let value = clamp_channel_value(channel);

        for bit in 0..CHANNEL_BITS {
            if (value >> bit) & 1 == 1 {
                payload[bit_index / 8] |= 1 << (bit_index % 8);
            }
            bit_index += 1;
        }
    }

    payload
}

/// Clamp a channel value to the 11-bit range
pub fn clamp_channel_value(value: u16) -> u16 {
    value.min(CHANNEL_VALUE_MAX)
}
