//! # RC Channels Decoder
//!
//! Unpacks the sixteen 11-bit channel values from a validated frame.

use super::protocol::*;

/// Decode the channel values from a complete frame
///
/// Channels are packed as a continuous LSB-first bitstream starting at
/// byte 3, immediately after the header. Channel `i` starts at bit `i * 11`
/// of the payload and may straddle two or three bytes.
///
/// # Arguments
///
/// * `frame` - Complete frame bytes (header, payload, crc)
///
/// # Returns
///
/// * `ChannelSet` - Sixteen values in `0..=2047`
///
/// # Examples
///
/// ```
/// use elrs_receiver::crsf::decoder::decode_channels;
/// use elrs_receiver::crsf::protocol::PACKET_SIZE;
///
/// let mut frame = [0u8; PACKET_SIZE];
/// frame[3] = 0xFF;
/// frame[4] = 0x07;
/// let channels = decode_channels(&frame);
/// assert_eq!(channels[0], 2047);
/// assert_eq!(channels[1], 0);
/// ```
pub fn decode_channels(frame: &[u8; PACKET_SIZE]) -> ChannelSet {
    let mut channels = [0u16; ELRS_NUM_CHANNELS];

    for (i, channel) in channels.iter_mut().enumerate() {
        let bit_position = i * CHANNEL_BITS;
        let byte_index = PAYLOAD_OFFSET + bit_position / 8;
        let bit_shift = bit_position % 8;

        let mut value = (frame[byte_index] as u32 >> bit_shift)
            | ((frame[byte_index + 1] as u32) << (8 - bit_shift));

        // fewer than 3 bits left in the second byte: field spills into a third
        if bit_shift > 5 {
            value |= (frame[byte_index + 2] as u32) << (16 - bit_shift);
        }

        *channel = (value as u16) & CHANNEL_MASK;
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::encoder::{encode_channels_payload, encode_frame};

    fn frame_with_payload(payload: &[u8]) -> [u8; PACKET_SIZE] {
        let mut frame = [0u8; PACKET_SIZE];
        frame[..PAYLOAD_OFFSET].copy_from_slice(&FRAME_HEADER);
        frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
        frame
    }

    #[test]
    fn test_decode_all_zeros() {
        let frame = frame_with_payload(&[0u8; PAYLOAD_SIZE]);
        assert_eq!(decode_channels(&frame), [0u16; ELRS_NUM_CHANNELS]);
    }

    #[test]
    fn test_decode_all_ones() {
        let frame = frame_with_payload(&[0xFFu8; PAYLOAD_SIZE]);
        assert_eq!(decode_channels(&frame), [CHANNEL_VALUE_MAX; ELRS_NUM_CHANNELS]);
    }

    #[test]
    fn test_decode_ignores_header_and_crc() {
        let mut frame = frame_with_payload(&[0u8; PAYLOAD_SIZE]);
        frame[CRC_OFFSET] = 0xFF;
        assert_eq!(decode_channels(&frame), [0u16; ELRS_NUM_CHANNELS]);
    }

    #[test]
    fn test_decode_first_channel() {
        // ch1 = 0x3E8 (1000): low byte 0xE8, then 3 bits 0b011
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[0] = 0xE8;
        payload[1] = 0x03;
        let channels = decode_channels(&frame_with_payload(&payload));

        assert_eq!(channels[0], 1000);
        assert!(channels[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_decode_channel_spanning_three_bytes() {
        // ch3 starts at bit 22: byte 2 bit 6, covers bytes 2, 3 and 4
        let mut channels = [0u16; ELRS_NUM_CHANNELS];
        channels[2] = 0b101_0101_0101;
        let payload = encode_channels_payload(&channels);

        assert_ne!(payload[4], 0, "third byte must carry the top bit");
        let decoded = decode_channels(&frame_with_payload(&payload));
        assert_eq!(decoded[2], 0b101_0101_0101);
        assert_eq!(decoded[1], 0);
        assert_eq!(decoded[3], 0);
    }

    #[test]
    fn test_decode_last_channel() {
        // ch16 occupies the top 11 bits of the payload
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[PAYLOAD_SIZE - 2] = 0xE0;
        payload[PAYLOAD_SIZE - 1] = 0xFF;
        let channels = decode_channels(&frame_with_payload(&payload));

        assert_eq!(channels[15], CHANNEL_VALUE_MAX);
        assert!(channels[..15].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_decode_center_values() {
        let frame = encode_frame(&[CHANNEL_VALUE_CENTER; ELRS_NUM_CHANNELS]);
        assert_eq!(decode_channels(frame.as_bytes()), [CHANNEL_VALUE_CENTER; ELRS_NUM_CHANNELS]);
    }

    #[test]
    fn test_round_trip_distinct_values() {
        let mut channels = [0u16; ELRS_NUM_CHANNELS];
        for (i, ch) in channels.iter_mut().enumerate() {
            *ch = (i as u16 * 131 + 7) % 2048;
        }

        let frame = encode_frame(&channels);
        assert_eq!(decode_channels(frame.as_bytes()), channels);
    }

    #[test]
    fn test_round_trip_single_bits() {
        // walk one set bit through every position of every channel
        for ch in 0..ELRS_NUM_CHANNELS {
            for bit in 0..CHANNEL_BITS {
                let mut channels = [0u16; ELRS_NUM_CHANNELS];
                channels[ch] = 1 << bit;

                let frame = encode_frame(&channels);
                assert_eq!(
                    decode_channels(frame.as_bytes()),
                    channels,
                    "channel {} bit {}",
                    ch,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_round_trip_pseudo_random_vectors() {
        let mut state: u32 = 0x1234_5678;
        for _ in 0..200 {
            let mut channels = [0u16; ELRS_NUM_CHANNELS];
            for ch in channels.iter_mut() {
                // xorshift32
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                *ch = (state % 2048) as u16;
            }

            let frame = encode_frame(&channels);
            assert_eq!(decode_channels(frame.as_bytes()), channels);
        }
    }
}
