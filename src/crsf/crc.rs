//! # CRC8-DVB-S2 Implementation
//!
//! Table-driven CRC-8 used to validate ELRS frames.
//!
//! **Polynomial**: 0xD5 (x^8 + x^7 + x^6 + x^4 + x^2 + 1)
//! **Initial Value**: 0x00
//!
//! The checksum covers the frame type byte and the channel payload, i.e.
//! frame bytes 2 through 24. The sync and length bytes are not included.

use super::protocol::{CRC_OFFSET, CRC_START, PACKET_SIZE};

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY: u8 = 0xD5;

/// Lookup table, built once at compile time
static CRC8_TABLE: [u8; 256] = generate_crc8_table(CRC8_POLY);

/// Build the 256-entry lookup table for `poly`
const fn generate_crc8_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ poly;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC8-DVB-S2 checksum using the lookup table
///
/// # Examples
///
/// ```
/// use elrs_receiver::crsf::crc::crc8_dvb_s2;
///
/// assert_eq!(crc8_dvb_s2(&[]), 0x00);
/// assert_ne!(crc8_dvb_s2(&[0x16, 0x00, 0x04]), 0x00);
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}

/// Checksum over the covered region of a frame-sized window
///
/// # Panics
///
/// Panics if `window` is shorter than a frame.
pub fn frame_crc(window: &[u8]) -> u8 {
    crc8_dvb_s2(&window[CRC_START..CRC_OFFSET])
}

/// Whether the CRC byte of a frame-sized window matches its contents
pub fn crc_matches(window: &[u8]) -> bool {
    window.len() >= PACKET_SIZE && frame_crc(window) == window[CRC_OFFSET]
}

/// Bitwise CRC, used to cross-check the table
#[cfg(test)]
fn crc8_dvb_s2_slow(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::protocol::FRAME_HEADER;

    #[test]
    fn test_crc8_empty() {
        assert_eq!(crc8_dvb_s2(&[]), 0x00);
    }

    #[test]
    fn test_table_entries() {
        assert_eq!(CRC8_TABLE[0], 0x00);
        // bit 0 reaches the top after seven shifts, then folds in the polynomial once
        assert_eq!(CRC8_TABLE[1], CRC8_POLY);
    }

    #[test]
    fn test_crc8_single_byte() {
        assert_eq!(crc8_dvb_s2(&[0x00]), 0x00);

        let crc = crc8_dvb_s2(&[0xFF]);
        assert_eq!(crc, crc8_dvb_s2_slow(&[0xFF]));
        assert_ne!(crc, 0x00);
    }

    #[test]
    fn test_crc8_lookup_table_matches_slow() {
        let test_data = [
            vec![0x01, 0x02, 0x03],
            vec![0xFF, 0xFE, 0xFD],
            vec![0x16, 0xE0, 0x03],
            vec![0x00; 23],
            vec![0xFF; 10],
        ];

        for data in test_data.iter() {
            assert_eq!(
                crc8_dvb_s2(data),
                crc8_dvb_s2_slow(data),
                "CRC mismatch for data: {:?}",
                data
            );
        }
    }

    #[test]
    fn test_every_byte_value_matches_slow() {
        for byte in 0..=255u8 {
            assert_eq!(crc8_dvb_s2(&[byte]), crc8_dvb_s2_slow(&[byte]));
        }
    }

    #[test]
    fn test_frame_crc_skips_sync_and_length() {
        let mut window = [0u8; PACKET_SIZE];
        window[..3].copy_from_slice(&FRAME_HEADER);
        let crc = frame_crc(&window);

        // changing bytes 0 and 1 leaves the checksum alone
        window[0] = 0x00;
        window[1] = 0x00;
        assert_eq!(frame_crc(&window), crc);

        // the type byte is covered
        window[2] = 0x17;
        assert_ne!(frame_crc(&window), crc);
    }

    #[test]
    fn test_frame_crc_ignores_crc_byte() {
        let mut window = [0x55u8; PACKET_SIZE];
        let crc = frame_crc(&window);
        window[CRC_OFFSET] = !window[CRC_OFFSET];
        assert_eq!(frame_crc(&window), crc);
    }

    #[test]
    fn test_crc_matches() {
        let mut window = [0u8; PACKET_SIZE];
        window[..3].copy_from_slice(&FRAME_HEADER);
        window[CRC_OFFSET] = frame_crc(&window);
        assert!(crc_matches(&window));

        window[CRC_OFFSET] ^= 0x01;
        assert!(!crc_matches(&window));
    }

    #[test]
    fn test_crc_matches_short_window() {
        assert!(!crc_matches(&[0u8; PACKET_SIZE - 1]));
    }
}
