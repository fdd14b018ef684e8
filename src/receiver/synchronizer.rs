//! # Frame Synchronizer
//!
//! Recovers complete, CRC-valid frames from an unaligned byte stream.
//!
//! ## Resynchronization policy
//!
//! Each iteration looks at the accumulated bytes and takes exactly one of
//! these actions:
//!
//! | Situation | Action |
//! |-----------|--------|
//! | fewer than 26 bytes buffered | wait for more data |
//! | no header, or header too close to the end | drop one byte from the head |
//! | header found, CRC mismatch | drop through the first byte of that header |
//! | header found, CRC match | emit frame, drop leading garbage and the frame |
//!
//! A three byte header shows up in random noise often enough that every
//! match is confirmed by the CRC. On a mismatch only one byte past the
//! match is dropped, so a genuine frame starting inside the false candidate
//! is still found on the next pass.

use tracing::trace;

use super::accumulator::ByteAccumulator;
use crate::crsf::crc::crc_matches;
use crate::crsf::protocol::{Frame, FRAME_HEADER, PACKET_SIZE};

/// Outcome of a single synchronizer iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    /// Fewer than a frame's worth of bytes buffered
    NeedMoreData,

    /// No usable header; the head byte was dropped
    Skipped,

    /// A header matched at `start` but the CRC did not; `start + 1` bytes dropped
    Rejected { start: usize },

    /// A valid frame was extracted after `skipped` bytes of leading garbage
    Accepted { frame: Frame, skipped: usize },
}

/// Running counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Bytes handed to the synchronizer
    pub bytes_received: u64,

    /// Frames that passed the CRC check
    pub frames_accepted: u64,

    /// Header matches rejected by the CRC check
    pub crc_failures: u64,

    /// Bytes dropped without being part of an accepted frame
    pub bytes_discarded: u64,
}

/// Frame synchronizer over an owned byte accumulator
///
/// # Examples
///
/// ```
/// use elrs_receiver::crsf::encoder::encode_frame;
/// use elrs_receiver::receiver::synchronizer::FrameSynchronizer;
///
/// let frame = encode_frame(&[1024u16; 16]);
///
/// let mut sync = FrameSynchronizer::new();
/// sync.push(&[0xAA]);
/// sync.push(&frame.as_bytes()[..10]);
/// assert!(sync.next_frame().is_none());
///
/// sync.push(&frame.as_bytes()[10..]);
/// assert_eq!(sync.next_frame(), Some(frame));
/// assert!(sync.buffered().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct FrameSynchronizer {
    buffer: ByteAccumulator,
    stats: SyncStats,
}

impl FrameSynchronizer {
    /// Creates a synchronizer with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of received bytes
    ///
    /// Chunks may split or merge frames arbitrarily.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.append(chunk);
        self.stats.bytes_received += chunk.len() as u64;
    }

    /// Runs one iteration of the resynchronization loop
    pub fn step(&mut self) -> SyncStep {
        if self.buffer.len() < PACKET_SIZE {
            return SyncStep::NeedMoreData;
        }

        let start = match self.buffer.find(&FRAME_HEADER) {
            Some(start) if self.buffer.len() - start >= PACKET_SIZE => start,
            _ => {
                self.discard(1);
                return SyncStep::Skipped;
            }
        };

        let window = &self.buffer.as_slice()[start..start + PACKET_SIZE];
        if !crc_matches(window) {
            trace!("CRC mismatch for header at offset {}, sliding past it", start);
            self.stats.crc_failures += 1;
            self.discard(start + 1);
            return SyncStep::Rejected { start };
        }

        let mut bytes = [0u8; PACKET_SIZE];
        bytes.copy_from_slice(window);

        if start > 0 {
            trace!("Dropped {} bytes of leading garbage", start);
        }
        self.stats.bytes_discarded += start as u64;
        self.stats.frames_accepted += 1;
        self.buffer.discard_prefix(start + PACKET_SIZE);

        SyncStep::Accepted {
            frame: Frame::from_bytes(bytes),
            skipped: start,
        }
    }

    /// Iterates until a frame is accepted or no full frame remains
    ///
    /// Calling this again without pushing new bytes after it returned `None`
    /// changes nothing.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.step() {
                SyncStep::NeedMoreData => return None,
                SyncStep::Accepted { frame, .. } => return Some(frame),
                SyncStep::Skipped | SyncStep::Rejected { .. } => continue,
            }
        }
    }

    /// Drains every frame that can currently be extracted
    pub fn frames(&mut self) -> impl Iterator<Item = Frame> + '_ {
        std::iter::from_fn(move || self.next_frame())
    }

    /// Bytes still waiting in the accumulator
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Diagnostic counters since creation
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    fn discard(&mut self, n: usize) {
        self.buffer.discard_prefix(n);
        self.stats.bytes_discarded += n as u64;
    }
}
