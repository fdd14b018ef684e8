//! # Byte Accumulator
//!
//! Holds the serial bytes that have not yet been consumed by the frame
//! synchronizer. Grows only at the tail, shrinks only at the head.

use bytes::{Buf, BytesMut};

/// Initial capacity: a few read chunks plus one frame of carry-over
const DEFAULT_CAPACITY: usize = 256;

/// Append-then-trim byte buffer owned by the synchronizer
#[derive(Debug)]
pub struct ByteAccumulator {
    buf: BytesMut,
}

impl ByteAccumulator {
    /// Creates an empty accumulator
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty accumulator with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Adds newly received bytes to the tail
    pub fn append(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Removes the first `n` bytes
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the buffered length. The synchronizer never asks
    /// for more than it has looked at, so this is a logic error.
    pub fn discard_prefix(&mut self, n: usize) {
        assert!(
            n <= self.buf.len(),
            "discard_prefix({}) exceeds buffered length {}",
            n,
            self.buf.len()
        );
        self.buf.advance(n);
    }

    /// Offset of the first occurrence of `pattern`, if any
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        if pattern.is_empty() {
            return Some(0);
        }
        self.buf
            .windows(pattern.len())
            .position(|window| window == pattern)
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Buffered bytes, oldest first
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl Default for ByteAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
