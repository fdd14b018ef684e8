//! # Receiver Module
//!
//! Turns a stream of serial chunks into published channel values.
//!
//! This module handles:
//! - Buffering unaligned serial bytes
//! - Frame synchronization and CRC validation
//! - Decoding and publishing channel snapshots
//! - Frame rate estimation
//!
//! One task owns the synchronizer and is the only writer. Readers hold a
//! [`ReceiverHandle`] and always get a complete copy of the latest values.

pub mod accumulator;
pub mod rate;
pub mod synchronizer;

use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::crsf::decoder::decode_channels;
use crate::crsf::protocol::{ChannelSet, Frame, ELRS_NUM_CHANNELS};
use crate::error::{ReceiverError, Result};
use rate::RateTracker;
use synchronizer::{FrameSynchronizer, SyncStats};

/// Default wait for the next serial chunk
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(10);

/// Latest decoded state, published as one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Channel values from the most recent valid frame (all zero before the first)
    pub channels: ChannelSet,

    /// The most recent valid frame
    pub last_frame: Option<Frame>,

    /// Synchronizer counters
    pub stats: SyncStats,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            channels: [0u16; ELRS_NUM_CHANNELS],
            last_frame: None,
            stats: SyncStats::default(),
        }
    }
}

/// Read side of the receiver, cheap to clone
#[derive(Debug, Clone)]
pub struct ReceiverHandle {
    snapshot: watch::Receiver<Snapshot>,
    fps: watch::Receiver<f64>,
}

impl ReceiverHandle {
    /// Copy of the current channel values
    pub fn channels(&self) -> ChannelSet {
        self.snapshot.borrow().channels
    }

    /// Last computed frames-per-second figure
    pub fn fps(&self) -> f64 {
        *self.fps.borrow()
    }

    /// Copy of the current synchronizer counters
    pub fn stats(&self) -> SyncStats {
        self.snapshot.borrow().stats
    }

    /// Copy of the complete latest snapshot
    pub fn snapshot(&self) -> Snapshot {
        *self.snapshot.borrow()
    }

    /// Waits for the next published snapshot
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` once the receiver task has stopped.
    pub async fn changed(&mut self) -> Result<Snapshot> {
        self.snapshot
            .changed()
            .await
            .map_err(|_| ReceiverError::ChannelClosed)?;
        Ok(*self.snapshot.borrow_and_update())
    }
}

/// Single-consumer frame receiver
///
/// Owns the synchronizer state; publication goes through `watch` channels
/// so readers never observe a half-written channel array.
#[derive(Debug)]
pub struct ElrsReceiver {
    sync: FrameSynchronizer,
    rate: RateTracker,
    recv_timeout: Duration,
    snapshot_tx: watch::Sender<Snapshot>,
    fps_tx: watch::Sender<f64>,
}

impl ElrsReceiver {
    /// Creates a receiver and the handle used to read its output
    ///
    /// # Arguments
    ///
    /// * `recv_timeout` - How long `run` waits for a chunk before checking in
    pub fn new(recv_timeout: Duration) -> (Self, ReceiverHandle) {
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let (fps_tx, fps_rx) = watch::channel(0.0);

        let receiver = Self {
            sync: FrameSynchronizer::new(),
            rate: RateTracker::new(Instant::now()),
            recv_timeout,
            snapshot_tx,
            fps_tx,
        };
        let handle = ReceiverHandle {
            snapshot: snapshot_rx,
            fps: fps_rx,
        };

        (receiver, handle)
    }

    /// Feeds one chunk and processes every frame it completes
    ///
    /// # Arguments
    ///
    /// * `chunk` - Bytes as delivered by the serial port
    /// * `now` - Arrival time, used for the frame rate
    ///
    /// # Returns
    ///
    /// * `usize` - Number of frames accepted from this chunk
    pub fn ingest(&mut self, chunk: &[u8], now: Instant) -> usize {
        self.sync.push(chunk);

        let mut accepted = 0;
        while let Some(frame) = self.sync.next_frame() {
            let channels = decode_channels(frame.as_bytes());
            let stats = self.sync.stats();

            self.snapshot_tx.send_modify(|snapshot| {
                snapshot.channels = channels;
                snapshot.last_frame = Some(frame);
                snapshot.stats = stats;
            });

            if let Some(fps) = self.rate.record_frame(now) {
                debug!("ELRS FPS := {:.2}", fps);
                self.fps_tx.send_replace(fps);
            }

            accepted += 1;
        }

        // a noisy link keeps chunks coming without frames
        if accepted == 0 {
            self.tick(now);
        }

        // noise-only chunks still move the counters
        let stats = self.sync.stats();
        self.snapshot_tx.send_if_modified(|snapshot| {
            if snapshot.stats == stats {
                return false;
            }
            snapshot.stats = stats;
            true
        });

        accepted
    }

    /// Closes an elapsed rate window while no frames arrive
    ///
    /// Publishes the new figure, so a silent link reads as 0.0 FPS after at
    /// most two windows.
    pub fn tick(&mut self, now: Instant) {
        if let Some(fps) = self.rate.tick(now) {
            debug!("ELRS FPS := {:.2}", fps);
            self.fps_tx.send_replace(fps);
        }
    }

    /// Last computed frames-per-second figure
    pub fn fps(&self) -> f64 {
        self.rate.fps()
    }

    /// Synchronizer counters
    pub fn stats(&self) -> SyncStats {
        self.sync.stats()
    }

    /// Consumes chunks until the sender side closes
    ///
    /// Waits at most `recv_timeout` per chunk; on a timeout the loop only
    /// checks whether anyone is still reading and goes back to waiting.
    pub async fn run(mut self, mut chunks: mpsc::Receiver<Bytes>) {
        info!("ELRS receiver started");

        loop {
            match timeout(self.recv_timeout, chunks.recv()).await {
                Ok(Some(chunk)) => {
                    let now = tokio::time::Instant::now().into_std();
                    let accepted = self.ingest(&chunk, now);
                    trace!("Chunk of {} bytes, {} frames", chunk.len(), accepted);
                }
                Ok(None) => {
                    info!("Serial source closed, stopping receiver");
                    break;
                }
                Err(_) => {
                    if self.snapshot_tx.is_closed() {
                        info!("No readers left, stopping receiver");
                        break;
                    }
                    trace!("No serial data within {:?}", self.recv_timeout);
                    self.tick(tokio::time::Instant::now().into_std());
                }
            }
        }

        let stats = self.sync.stats();
        info!(
            "ELRS receiver stopped: {} frames accepted, {} CRC failures, {} bytes discarded",
            stats.frames_accepted, stats.crc_failures, stats.bytes_discarded
        );
    }
}

/// Spawns a receiver task fed by `chunks`
///
/// # Examples
///
/// ```no_run
/// use bytes::Bytes;
/// use elrs_receiver::receiver::{spawn_receiver, DEFAULT_RECV_TIMEOUT};
/// use tokio::sync::mpsc;
///
/// #[tokio::main]
/// async fn main() {
///     let (tx, rx) = mpsc::channel::<Bytes>(10);
///     let (task, handle) = spawn_receiver(rx, DEFAULT_RECV_TIMEOUT);
///
///     // serial pump pushes chunks into `tx` ...
///     drop(tx);
///     task.await.unwrap();
///     println!("channels: {:?}", handle.channels());
/// }
/// ```
pub fn spawn_receiver(
    chunks: mpsc::Receiver<Bytes>,
    recv_timeout: Duration,
) -> (JoinHandle<()>, ReceiverHandle) {
    let (receiver, handle) = ElrsReceiver::new(recv_timeout);
    let task = tokio::spawn(receiver.run(chunks));
    (task, handle)
}
