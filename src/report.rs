//! # Report Module
//!
//! Text rendering for the receiver's periodic status output.
//!
//! This module handles:
//! - Channel bar graphs
//! - The per-channel value table
//! - Hex dumps of the last frame
//! - One-line status summaries with a local wall-clock timestamp

use chrono::{DateTime, Local};

use crate::crsf::protocol::{ChannelSet, Frame};
use crate::receiver::synchronizer::SyncStats;

/// Render one channel value as a fixed-width bar
///
/// At least one cell is always filled so a channel at zero is still visible.
///
/// # Arguments
///
/// * `value` - Channel value
/// * `max` - Value drawn as a full bar
/// * `length` - Bar width in characters
///
/// # Examples
///
/// ```
/// use elrs_receiver::report::render_bar;
///
/// assert_eq!(render_bar(1000, 2000, 10), "=====     ");
/// assert_eq!(render_bar(0, 2000, 4), "=   ");
/// ```
pub fn render_bar(value: u16, max: u16, length: usize) -> String {
    let max = usize::from(max.max(1));
    let filled = (usize::from(value) * length / max).max(1).min(length);

    let mut bar = "=".repeat(filled);
    bar.push_str(&" ".repeat(length - filled));
    bar
}

/// Render all channels as a table, one `| chNN | value | [bar]` line each
///
/// Channels are numbered from 1.
pub fn format_channel_table(channels: &ChannelSet, max: u16, length: usize) -> String {
    channels
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            format!(
                "| ch{:02} | {:>5} | [{}]",
                i + 1,
                value,
                render_bar(value, max, length)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Space separated upper-case hex of a whole frame
pub fn format_frame_hex(frame: &Frame) -> String {
    frame
        .as_bytes()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Local `HH:MM:SS` of `at`
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// One-line receiver status
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use elrs_receiver::receiver::synchronizer::SyncStats;
/// use elrs_receiver::report::format_summary;
///
/// let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 3, 7).unwrap();
/// let line = format_summary(&at, 249.5, &[1024u16; 16], &SyncStats::default());
/// assert!(line.starts_with("[09:03:07] 249.50 FPS"));
/// ```
pub fn format_summary(
    at: &DateTime<Local>,
    fps: f64,
    channels: &ChannelSet,
    stats: &SyncStats,
) -> String {
    let values = channels
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "[{}] {:.2} FPS | ch: {} | frames={} crc_fail={} discarded={}",
        format_timestamp(at),
        fps,
        values,
        stats.frames_accepted,
        stats.crc_failures,
        stats.bytes_discarded
    )
}
