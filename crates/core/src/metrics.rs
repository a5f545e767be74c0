//! Metrics collection and reporting for frame synchronization.
//!
//! Each [`FrameSynchronizer`](crate::synchronizer::FrameSynchronizer) keeps
//! its own [`SyncMetrics`], updated on every processed byte:
//! - Bytes consumed
//! - Sync acquisitions and broken partial matches
//! - Frames emitted, checksum failures, truncated captures
//! - Timing information
//!
//! # Thread Safety
//!
//! `SyncMetrics` is plain data owned by its synchronizer. Copy it out with
//! [`FrameSynchronizer::metrics`](crate::synchronizer::FrameSynchronizer::metrics)
//! to report from another thread.

use std::fmt;
use std::time::{Duration, Instant};

/// Counters for one synchronizer instance.
#[derive(Debug, Clone, Copy)]
pub struct SyncMetrics {
    // === Timing ===
    /// When the synchronizer was created
    pub start_time: Instant,

    /// When the stream was finished (set by `complete`)
    pub end_time: Option<Instant>,

    // === Input ===
    /// Total bytes fed through the state machine
    pub bytes_processed: u64,

    // === Synchronization ===
    /// Full sync patterns matched (captures started)
    pub syncs_acquired: u64,

    /// Partial sync matches broken by a non-matching byte
    pub sync_losses: u64,

    // === Frames ===
    /// Frames that passed checksum validation
    pub frames_emitted: u64,

    /// Payload bytes carried by emitted frames
    pub payload_bytes_emitted: u64,

    /// Frames discarded because of a checksum mismatch
    pub checksum_errors: u64,

    /// Captures discarded because the stream ended mid-frame
    pub frames_truncated: u64,
}

impl SyncMetrics {
    /// Create new metrics with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            bytes_processed: 0,
            syncs_acquired: 0,
            sync_losses: 0,
            frames_emitted: 0,
            payload_bytes_emitted: 0,
            checksum_errors: 0,
            frames_truncated: 0,
        }
    }

    /// Mark the stream as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Frames whose checksum stage completed, valid or not.
    pub fn frames_completed(&self) -> u64 {
        self.frames_emitted + self.checksum_errors
    }

    /// Fraction of completed frames that failed the checksum.
    ///
    /// Returns 0.0 if no frame completed.
    pub fn frame_error_rate(&self) -> f64 {
        let completed = self.frames_completed();
        if completed == 0 {
            0.0
        } else {
            self.checksum_errors as f64 / completed as f64
        }
    }

    /// Compute throughput in bytes/second.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.bytes_processed as f64 / duration_secs
        }
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             bytes_processed={}\n\
             syncs_acquired={}\n\
             sync_losses={}\n\
             frames_emitted={}\n\
             payload_bytes_emitted={}\n\
             checksum_errors={}\n\
             frames_truncated={}\n\
             frame_error_rate={:.4}\n",
            self.duration().as_millis(),
            self.bytes_processed,
            self.syncs_acquired,
            self.sync_losses,
            self.frames_emitted,
            self.payload_bytes_emitted,
            self.checksum_errors,
            self.frames_truncated,
            self.frame_error_rate(),
        )
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable summary.
impl fmt::Display for SyncMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Synchronizer Summary ===")?;
        writeln!(f, "Duration: {} ms", self.duration().as_millis())?;
        writeln!(f, "Bytes processed: {}", self.bytes_processed)?;
        writeln!(f)?;

        writeln!(f, "=== Synchronization ===")?;
        writeln!(f, "Syncs acquired: {}", self.syncs_acquired)?;
        writeln!(f, "Partial matches lost: {}", self.sync_losses)?;
        writeln!(f)?;

        writeln!(f, "=== Frames ===")?;
        writeln!(f, "Emitted: {} ({} payload bytes)", self.frames_emitted, self.payload_bytes_emitted)?;
        writeln!(
            f,
            "Checksum errors: {} ({:.2}%)",
            self.checksum_errors,
            self.frame_error_rate() * 100.0
        )?;
        writeln!(f, "Truncated: {}", self.frames_truncated)?;
        writeln!(f)?;

        writeln!(f, "=== Performance ===")?;
        writeln!(f, "Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0)
    }
}
