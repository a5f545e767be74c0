//! Byte-at-a-time frame synchronizer.
//!
//! The synchronizer scans a byte stream for the sync pattern, captures the
//! fixed-length payload that follows, reads the 2-byte big-endian checksum
//! and either emits the payload as a [`Frame`] or reports a checksum
//! mismatch.
//!
//! # States
//!
//! ```text
//!            pattern[i] matched, i+1 < N
//!              +-------+
//!              v       |
//!   +-------------------+   i+1 == N    +------------------+  L bytes  +-------------------+
//!   | Seeking{matched}  | ------------> | Payload{filled}  | --------> | Checksum{collect} |
//!   +-------------------+               +------------------+           +-------------------+
//!      ^    |  mismatch: matched = 0                                            |
//!      |    +---------+                                        2nd checksum byte |
//!      +------------------------------------------------------------------------+
//!                     emit Frame or ChecksumMismatch, then Seeking{0}
//! ```
//!
//! A mismatch while seeking always restarts from pattern index 0, even when
//! the mismatching byte equals the first pattern byte. There is no overlap
//! handling inside the pattern.
//!
//! After a frame completes (valid or not) the very next byte starts a fresh
//! search. The payload and checksum stages keep separate counters, and the
//! emitted payload length is always the configured length.
//!
//! # Thread Safety
//!
//! Each byte's effect depends on every byte before it, so one synchronizer
//! must only ever be driven by one caller. Use one instance per stream.

use tracing::{debug, trace, warn};

use crate::crc::crc16_ccitt_false;
use crate::error::{Error, Result};
use crate::framing::{Frame, FrameFormat, CHECKSUM_SIZE};
use crate::metrics::SyncMetrics;

/// Coarse synchronizer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Scanning for the sync pattern
    Seeking,
    /// Sync found; collecting payload and checksum
    Capturing,
}

/// Internal state. Each variant carries only the counter it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Seeking { matched: usize },
    Capturing(Capture),
}

/// Sub-stages of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Payload {
        filled: usize,
    },
    Checksum {
        collected: usize,
        bytes: [u8; CHECKSUM_SIZE],
    },
}

/// Protocol outcome reported while processing the stream.
///
/// None of these is an error: the synchronizer recovers from each of them on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A payload passed checksum validation
    Frame(Frame),

    /// A fully captured payload failed checksum validation and was discarded
    ChecksumMismatch { received: u16, calculated: u16 },

    /// The stream was finished mid-capture; the partial frame was discarded.
    /// `captured` counts payload and checksum bytes seen after the sync pattern.
    Truncated { captured: usize },
}

/// Frame synchronizer for one byte stream.
#[derive(Debug)]
pub struct FrameSynchronizer {
    format: FrameFormat,
    state: State,

    /// Capture buffer, always exactly `format.payload_len()` bytes long
    payload: Vec<u8>,

    metrics: SyncMetrics,
}

impl FrameSynchronizer {
    /// Create a synchronizer for the given frame format.
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if the payload buffer cannot be allocated.
    /// No synchronizer is returned in that case.
    pub fn new(format: FrameFormat) -> Result<Self> {
        let payload_len = format.payload_len();

        let mut payload = Vec::new();
        payload
            .try_reserve_exact(payload_len)
            .map_err(|e| Error::exhausted("payload buffer", e))?;
        payload.resize(payload_len, 0);

        Ok(Self {
            format,
            state: State::Seeking { matched: 0 },
            payload,
            metrics: SyncMetrics::new(),
        })
    }

    /// Feed one byte through the state machine.
    ///
    /// # Returns
    /// - `Some(SyncEvent::Frame(_))` when this byte completed a valid frame
    /// - `Some(SyncEvent::ChecksumMismatch { .. })` when it completed a corrupted one
    /// - `None` otherwise
    pub fn process_byte(&mut self, byte: u8) -> Option<SyncEvent> {
        self.metrics.bytes_processed += 1;

        match self.state {
            State::Seeking { matched } => {
                self.seek(matched, byte);
                None
            }

            State::Capturing(Capture::Payload { filled }) => {
                debug_assert!(filled < self.payload.len());
                self.payload[filled] = byte;

                let filled = filled + 1;
                self.state = if filled == self.payload.len() {
                    State::Capturing(Capture::Checksum {
                        collected: 0,
                        bytes: [0; CHECKSUM_SIZE],
                    })
                } else {
                    State::Capturing(Capture::Payload { filled })
                };
                None
            }

            State::Capturing(Capture::Checksum {
                collected,
                mut bytes,
            }) => {
                bytes[collected] = byte;

                let collected = collected + 1;
                if collected < CHECKSUM_SIZE {
                    self.state = State::Capturing(Capture::Checksum { collected, bytes });
                    return None;
                }

                Some(self.complete_frame(u16::from_be_bytes(bytes)))
            }
        }
    }

    /// Feed every byte of `bytes` in order, collecting the events produced.
    pub fn process_chunk(&mut self, bytes: &[u8]) -> Vec<SyncEvent> {
        bytes
            .iter()
            .filter_map(|&byte| self.process_byte(byte))
            .collect()
    }

    /// Close the stream.
    ///
    /// A capture in progress is discarded (never emitted) and reported as
    /// `SyncEvent::Truncated`. A partial sync match is simply forgotten.
    /// The synchronizer is back in `Seeking` afterwards and the end time is
    /// recorded in its metrics.
    pub fn finish(&mut self) -> Option<SyncEvent> {
        let captured = match self.state {
            State::Seeking { .. } => None,
            State::Capturing(Capture::Payload { filled }) => Some(filled),
            State::Capturing(Capture::Checksum { collected, .. }) => {
                Some(self.payload.len() + collected)
            }
        };

        self.state = State::Seeking { matched: 0 };
        self.metrics.complete();

        captured.map(|captured| {
            self.metrics.frames_truncated += 1;
            warn!(
                captured,
                wire_payload = self.payload.len() + CHECKSUM_SIZE,
                "stream ended mid-frame, discarding partial capture"
            );
            SyncEvent::Truncated { captured }
        })
    }

    /// Drop any partial match or capture and return to `Seeking`.
    pub fn reset(&mut self) {
        self.state = State::Seeking { matched: 0 };
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            State::Seeking { .. } => Mode::Seeking,
            State::Capturing(_) => Mode::Capturing,
        }
    }

    /// Sync pattern bytes matched so far; `None` while capturing.
    pub fn match_index(&self) -> Option<usize> {
        match self.state {
            State::Seeking { matched } => Some(matched),
            State::Capturing(_) => None,
        }
    }

    /// Payload bytes captured so far; `None` while seeking.
    pub fn payload_fill(&self) -> Option<usize> {
        match self.state {
            State::Seeking { .. } => None,
            State::Capturing(Capture::Payload { filled }) => Some(filled),
            State::Capturing(Capture::Checksum { .. }) => Some(self.payload.len()),
        }
    }

    /// Checksum bytes collected so far; `None` unless the payload is complete.
    pub fn checksum_fill(&self) -> Option<usize> {
        match self.state {
            State::Capturing(Capture::Checksum { collected, .. }) => Some(collected),
            _ => None,
        }
    }

    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    fn seek(&mut self, matched: usize, byte: u8) {
        let pattern = self.format.sync_pattern();
        let pattern_len = pattern.len();

        if pattern.get(matched) != Some(byte) {
            if matched > 0 {
                self.metrics.sync_losses += 1;
                trace!(matched, byte, "partial sync match lost");
            }
            self.state = State::Seeking { matched: 0 };
            return;
        }

        let matched = matched + 1;
        if matched < pattern_len {
            self.state = State::Seeking { matched };
            return;
        }

        self.payload.fill(0);
        self.state = State::Capturing(Capture::Payload { filled: 0 });
        self.metrics.syncs_acquired += 1;
        trace!(offset = self.metrics.bytes_processed, "sync acquired");
    }

    /// Validate the captured payload against `received` and return to
    /// `Seeking`.
    fn complete_frame(&mut self, received: u16) -> SyncEvent {
        let payload_len = self.format.payload_len();
        let calculated = crc16_ccitt_false(&self.payload[..payload_len]);

        self.state = State::Seeking { matched: 0 };

        if received != calculated {
            self.metrics.checksum_errors += 1;
            warn!(
                received = format_args!("{:#06x}", received),
                calculated = format_args!("{:#06x}", calculated),
                "checksum mismatch, frame discarded"
            );
            return SyncEvent::ChecksumMismatch {
                received,
                calculated,
            };
        }

        self.metrics.frames_emitted += 1;
        self.metrics.payload_bytes_emitted += payload_len as u64;
        debug!(payload_len, checksum = received, "frame emitted");

        SyncEvent::Frame(Frame::new(self.payload[..payload_len].to_vec(), received))
    }
}
