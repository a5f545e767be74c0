//! Error types for the framesync system.
//!
//! Only construction and resource failures are errors. Protocol events seen
//! while processing a stream (a broken partial sync match, a checksum
//! mismatch, a truncated capture) are reported as [`SyncEvent`]s instead, so
//! a single corrupted frame never halts the stream.
//!
//! [`SyncEvent`]: crate::synchronizer::SyncEvent

use std::collections::TryReserveError;
use thiserror::Error;

/// Top-level error type for all operations in the system.
///
/// Each variant corresponds to a specific failure domain:
/// - Config: invalid sync pattern or payload length
/// - Framing: encoding or one-shot decoding of a wire frame
/// - Checksum: one-shot decode found a corrupted payload
/// - Resource: a buffer or queue could not grow
/// - Worker: the synchronizer thread could not start or panicked
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid frame format configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Wire frame could not be encoded or decoded
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Received checksum does not match the one computed over the payload
    #[error("checksum mismatch: received {received:#06x}, calculated {calculated:#06x}")]
    Checksum { received: u16, calculated: u16 },

    /// Allocation for a payload buffer or queue entry failed
    #[error("failed to allocate {what}: {source}")]
    ResourceExhausted {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    /// Spawning the synchronizer worker thread failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The synchronizer worker thread panicked before handing its state back
    #[error("synchronizer worker panicked")]
    WorkerPanicked,
}

/// Frame format configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A sync pattern needs at least one byte
    #[error("sync pattern must not be empty")]
    EmptySyncPattern,

    /// A frame needs at least one payload byte
    #[error("payload length must be at least 1 byte")]
    ZeroPayloadLength,

    /// Sync pattern, payload and checksum together exceed `usize::MAX` bytes
    #[error("frame too long: {sync_len}-byte sync plus {payload_len}-byte payload overflows")]
    FrameTooLong { sync_len: usize, payload_len: usize },

    /// Sync pattern text is not an even-length run of hex digits
    #[error("invalid sync pattern hex: {0:?}")]
    InvalidSyncHex(String),
}

/// Wire frame errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Payload handed to the encoder has the wrong length
    #[error("payload length mismatch: format says {expected}, got {actual}")]
    PayloadLengthMismatch { expected: usize, actual: usize },

    /// Buffer handed to the one-shot decoder is not exactly one frame long
    #[error("frame length mismatch: need exactly {expected} bytes, got {actual}")]
    FrameLength { expected: usize, actual: usize },

    /// Leading bytes do not match the configured sync pattern
    #[error("invalid sync pattern: expected {expected:02x?}, got {actual:02x?}")]
    InvalidSync { expected: Vec<u8>, actual: Vec<u8> },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an allocation failure for the named resource.
    pub(crate) fn exhausted(what: &'static str, source: TryReserveError) -> Self {
        Error::ResourceExhausted { what, source }
    }
}
