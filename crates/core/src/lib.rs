//! framesync-core: recover integrity-checked frames from a raw byte stream
//!
//! This library provides the core components of a link-layer frame
//! synchronizer that:
//! - Scans a continuous byte stream for a fixed sync pattern
//! - Captures the fixed-length payload that follows it
//! - Verifies the payload against a trailing CRC-16/CCITT-FALSE checksum
//! - Emits valid frames, discards corrupted ones and resynchronizes
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `crc`: CRC-16/CCITT-FALSE checksum engine
//! - `framing`: Sync pattern, frame format, one-shot encode/decode
//! - `synchronizer`: Byte-at-a-time state machine
//! - `queue`: FIFO staging queues for chunks and frames
//! - `pipeline`: Input queue → synchronizer → output queue glue
//! - `worker`: Synchronizer on a dedicated thread
//! - `channel`: Seeded noisy-channel simulator for tests and demos
//! - `metrics`: Observable synchronizer behavior
//!
//! # Design Principles
//!
//! - **No panics**: Construction errors are structured; stream events are values
//! - **Never halts**: A corrupted frame is reported and skipped, never fatal
//! - **No globals**: Every stream owns its own synchronizer
//! - **Deterministic**: Seeded randomness makes simulated runs reproducible

pub mod channel;
pub mod crc;
pub mod error;
pub mod framing;
pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod synchronizer;
pub mod worker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use framing::{Frame, FrameFormat, SyncPattern};
pub use pipeline::{DrainReport, FramePipeline};
pub use synchronizer::{FrameSynchronizer, Mode, SyncEvent};
