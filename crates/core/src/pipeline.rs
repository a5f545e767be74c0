//! Single-threaded pipeline: input queue → synchronizer → output queue.
//!
//! ```text
//! producer --push--> [InputQueue] --drain_and_process--> FrameSynchronizer
//!                                                              |
//! consumer <--pop_frame-- [OutputQueue] <----- valid frames ---+
//! ```
//!
//! Chunk boundaries are invisible to the synchronizer: draining two chunks
//! gives exactly the same frames and state as draining their concatenation.
//!
//! The queues are held in `Arc`s so a producer or consumer on another thread
//! can share them. To move byte processing itself onto a thread, see
//! [`crate::worker::SyncWorker`].

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::framing::{Frame, FrameFormat};
use crate::queue::{InputQueue, OutputQueue, StagingQueue};
use crate::synchronizer::{FrameSynchronizer, SyncEvent};

/// What one drain pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Input chunks dequeued
    pub chunks: usize,

    /// Bytes fed through the synchronizer
    pub bytes: usize,

    /// Valid frames moved to the output queue
    pub frames: usize,

    /// Frames discarded on checksum mismatch
    pub checksum_errors: usize,

    /// Partial captures discarded when the stream was finished
    pub truncated: usize,
}

impl DrainReport {
    /// Fold one synchronizer event into the report.
    pub fn record(&mut self, event: &SyncEvent) {
        match event {
            SyncEvent::Frame(_) => self.frames += 1,
            SyncEvent::ChecksumMismatch { .. } => self.checksum_errors += 1,
            SyncEvent::Truncated { .. } => self.truncated += 1,
        }
    }

    /// Add another pass's counts to this one.
    pub fn merge(&mut self, other: DrainReport) {
        self.chunks += other.chunks;
        self.bytes += other.bytes;
        self.frames += other.frames;
        self.checksum_errors += other.checksum_errors;
        self.truncated += other.truncated;
    }
}

/// Synchronizer wired between an input and an output queue.
#[derive(Debug)]
pub struct FramePipeline {
    synchronizer: FrameSynchronizer,
    input: Arc<InputQueue>,
    output: Arc<OutputQueue>,
}

impl FramePipeline {
    /// Create a pipeline with fresh, empty queues.
    pub fn new(format: FrameFormat) -> Result<Self> {
        Ok(Self::with_queues(
            FrameSynchronizer::new(format)?,
            Arc::new(StagingQueue::new()),
            Arc::new(StagingQueue::new()),
        ))
    }

    /// Build a pipeline around an existing synchronizer and shared queues.
    pub fn with_queues(
        synchronizer: FrameSynchronizer,
        input: Arc<InputQueue>,
        output: Arc<OutputQueue>,
    ) -> Self {
        Self {
            synchronizer,
            input,
            output,
        }
    }

    /// Queue a copy of `bytes` for synchronization.
    pub fn push(&self, bytes: &[u8]) -> Result<()> {
        self.input.enqueue(bytes.to_vec())
    }

    /// Queue an owned chunk for synchronization.
    pub fn push_chunk(&self, chunk: Vec<u8>) -> Result<()> {
        self.input.enqueue(chunk)
    }

    /// Dequeue input chunks and feed every byte, in order, through the
    /// synchronizer until the input queue is empty. Valid frames land in the
    /// output queue.
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if the output queue cannot grow. The chunk
    /// being processed is still fed to its end, but frames it completes after
    /// the failure are lost. Chunks not yet dequeued stay queued.
    pub fn drain_and_process(&mut self) -> Result<DrainReport> {
        let report = drain_into(&mut self.synchronizer, &self.input, &self.output)?;

        if report.chunks > 0 {
            debug!(
                chunks = report.chunks,
                bytes = report.bytes,
                frames = report.frames,
                checksum_errors = report.checksum_errors,
                "input queue drained"
            );
        }

        Ok(report)
    }

    /// Drain remaining input, then close the stream. A partial frame left at
    /// the end is discarded and counted in `truncated`.
    pub fn finish(&mut self) -> Result<DrainReport> {
        let mut report = self.drain_and_process()?;
        if let Some(event) = self.synchronizer.finish() {
            report.record(&event);
        }
        Ok(report)
    }

    /// Take the oldest validated frame, if any.
    pub fn pop_frame(&self) -> Option<Frame> {
        self.output.dequeue()
    }

    /// Take every validated frame, oldest first.
    pub fn take_frames(&self) -> Vec<Frame> {
        self.output.drain_all()
    }

    pub fn input(&self) -> &Arc<InputQueue> {
        &self.input
    }

    pub fn output(&self) -> &Arc<OutputQueue> {
        &self.output
    }

    pub fn synchronizer(&self) -> &FrameSynchronizer {
        &self.synchronizer
    }

    pub fn into_synchronizer(self) -> FrameSynchronizer {
        self.synchronizer
    }
}

/// Drain `input` through `synchronizer`, pushing valid frames to `output`.
pub(crate) fn drain_into(
    synchronizer: &mut FrameSynchronizer,
    input: &InputQueue,
    output: &OutputQueue,
) -> Result<DrainReport> {
    let mut report = DrainReport::default();

    while let Some(chunk) = input.dequeue() {
        report.chunks += 1;
        report.bytes += chunk.len();

        feed_chunk(synchronizer, &chunk, &mut report, |frame| output.enqueue(frame))?;
    }

    Ok(report)
}

/// Feed all of `chunk` through `synchronizer`, handing valid frames to `emit`.
///
/// The chunk is always consumed to its end so the synchronizer stays aligned
/// with the stream. Once `emit` fails, later frames from the same chunk are
/// dropped and the first error is returned.
fn feed_chunk<F>(
    synchronizer: &mut FrameSynchronizer,
    chunk: &[u8],
    report: &mut DrainReport,
    mut emit: F,
) -> Result<()>
where
    F: FnMut(Frame) -> Result<()>,
{
    let mut failure = None;

    for &byte in chunk {
        if let Some(event) = synchronizer.process_byte(byte) {
            report.record(&event);
            if let SyncEvent::Frame(frame) = event {
                if failure.is_none() {
                    failure = emit(frame).err();
                }
            }
        }
    }

    failure.map_or(Ok(()), Err)
}
