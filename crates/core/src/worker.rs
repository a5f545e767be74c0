//! Synchronizer running on a dedicated thread.
//!
//! The worker thread is the sole owner of its [`FrameSynchronizer`] for the
//! lifetime of the stream. Producers push chunks into the shared input queue
//! and consumers pull frames from the shared output queue while it runs.
//!
//! # Lifecycle
//!
//! 1. `spawn`: the thread starts polling the input queue
//! 2. Empty queue: the thread sleeps for the idle interval and polls again
//! 3. `close`: the thread drains whatever is still queued, closes the
//!    stream (discarding a partial frame), and hands the synchronizer back
//!
//! Chunks enqueued before `close` is called are always processed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::pipeline::{drain_into, DrainReport};
use crate::queue::{InputQueue, OutputQueue};
use crate::synchronizer::FrameSynchronizer;

/// Default sleep between polls of an empty input queue
pub const DEFAULT_IDLE: Duration = Duration::from_micros(100);

/// Final state handed back by [`SyncWorker::close`].
#[derive(Debug)]
pub struct WorkerSummary {
    /// The synchronizer, with its metrics, after the stream was closed
    pub synchronizer: FrameSynchronizer,

    /// Totals over every drain pass the worker made
    pub report: DrainReport,
}

type WorkerResult = Result<(FrameSynchronizer, DrainReport)>;

/// Handle to a running synchronizer thread.
pub struct SyncWorker {
    input: Arc<InputQueue>,
    output: Arc<OutputQueue>,
    closed: Arc<AtomicBool>,
    handle: Option<JoinHandle<WorkerResult>>,
}

impl SyncWorker {
    /// Move `synchronizer` onto a new thread wired to the given queues.
    pub fn spawn(
        synchronizer: FrameSynchronizer,
        input: Arc<InputQueue>,
        output: Arc<OutputQueue>,
    ) -> Result<Self> {
        Self::spawn_with_idle(synchronizer, input, output, DEFAULT_IDLE)
    }

    /// Like [`spawn`](Self::spawn) with a custom idle interval.
    pub fn spawn_with_idle(
        synchronizer: FrameSynchronizer,
        input: Arc<InputQueue>,
        output: Arc<OutputQueue>,
        idle: Duration,
    ) -> Result<Self> {
        let closed = Arc::new(AtomicBool::new(false));

        let handle = {
            let input = Arc::clone(&input);
            let output = Arc::clone(&output);
            let closed = Arc::clone(&closed);

            thread::Builder::new()
                .name("framesync-worker".to_string())
                .spawn(move || run(synchronizer, &input, &output, &closed, idle))?
        };

        debug!(idle_us = idle.as_micros() as u64, "synchronizer worker started");

        Ok(Self {
            input,
            output,
            closed,
            handle: Some(handle),
        })
    }

    /// Queue a chunk for the worker.
    pub fn push_chunk(&self, chunk: Vec<u8>) -> Result<()> {
        self.input.enqueue(chunk)
    }

    pub fn input(&self) -> &Arc<InputQueue> {
        &self.input
    }

    pub fn output(&self) -> &Arc<OutputQueue> {
        &self.output
    }

    /// Whether the thread has already exited (after `close`, or on error).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the worker after it drains the input queue, and take back the
    /// synchronizer.
    ///
    /// # Errors
    /// - `Error::ResourceExhausted` if the output queue could not grow
    /// - `Error::WorkerPanicked` if the thread panicked
    pub fn close(mut self) -> Result<WorkerSummary> {
        self.closed.store(true, Ordering::Release);

        let handle = self.handle.take().ok_or(Error::WorkerPanicked)?;
        let (synchronizer, report) = handle.join().map_err(|_| Error::WorkerPanicked)??;

        debug!(
            chunks = report.chunks,
            frames = report.frames,
            checksum_errors = report.checksum_errors,
            truncated = report.truncated,
            "synchronizer worker stopped"
        );

        Ok(WorkerSummary {
            synchronizer,
            report,
        })
    }
}

impl Drop for SyncWorker {
    // Without a join the thread would poll forever; let it wind down.
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

fn run(
    mut synchronizer: FrameSynchronizer,
    input: &InputQueue,
    output: &OutputQueue,
    closed: &AtomicBool,
    idle: Duration,
) -> WorkerResult {
    let mut total = DrainReport::default();

    loop {
        // Read the flag before draining so nothing enqueued before close is missed
        let closing = closed.load(Ordering::Acquire);

        let report = drain_into(&mut synchronizer, input, output)?;
        total.merge(report);

        if closing {
            break;
        }
        if report.chunks == 0 {
            thread::sleep(idle);
        }
    }

    if let Some(event) = synchronizer.finish() {
        total.record(&event);
    }

    Ok((synchronizer, total))
}
