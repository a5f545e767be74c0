//! framesync: demo driver for the frame synchronizer.
//!
//! Generates payloads, frames them, pushes the wire bytes through a seeded
//! noisy channel and recovers the frames again, either inline or on a
//! worker thread. Every recovered frame is checked against what was sent.

mod config;
mod input_gen;

use std::process::ExitCode;
use std::sync::Arc;

use framesync_core::{
    channel::{ChannelStats, NoisyChannel},
    metrics::SyncMetrics,
    queue::StagingQueue,
    worker::SyncWorker,
    Frame, FramePipeline, FrameSynchronizer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config};

const DEFAULT_LOG_FILTER: &str = "warn,framesync_core=error,framesync=info";

/// Everything a run produced.
struct Outcome {
    seed: u64,
    metrics: SyncMetrics,
    channel: ChannelStats,
    sent: usize,
    verification: Verification,
}

/// How recovered frames line up with sent payloads.
#[derive(Debug, Default, PartialEq, Eq)]
struct Verification {
    /// Frames found, in order, among the sent payloads
    matched: usize,

    /// Frames that were never sent (or arrived out of order)
    unexpected: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            config::print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run with --help for usage");
            return ExitCode::from(2);
        }
    };

    if config.print_config {
        config.print();
    }

    match run(&config) {
        Ok(outcome) => {
            if config.print_metrics {
                println!("{}", outcome.metrics);
                print_channel(&outcome.channel);
            }
            print_result(&outcome)
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> framesync_core::Result<Outcome> {
    let format = &config.format;

    // Allocate before generating anything, so an oversized format fails cleanly
    let synchronizer = FrameSynchronizer::new(format.clone())?;

    let payloads = input_gen::generate_payloads(
        config.seed,
        config.frame_count,
        format.payload_len(),
        format.sync_pattern(),
    );

    let mut channel = NoisyChannel::new(config.channel, format.sync_pattern());
    for payload in &payloads {
        channel.transmit(&format.encode(payload)?);
    }
    let chunks = channel.take_chunks();

    info!(
        seed = config.seed,
        frames = payloads.len(),
        chunks = chunks.len(),
        noise_bytes = channel.stats().noise_bytes,
        corrupted = channel.stats().frames_corrupted,
        threaded = config.threaded,
        "stream prepared"
    );

    let (frames, metrics) = if config.threaded {
        recover_threaded(synchronizer, chunks)?
    } else {
        recover_inline(synchronizer, chunks)?
    };

    let verification = verify(&payloads, &frames);
    info!(
        recovered = frames.len(),
        matched = verification.matched,
        unexpected = verification.unexpected,
        "stream recovered"
    );

    Ok(Outcome {
        seed: config.seed,
        metrics,
        channel: channel.stats(),
        sent: payloads.len(),
        verification,
    })
}

/// Push every chunk, then drain once on the calling thread.
fn recover_inline(
    synchronizer: FrameSynchronizer,
    chunks: Vec<Vec<u8>>,
) -> framesync_core::Result<(Vec<Frame>, SyncMetrics)> {
    let mut pipeline = FramePipeline::with_queues(
        synchronizer,
        Arc::new(StagingQueue::new()),
        Arc::new(StagingQueue::new()),
    );

    for chunk in chunks {
        pipeline.push_chunk(chunk)?;
    }
    pipeline.finish()?;

    let frames = pipeline.take_frames();
    Ok((frames, *pipeline.synchronizer().metrics()))
}

/// Feed chunks to a worker thread, collecting frames while it runs.
fn recover_threaded(
    synchronizer: FrameSynchronizer,
    chunks: Vec<Vec<u8>>,
) -> framesync_core::Result<(Vec<Frame>, SyncMetrics)> {
    let worker = SyncWorker::spawn(
        synchronizer,
        Arc::new(StagingQueue::new()),
        Arc::new(StagingQueue::new()),
    )?;
    let output = Arc::clone(worker.output());

    let mut frames = Vec::new();
    for chunk in chunks {
        worker.push_chunk(chunk)?;
        frames.extend(output.drain_all());
    }

    let summary = worker.close()?;
    frames.extend(output.drain_all());

    Ok((frames, *summary.synchronizer.metrics()))
}

/// Match recovered frames against sent payloads, in order.
fn verify(sent: &[Vec<u8>], received: &[Frame]) -> Verification {
    let mut verification = Verification::default();
    let mut next = 0;

    for frame in received {
        match sent[next..].iter().position(|p| p.as_slice() == frame.payload()) {
            Some(offset) => {
                verification.matched += 1;
                next += offset + 1;
            }
            None => verification.unexpected += 1,
        }
    }

    verification
}

fn print_channel(stats: &ChannelStats) {
    println!("=== Channel ===");
    println!("Frames sent: {}", stats.frames_sent);
    println!(
        "Frames corrupted: {} ({:.2}%)",
        stats.frames_corrupted,
        stats.frame_corruption_rate() * 100.0
    );
    println!("Bytes corrupted: {}", stats.bytes_corrupted);
    println!("Noise bytes: {}", stats.noise_bytes);
    println!();
}

fn print_result(outcome: &Outcome) -> ExitCode {
    println!("{}", result_line(outcome));

    if outcome.verification.unexpected > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// One-line verdict; carries the seed so any run can be replayed.
fn result_line(outcome: &Outcome) -> String {
    let Verification { matched, unexpected } = outcome.verification;
    let seed = outcome.seed;

    if unexpected > 0 {
        format!(
            "✗ FAILURE: {} frame(s) recovered that were never sent ({} of {} matched, seed {})",
            unexpected, matched, outcome.sent, seed
        )
    } else if matched == outcome.sent {
        format!("✓ SUCCESS: all {} frames recovered (seed {})", matched, seed)
    } else {
        format!(
            "✓ SUCCESS: {} of {} frames recovered, {} lost to channel errors (seed {})",
            matched,
            outcome.sent,
            outcome.sent - matched,
            seed
        )
    }
}
