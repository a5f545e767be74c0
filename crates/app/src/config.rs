//! Configuration for the framesync demo.
//!
//! Handles parsing command-line arguments and generating sensible defaults
//! (including randomized defaults that are reproducible with a seed).
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments, using intelligent defaults.
//! All defaults can be printed so runs are reproducible.

use framesync_core::channel::ChannelConfig;
use framesync_core::framing::{FrameFormat, SyncPattern, DEFAULT_PAYLOAD_LEN};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Complete configuration for a demo run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Seed for payload generation and channel impairments
    pub seed: u64,

    // === Frames ===
    /// Number of frames to transmit
    pub frame_count: usize,

    /// Sync pattern and payload length
    pub format: FrameFormat,

    // === Channel ===
    /// Noise, corruption and chunking settings
    pub channel: ChannelConfig,

    // === Behavior ===
    /// Run the synchronizer on a worker thread
    pub threaded: bool,

    /// Whether to print detailed config
    pub print_config: bool,

    /// Whether to print detailed metrics summary
    pub print_metrics: bool,
}

/// Outcome of parsing: either a config to run, or a request for help.
#[derive(Debug)]
pub enum Command {
    Run(Config),
    Help,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// If no arguments provided, generates randomized defaults using a time-based seed.
    /// If --seed is provided, uses that seed for all randomness (fully deterministic).
    pub fn from_args(args: &[String]) -> Result<Command, String> {
        let mut seed: Option<u64> = None;
        let mut frame_count: Option<usize> = None;
        let mut payload_len: Option<usize> = None;
        let mut sync: Option<SyncPattern> = None;
        let mut max_noise_gap: Option<usize> = None;
        let mut corruption_rate: Option<f64> = None;
        let mut max_chunk: Option<usize> = None;
        let mut threaded = false;
        let mut print_config = false;
        let mut print_metrics = true;

        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => seed = Some(parse_value(args.next(), "--seed", "a number")?),
                "--frames" => frame_count = Some(parse_value(args.next(), "--frames", "a number")?),
                "--payload-len" => {
                    payload_len = Some(parse_value(args.next(), "--payload-len", "a number")?)
                }
                "--sync" => {
                    let text = args.next().ok_or("--sync requires a hex pattern")?;
                    sync = Some(SyncPattern::from_hex(text).map_err(|e| e.to_string())?);
                }
                "--noise" => max_noise_gap = Some(parse_value(args.next(), "--noise", "a number")?),
                "--corruption" => {
                    let rate: f64 = parse_value(args.next(), "--corruption", "a rate")?;
                    if !(0.0..=1.0).contains(&rate) {
                        return Err(format!("--corruption must be within 0.0-1.0, got {}", rate));
                    }
                    corruption_rate = Some(rate);
                }
                "--no-corruption" => corruption_rate = Some(0.0),
                "--max-chunk" => {
                    let size: usize = parse_value(args.next(), "--max-chunk", "a number")?;
                    if size == 0 {
                        return Err("--max-chunk must be at least 1".to_string());
                    }
                    max_chunk = Some(size);
                }
                "--threaded" => threaded = true,
                "--print-config" => print_config = true,
                "--no-metrics" => print_metrics = false,
                "--help" | "-h" => return Ok(Command::Help),
                other => return Err(format!("unknown argument: {}", other)),
            }
        }

        // Determine seed (explicit or time-based)
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|t| t.as_millis() as u64)
                .unwrap_or_default()
        });

        // Generate defaults using seed
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let format = FrameFormat::with_pattern(
            sync.unwrap_or_default(),
            payload_len.unwrap_or(DEFAULT_PAYLOAD_LEN),
        )
        .map_err(|e| e.to_string())?;

        let config = Config {
            seed,
            frame_count: frame_count.unwrap_or(256),
            format,
            channel: ChannelConfig {
                max_noise_gap: max_noise_gap.unwrap_or_else(|| rng.gen_range(0..=32)),
                corruption_rate: corruption_rate.unwrap_or_else(|| {
                    // Bias toward small error rates
                    let r: f64 = rng.gen();
                    (r * r * 0.002).min(0.002) // 0-0.2% per byte, biased toward 0
                }),
                max_chunk: max_chunk.unwrap_or_else(|| rng.gen_range(1..=256)),
                seed,
            },
            threaded,
            print_config,
            print_metrics,
        };

        Ok(Command::Run(config))
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Seed: {}", self.seed);
        println!("Frames: {}", self.frame_count);
        println!("Sync pattern: {:02X?}", self.format.sync_pattern().as_bytes());
        println!("Payload: {} bytes ({} on the wire)", self.format.payload_len(), self.format.wire_len());
        println!("Synchronizer: {}", if self.threaded { "worker thread" } else { "inline" });
        println!();
        println!("=== Channel Simulation ===");
        println!("Noise gap: 0-{} bytes", self.channel.max_noise_gap);
        println!("Corruption rate: {:.4}% per byte", self.channel.corruption_rate * 100.0);
        println!("Chunk size: 1-{} bytes", self.channel.max_chunk);
        println!();
    }
}

fn parse_value<T: std::str::FromStr>(
    value: Option<&String>,
    flag: &str,
    what: &str,
) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{} requires {}", flag, what))?;
    value
        .parse()
        .map_err(|_| format!("invalid value for {}: {}", flag, value))
}

pub fn print_help() {
    println!("framesync: Recover checksummed frames from a noisy byte stream");
    println!();
    println!("USAGE:");
    println!("    framesync [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --seed <N>              Random seed for determinism");
    println!("    --frames <N>            Frames to transmit (default: 256)");
    println!();
    println!("    --payload-len <N>       Payload bytes per frame (default: 128)");
    println!("    --sync <HEX>            Sync pattern (default: AABBCCDD)");
    println!();
    println!("    --noise <N>             Max noise bytes before each frame (default: random 0-32)");
    println!("    --corruption <RATE>     Per-byte bit-flip rate 0.0-1.0 (default: random 0-0.002)");
    println!("    --no-corruption         Disable corruption (same as --corruption 0)");
    println!("    --max-chunk <N>         Max delivery chunk size (default: random 1-256)");
    println!();
    println!("    --threaded              Run the synchronizer on a worker thread");
    println!("    --print-config          Print resolved configuration");
    println!("    --no-metrics            Don't print metrics summary");
    println!("    --help, -h              Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    framesync                                  # Run with random defaults");
    println!("    framesync --seed 42                        # Deterministic run");
    println!("    framesync --sync 7E81 --payload-len 32     # Custom frame format");
    println!("    framesync --no-corruption --noise 0        # Clean channel");
    println!();
    println!("Logging is controlled with RUST_LOG (e.g. RUST_LOG=framesync_core=debug).");
}
