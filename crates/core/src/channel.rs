//! Noisy byte-stream channel with seeded impairments.
//!
//! Stands in for a real transport (serial line, radio link) when exercising
//! the synchronizer. All effects are reproducible given the same seed.
//!
//! # Simulated Effects
//!
//! - **Noise gaps**: random garbage bytes before each frame (uniform
//!   `0..=max_noise_gap`). Noise never contains the first sync byte, so it
//!   can never start a false sync match on its own.
//! - **Corruption**: each transmitted frame byte has one random bit flipped
//!   with probability `corruption_rate` (Bernoulli per byte).
//! - **Chunking**: the stream is delivered in random-size chunks
//!   (uniform `1..=max_chunk`), so frames straddle chunk boundaries.
//!
//! # Determinism
//!
//! All randomness comes from a seeded ChaCha8 RNG. Given the same seed and
//! inputs, outputs are bit-identical.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::framing::SyncPattern;

/// Configuration for channel simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    /// Maximum noise bytes inserted before each frame
    pub max_noise_gap: usize,

    /// Per-byte bit-flip probability [0.0, 1.0]
    pub corruption_rate: f64,

    /// Largest chunk handed out by `take_chunks` (at least 1)
    pub max_chunk: usize,

    /// Random seed for determinism
    pub seed: u64,
}

impl ChannelConfig {
    /// No noise and no corruption; only chunking.
    pub fn clean(seed: u64) -> Self {
        Self {
            max_noise_gap: 0,
            corruption_rate: 0.0,
            max_chunk: 64,
            seed,
        }
    }

    /// Moderate impairments: short noise gaps and occasional bit errors.
    pub fn default_with_seed(seed: u64) -> Self {
        Self {
            max_noise_gap: 16,
            corruption_rate: 0.0005,
            max_chunk: 64,
            seed,
        }
    }
}

/// Byte-stream channel implementing noise, corruption and chunking.
///
/// # Thread Safety
/// Not thread-safe; use one instance per thread.
pub struct NoisyChannel {
    config: ChannelConfig,
    rng: ChaCha8Rng,

    /// First sync byte; never emitted as noise
    sync_lead: u8,

    /// Bytes transmitted but not yet taken
    buffer: Vec<u8>,

    // Statistics
    frames_sent: u64,
    frames_corrupted: u64,
    bytes_corrupted: u64,
    noise_bytes: u64,
}

impl NoisyChannel {
    /// Create a channel for frames that start with `sync`.
    pub fn new(config: ChannelConfig, sync: &SyncPattern) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            sync_lead: sync.get(0).unwrap_or_default(),
            buffer: Vec::new(),
            frames_sent: 0,
            frames_corrupted: 0,
            bytes_corrupted: 0,
            noise_bytes: 0,
        }
    }

    /// Send one wire frame, preceded by a random noise gap.
    ///
    /// # Side Effects
    /// Bytes of the frame may be corrupted on the way into the buffer.
    pub fn transmit(&mut self, wire: &[u8]) {
        self.frames_sent += 1;

        if self.config.max_noise_gap > 0 {
            let gap = self.rng.gen_range(0..=self.config.max_noise_gap);
            self.inject_noise(gap);
        }

        let mut corrupted = false;
        self.buffer.reserve(wire.len());

        for &byte in wire {
            let mut byte = byte;
            if self.config.corruption_rate > 0.0 {
                let roll: f64 = self.rng.gen();
                if roll < self.config.corruption_rate {
                    let bit: u32 = self.rng.gen_range(0..8);
                    byte ^= 1u8 << bit;
                    self.bytes_corrupted += 1;
                    corrupted = true;
                }
            }
            self.buffer.push(byte);
        }

        if corrupted {
            self.frames_corrupted += 1;
        }
    }

    /// Append `count` noise bytes to the stream.
    pub fn inject_noise(&mut self, count: usize) {
        self.buffer.reserve(count);

        for _ in 0..count {
            let mut byte: u8 = self.rng.gen();
            if byte == self.sync_lead {
                byte = byte.wrapping_add(1);
            }
            self.buffer.push(byte);
        }

        self.noise_bytes += count as u64;
    }

    /// Append bytes verbatim, bypassing noise and corruption.
    pub fn transmit_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Take everything buffered, split into random-size chunks.
    pub fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        let stream = std::mem::take(&mut self.buffer);
        let max_chunk = self.config.max_chunk.max(1);

        let mut chunks = Vec::new();
        let mut rest = &stream[..];
        while !rest.is_empty() {
            let size = self.rng.gen_range(1..=max_chunk).min(rest.len());
            let (chunk, tail) = rest.split_at(size);
            chunks.push(chunk.to_vec());
            rest = tail;
        }

        chunks
    }

    /// Take everything buffered as one contiguous stream.
    pub fn take_stream(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Bytes transmitted but not yet taken.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Get statistics about channel behavior.
    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            frames_sent: self.frames_sent,
            frames_corrupted: self.frames_corrupted,
            bytes_corrupted: self.bytes_corrupted,
            noise_bytes: self.noise_bytes,
        }
    }
}

/// Statistics about channel behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Frames handed to `transmit`
    pub frames_sent: u64,

    /// Frames with at least one flipped bit
    pub frames_corrupted: u64,

    /// Individual bytes with a flipped bit
    pub bytes_corrupted: u64,

    /// Garbage bytes inserted between frames
    pub noise_bytes: u64,
}

impl ChannelStats {
    /// Fraction of frames that were corrupted.
    pub fn frame_corruption_rate(&self) -> f64 {
        if self.frames_sent == 0 {
            0.0
        } else {
            self.frames_corrupted as f64 / self.frames_sent as f64
        }
    }

    /// Frames that went through untouched.
    pub fn frames_intact(&self) -> u64 {
        self.frames_sent - self.frames_corrupted
    }
}
