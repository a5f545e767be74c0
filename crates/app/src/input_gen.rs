//! Payload generation for demo runs.
//!
//! Generates fixed-length payloads with a mix of content, so the stream the
//! synchronizer sees is not uniformly random:
//! - Runs of a single byte (including runs of the sync lead byte)
//! - Text-like data from a small alphabet
//! - Repeating short patterns, sometimes embedding the sync pattern itself
//! - Random bytes
//!
//! Every payload carries its sequence number in the first bytes so that
//! distinct frames never compare equal.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use framesync_core::framing::SyncPattern;

/// Generate `count` payloads of exactly `len` bytes each.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `sync`: sync pattern, occasionally embedded in payloads
pub fn generate_payloads(seed: u64, count: usize, len: usize, sync: &SyncPattern) -> Vec<Vec<u8>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..count)
        .map(|index| generate_payload(&mut rng, index as u64, len, sync))
        .collect()
}

fn generate_payload(rng: &mut ChaCha8Rng, sequence: u64, len: usize, sync: &SyncPattern) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);

    let tag = sequence.to_be_bytes();
    let tag_len = tag.len().min(len);
    data.extend_from_slice(&tag[tag.len() - tag_len..]);

    let remaining = len - tag_len;
    let chunk_type: u8 = rng.gen_range(0..10);

    match chunk_type {
        // 30% runs of one byte
        0..=2 => {
            let byte_value: u8 = if rng.gen_bool(0.25) {
                sync.get(0).unwrap_or_default()
            } else {
                rng.gen()
            };
            data.extend(std::iter::repeat(byte_value).take(remaining));
        }

        // 30% text-like
        3..=5 => {
            let alphabet = b"abcdefghijklmnopqrstuvwxyz .!,\n";
            for _ in 0..remaining {
                let idx = rng.gen_range(0..alphabet.len());
                data.push(alphabet[idx]);
            }
        }

        // 20% repeating patterns
        6..=7 => {
            let pattern = if rng.gen_bool(0.5) {
                sync.as_bytes().to_vec()
            } else {
                generate_pattern(rng)
            };
            data.extend(pattern.iter().copied().cycle().take(remaining));
        }

        // 20% random bytes
        _ => {
            for _ in 0..remaining {
                data.push(rng.gen());
            }
        }
    }

    data
}

/// Generate a random short pattern for structured content.
fn generate_pattern(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let len = rng.gen_range(2..=16);
    (0..len).map(|_| rng.gen()).collect()
}
