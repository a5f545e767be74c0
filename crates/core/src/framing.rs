//! Frame format: sync pattern, fixed-length payload, CRC-16 trailer.
//!
//! A frame is located in a byte stream by its sync pattern and carries a
//! payload whose length is fixed per [`FrameFormat`]:
//!
//! # Frame Format
//!
//! ```text
//! +---------------------+
//! | Sync pattern (N)    |  e.g. 0xAA 0xBB 0xCC 0xDD
//! +---------------------+
//! | Payload (L)         |  opaque application bytes
//! |                     |
//! +---------------------+
//! | Checksum (2)        |  u16 big-endian CRC-16/CCITT-FALSE
//! +---------------------+
//! ```
//!
//! # CRC Coverage
//!
//! The checksum covers exactly the L payload bytes. The sync pattern is not
//! part of it.
//!
//! Streaming recovery of frames lives in [`crate::synchronizer`]. This module
//! holds the format itself plus one-shot [`FrameFormat::encode`] and
//! [`FrameFormat::decode`] for whole frames.

use crate::crc::crc16_ccitt_false;
use crate::error::{ConfigError, Error, FramingError, Result};

/// Size of the checksum trailer in bytes
pub const CHECKSUM_SIZE: usize = 2;

/// Sync pattern used when no other is configured
pub const DEFAULT_SYNC_PATTERN: [u8; 4] = [0xAA, 0xBB, 0xCC, 0xDD];

/// Payload length used when no other is configured
pub const DEFAULT_PAYLOAD_LEN: usize = 128;

/// Non-empty byte sequence that marks the start of a frame.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncPattern {
    bytes: Box<[u8]>,
}

impl SyncPattern {
    /// Build a sync pattern from raw bytes.
    ///
    /// # Errors
    /// - `ConfigError::EmptySyncPattern` if `bytes` is empty
    /// - `Error::ResourceExhausted` if the pattern cannot be allocated
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ConfigError::EmptySyncPattern.into());
        }

        let mut owned = Vec::new();
        owned
            .try_reserve_exact(bytes.len())
            .map_err(|e| Error::exhausted("sync pattern", e))?;
        owned.extend_from_slice(bytes);

        Ok(Self {
            bytes: owned.into_boxed_slice(),
        })
    }

    /// Parse a sync pattern from hex text such as `AABBCCDD`, `0xAABBCCDD`
    /// or `aa:bb:cc:dd`. Separators `:`, `-`, `_` and spaces are ignored.
    pub fn from_hex(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let trimmed = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let digits: Vec<u8> = trimmed
            .bytes()
            .filter(|b| !matches!(b, b':' | b'-' | b'_' | b' '))
            .collect();

        if digits.is_empty() {
            return Err(ConfigError::EmptySyncPattern.into());
        }
        if digits.len() % 2 != 0 {
            return Err(ConfigError::InvalidSyncHex(text.to_string()).into());
        }

        let mut bytes = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks(2) {
            let high = hex_value(pair[0]);
            let low = hex_value(pair[1]);
            match (high, low) {
                (Some(high), Some(low)) => bytes.push((high << 4) | low),
                _ => return Err(ConfigError::InvalidSyncHex(text.to_string()).into()),
            }
        }

        Self::new(&bytes)
    }

    /// Pattern length N (always at least 1).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Pattern byte at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// The pattern bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for SyncPattern {
    fn default() -> Self {
        Self {
            bytes: Box::from(&DEFAULT_SYNC_PATTERN[..]),
        }
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Sync pattern plus payload length: everything needed to frame a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFormat {
    sync: SyncPattern,
    payload_len: usize,
    wire_len: usize,
}

impl FrameFormat {
    /// Build a frame format.
    ///
    /// # Errors
    /// - `ConfigError::EmptySyncPattern` if `sync` is empty
    /// - `ConfigError::ZeroPayloadLength` if `payload_len` is 0
    /// - `ConfigError::FrameTooLong` if the wire length does not fit in `usize`
    pub fn new(sync: &[u8], payload_len: usize) -> Result<Self> {
        let sync = SyncPattern::new(sync)?;
        Self::with_pattern(sync, payload_len)
    }

    /// Build a frame format from an already validated pattern.
    pub fn with_pattern(sync: SyncPattern, payload_len: usize) -> Result<Self> {
        if payload_len == 0 {
            return Err(ConfigError::ZeroPayloadLength.into());
        }

        let wire_len = sync
            .len()
            .checked_add(payload_len)
            .and_then(|len| len.checked_add(CHECKSUM_SIZE))
            .ok_or(ConfigError::FrameTooLong {
                sync_len: sync.len(),
                payload_len,
            })?;

        Ok(Self {
            sync,
            payload_len,
            wire_len,
        })
    }

    pub fn sync_pattern(&self) -> &SyncPattern {
        &self.sync
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Total bytes one frame occupies on the wire: N + L + 2.
    pub fn wire_len(&self) -> usize {
        self.wire_len
    }

    /// Serialize a payload into wire bytes.
    ///
    /// # Errors
    /// `FramingError::PayloadLengthMismatch` if `payload` is not exactly L bytes.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() != self.payload_len {
            return Err(FramingError::PayloadLengthMismatch {
                expected: self.payload_len,
                actual: payload.len(),
            }
            .into());
        }

        let checksum = crc16_ccitt_false(payload);

        let mut wire = Vec::with_capacity(self.wire_len());
        wire.extend_from_slice(self.sync.as_bytes());
        wire.extend_from_slice(payload);
        wire.extend_from_slice(&checksum.to_be_bytes());

        Ok(wire)
    }

    /// Parse exactly one complete wire frame.
    ///
    /// # Errors
    /// - `FramingError::FrameLength` if `bytes` is not exactly [`wire_len`](Self::wire_len) long
    /// - `FramingError::InvalidSync` if the leading bytes are not the sync pattern
    /// - `Error::Checksum` if the trailer does not match the payload
    pub fn decode(&self, bytes: &[u8]) -> Result<Frame> {
        if bytes.len() != self.wire_len() {
            return Err(FramingError::FrameLength {
                expected: self.wire_len(),
                actual: bytes.len(),
            }
            .into());
        }

        let sync_len = self.sync.len();
        let payload_end = sync_len + self.payload_len;

        let sync = &bytes[..sync_len];
        if sync != self.sync.as_bytes() {
            return Err(FramingError::InvalidSync {
                expected: self.sync.as_bytes().to_vec(),
                actual: sync.to_vec(),
            }
            .into());
        }

        let payload = &bytes[sync_len..payload_end];
        let received = u16::from_be_bytes([bytes[payload_end], bytes[payload_end + 1]]);
        let calculated = crc16_ccitt_false(payload);

        if received != calculated {
            return Err(Error::Checksum {
                received,
                calculated,
            });
        }

        Ok(Frame::new(payload.to_vec(), received))
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self {
            sync: SyncPattern::default(),
            payload_len: DEFAULT_PAYLOAD_LEN,
            wire_len: DEFAULT_SYNC_PATTERN.len() + DEFAULT_PAYLOAD_LEN + CHECKSUM_SIZE,
        }
    }
}

/// A payload whose checksum has been verified.
///
/// Frames are owned copies; they never alias the synchronizer's capture buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
    checksum: u16,
}

impl Frame {
    pub(crate) fn new(payload: Vec<u8>, checksum: u16) -> Self {
        Self { payload, checksum }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The checksum the payload was verified against.
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
