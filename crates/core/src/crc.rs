//! CRC-16/CCITT-FALSE checksum engine.
//!
//! Parameters: polynomial `0x1021`, initial register `0xFFFF`, MSB-first
//! (left-shifting register), no input/output reflection, no final XOR.
//! Any peer producing or verifying frames must use exactly this variant.
//!
//! # Usage
//!
//! ```
//! use framesync_core::crc::{crc16_ccitt_false, Crc16};
//!
//! assert_eq!(crc16_ccitt_false(b"123456789"), 0x29B1);
//!
//! let mut hasher = Crc16::new();
//! hasher.update(b"1234");
//! hasher.update(b"56789");
//! assert_eq!(hasher.finalize(), 0x29B1);
//! ```

/// Generator polynomial (x^16 + x^12 + x^5 + 1).
pub const POLYNOMIAL: u16 = 0x1021;

/// Initial register value.
pub const INITIAL: u16 = 0xFFFF;

/// Incremental CRC-16 hasher.
///
/// Feeding the same bytes in any slicing yields the same checksum as
/// [`crc16_ccitt_false`] over the concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    register: u16,
}

impl Crc16 {
    /// Create a hasher with the register at its initial value.
    pub fn new() -> Self {
        Self { register: INITIAL }
    }

    /// Fold `data` into the register.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.register ^= (byte as u16) << 8;

            for _ in 0..8 {
                if self.register & 0x8000 != 0 {
                    self.register = (self.register << 1) ^ POLYNOMIAL;
                } else {
                    self.register <<= 1;
                }
            }
        }
    }

    /// Current checksum value.
    pub fn finalize(self) -> u16 {
        self.register
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the CRC-16/CCITT-FALSE checksum of `data`.
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    let mut hasher = Crc16::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Table-driven implementation used as an independent reference.
    fn reference_crc(data: &[u8]) -> u16 {
        let mut table = [0u16; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut value = (i as u16) << 8;
            for _ in 0..8 {
                value = if value & 0x8000 != 0 {
                    (value << 1) ^ 0x1021
                } else {
                    value << 1
                };
            }
            *entry = value;
        }

        data.iter().fold(0xFFFF, |crc: u16, &byte| {
            let index = ((crc >> 8) as u8 ^ byte) as usize;
            (crc << 8) ^ table[index]
        })
    }

    #[test]
    fn test_check_value() {
        assert_eq!(crc16_ccitt_false(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_empty_input_is_initial_register() {
        assert_eq!(crc16_ccitt_false(&[]), INITIAL);
    }

    #[test]
    fn test_matches_table_reference() {
        let inputs: [&[u8]; 5] = [
            b"A",
            b"hello world",
            &[0x00; 16],
            &[0xFF; 33],
            &[0xAA, 0xBB, 0xCC, 0xDD, 0x01, 0x02, 0x03, 0x04],
        ];

        for input in inputs {
            assert_eq!(crc16_ccitt_false(input), reference_crc(input), "input {:02x?}", input);
        }
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data: Vec<u8> = (0..=255).collect();

        for split in [0, 1, 7, 128, 255, 256] {
            let mut hasher = Crc16::new();
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            assert_eq!(hasher.finalize(), crc16_ccitt_false(&data));
        }
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let data = b"The quick brown fox jumps over the lazy dog".to_vec();
        let original = crc16_ccitt_false(&data);

        for i in 0..data.len() {
            for bit in 0..8 {
                let mut corrupted = data.clone();
                corrupted[i] ^= 1 << bit;
                assert_ne!(crc16_ccitt_false(&corrupted), original);
            }
        }
    }
}
