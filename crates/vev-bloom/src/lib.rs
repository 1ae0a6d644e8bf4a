// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target false-positive rate the sizing formula below is solved for.
const TARGET_FALSE_POSITIVE_RATE: f64 = 0.01;

#[derive(Debug, Error)]
pub enum BloomError {
    #[error("invalid hex in bit_array: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("bit_array is shorter than size/8 bytes: need {need}, have {have}")]
    Truncated { need: usize, have: usize },
}

/// Wire representation of a [`BloomFilter`]: `{size, hash_count, bit_array}`
/// with `bit_array` hex-encoded, little-endian bit-packed bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBloomFilter {
    pub size: u64,
    pub hash_count: u64,
    pub bit_array: String,
}

/// A fixed-false-positive-rate Bloom filter over 256-bit fingerprints.
///
/// Bit `i` lives in byte `i / 8`, bit position `i % 8` counting from the
/// least-significant bit of that byte (little-endian bit-packing). No
/// false negatives; false positives occur at approximately the rate the
/// filter was sized for.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    size: u64,
    hash_count: u64,
    bits: Vec<u8>,
}

impl BloomFilter {
    /// Sizes a filter for `expected_elements` insertions at a 1% false
    /// positive rate: `m = ceil(-E·ln(0.01) / ln(2)^2)`,
    /// `h = ceil((m/E)·ln 2)`.
    pub fn new(expected_elements: u64) -> Self {
        assert!(expected_elements > 0, "expected_elements must be positive");
        let e = expected_elements as f64;
        let size = (-(e * TARGET_FALSE_POSITIVE_RATE.ln()) / std::f64::consts::LN_2.powi(2)).ceil() as u64;
        let size = size.max(1);
        let hash_count = ((size as f64 / e) * std::f64::consts::LN_2).ceil() as u64;
        let hash_count = hash_count.max(1);
        Self {
            size,
            hash_count,
            bits: vec![0u8; Self::byte_len(size)],
        }
    }

    fn byte_len(size: u64) -> usize {
        ((size + 7) / 8) as usize
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn hash_count(&self) -> u64 {
        self.hash_count
    }

    fn set_bit(&mut self, index: u64) {
        let byte = (index / 8) as usize;
        let bit = (index % 8) as u32;
        self.bits[byte] |= 1 << bit;
    }

    fn bit_is_set(&self, index: u64) -> bool {
        let byte = (index / 8) as usize;
        let bit = (index % 8) as u32;
        (self.bits[byte] >> bit) & 1 == 1
    }

    fn indices(&self, item: &[u8; 32]) -> impl Iterator<Item = u64> + '_ {
        let bytes = little_endian_minimal(item);
        (0..self.hash_count).map(move |i| murmur_index(&bytes, i as u32, self.size))
    }

    /// Inserts a 256-bit fingerprint into the filter.
    pub fn add(&mut self, item: &[u8; 32]) {
        let indices: Vec<u64> = self.indices(item).collect();
        for index in indices {
            self.set_bit(index);
        }
    }

    /// Returns `true` if `item` was possibly inserted (no false negatives).
    pub fn check(&self, item: &[u8; 32]) -> bool {
        self.indices(item).all(|index| self.bit_is_set(index))
    }

    pub fn to_wire(&self) -> WireBloomFilter {
        WireBloomFilter {
            size: self.size,
            hash_count: self.hash_count,
            bit_array: hex::encode(&self.bits),
        }
    }

    /// Reconstructs a filter from its wire form. The bit length is taken
    /// from `size`, not from the (possibly padded) byte length.
    pub fn from_wire(wire: &WireBloomFilter) -> Result<Self, BloomError> {
        let bytes = hex::decode(&wire.bit_array)?;
        let need = Self::byte_len(wire.size);
        if bytes.len() < need {
            return Err(BloomError::Truncated {
                need,
                have: bytes.len(),
            });
        }
        Ok(Self {
            size: wire.size,
            hash_count: wire.hash_count,
            bits: bytes[..need].to_vec(),
        })
    }
}

/// Converts a 256-bit big-endian value to its minimal little-endian byte
/// encoding — `0` encodes as an empty slice, matching the reference
/// protocol's `item.to_bytes((item.bit_length() + 7) // 8, 'little')`.
fn little_endian_minimal(item_be: &[u8; 32]) -> Vec<u8> {
    let first_nonzero = item_be.iter().position(|&b| b != 0);
    match first_nonzero {
        None => Vec::new(),
        Some(idx) => {
            let mut be_trimmed = item_be[idx..].to_vec();
            be_trimmed.reverse();
            be_trimmed
        }
    }
}

/// MurmurHash3 x86_32 of `bytes` seeded with `seed`, reduced into `[0, m)`
/// the way Python's `mmh3.hash(...) % m` does: the 32-bit digest is
/// reinterpreted as signed, then reduced with floor (Euclidean) modulo so
/// the result is always non-negative.
fn murmur_index(bytes: &[u8], seed: u32, m: u64) -> u64 {
    let digest = murmur3::murmur3_32(&mut &bytes[..], seed).expect("reading from a slice cannot fail");
    let signed = digest as i32 as i64;
    let m = m as i64;
    (((signed % m) + m) % m) as u64
}

/// `E = Σ_{i=k..=n} C(n, i)`, the number of size-≥k subsets of n voters.
/// Computed over [`BigUint`] since this can exceed `u64` for n in the
/// high teens, then narrowed to `f64` for the sizing formulas above.
pub fn estimate_capacity(n: u64, k: u64) -> f64 {
    let mut total = BigUint::from(0u64);
    for i in k..=n {
        total += binomial(n, i);
    }
    total.to_f64().unwrap_or(f64::MAX)
}

fn binomial(n: u64, k: u64) -> BigUint {
    if k > n {
        return BigUint::from(0u64);
    }
    let k = k.min(n - k);
    let mut result = BigUint::from(1u64);
    for i in 0..k {
        result = (result * BigUint::from(n - i)) / BigUint::from(i + 1);
    }
    result
}
