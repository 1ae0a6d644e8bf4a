// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use vev_bloom::{estimate_capacity, BloomFilter};
use vev_crypto::{prf, vote_label};

use crate::xor::xor256;

/// Builds the generic-variant Bloom filter: the set of XOR-folds of every
/// size-≥k subset of the n voters' canonical "yes" PRF images, sized for a
/// 1% false-positive rate over `E = Σ_{i=k..n} C(n,i)` expected elements.
///
/// This is a pure function of the election parameters — it needs no actual
/// ballots, only `k0`, `offset`, `n` and `k` — so any participant holding
/// `k0` can build it independently. Voter indices' canonical images use the
/// `"voter{j}"` label regardless of the real `voterId` a participant was
/// constructed with; driver code must assign voter ids following that
/// convention for the tallier's Bloom check to agree with what voters
/// actually encoded.
///
/// Enumerates subsets via an `n`-bit mask, so this is only tractable for
/// small `n` (a few dozen at most) — the same brute-force approach the
/// reference protocol takes.
pub fn build_generic_bloom(k0: &[u8; 32], offset: u64, n: u32, k: u32) -> BloomFilter {
    assert!(n <= 31, "subset enumeration requires n <= 31");

    let images: Vec<[u8; 32]> = (0..n)
        .map(|j| prf(k0, &vote_label(offset, j, &format!("voter{j}"))))
        .collect();

    let expected = estimate_capacity(n as u64, k as u64).ceil().max(1.0);
    let mut bf = BloomFilter::new(expected as u64);

    for mask in 1u32..(1u32 << n) {
        if mask.count_ones() < k {
            continue;
        }
        let folded = (0..n)
            .filter(|j| mask & (1 << j) != 0)
            .fold([0u8; 32], |acc, j| xor256(acc, images[j as usize]));
        bf.add(&folded);
    }

    bf
}
