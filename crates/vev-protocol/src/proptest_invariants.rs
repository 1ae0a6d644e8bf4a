// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Property tests for the efficient and generic variants' correctness
//! invariants, simulated without any network I/O. Masking pads cancel in
//! the aggregate fold no matter how they were distributed among voters, so
//! folding every voter's codec-encoded image directly is equivalent to what
//! the tallier computes from the wire — this lets the property tests probe
//! the codec/verdict/Bloom pipeline directly instead of spinning up sockets.

use proptest::collection::vec as pvec;
use proptest::prelude::*;
use rand::thread_rng;

use vev_config::AggregationMode;

use crate::codec::codec_for;
use crate::generic_bloom::build_generic_bloom;
use crate::verdict::verdict_for;
use crate::xor::xor_fold;

fn fold_encoded(mode: AggregationMode, k0: &[u8; 32], offset: u64, votes: &[bool]) -> [u8; 32] {
    let codec = codec_for(mode);
    let mut rng = thread_rng();
    let encoded: Vec<[u8; 32]> = votes
        .iter()
        .enumerate()
        .map(|(i, &v)| codec.encode_vote(k0, offset, i as u32, &format!("voter{i}"), v, &mut rng))
        .collect();
    xor_fold(encoded)
}

proptest! {
    // Invariant 2: the efficient variant's verdict is 1 iff at least one
    // voter cast "yes" - a plain OR over the whole electorate. A "yes"
    // encodes to a fresh random field element each time, so the only way
    // this could fail is an accidental XOR cancellation among independently
    // drawn 256-bit values - negligible at any proptest sample size.
    #[test]
    fn invariant2_efficient_verdict_matches_any_yes(
        votes in pvec(any::<bool>(), 2..16),
        k0 in any::<[u8; 32]>(),
        offset in any::<u64>(),
    ) {
        let fold = fold_encoded(AggregationMode::Efficient, &k0, offset, &votes);
        let verdict = verdict_for(AggregationMode::Efficient).finalize(fold, None);
        let expected = votes.iter().any(|v| *v) as u8;
        prop_assert_eq!(verdict, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // Invariant 3: the generic variant's verdict is 1 iff at least k voters
    // cast "yes", for every k in [1, n]. Subset enumeration is exponential
    // in n, so this keeps n and the case count small rather than relying on
    // the crate's default sample size.
    #[test]
    fn invariant3_generic_verdict_matches_threshold(
        votes in pvec(any::<bool>(), 2..10),
        k0 in any::<[u8; 32]>(),
        offset in any::<u64>(),
        k_seed in any::<u32>(),
    ) {
        let n = votes.len() as u32;
        let k = 1 + (k_seed % n);

        let fold = fold_encoded(AggregationMode::Generic, &k0, offset, &votes);
        let bf = build_generic_bloom(&k0, offset, n, k);
        let verdict = verdict_for(AggregationMode::Generic).finalize(fold, Some(&bf));

        let yes_count = votes.iter().filter(|v| **v).count() as u32;
        let expected = (yes_count >= k) as u8;
        prop_assert_eq!(verdict, expected);
    }
}
