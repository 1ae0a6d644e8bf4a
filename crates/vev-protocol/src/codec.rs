// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use rand::RngCore;
use vev_config::AggregationMode;
use vev_crypto::{prf, vote_label};

/// Encodes a boolean ballot into the 256-bit field element that gets XORed
/// against the masking pad. Efficient and generic variants disagree only on
/// how a "yes" vote is represented; "no" is always the zero element.
pub trait VoteCodec: Send + Sync {
    fn encode_vote(
        &self,
        k0: &[u8; 32],
        offset: u64,
        voter_index: u32,
        voter_id: &str,
        vote: bool,
        rng: &mut dyn RngCore,
    ) -> [u8; 32];
}

/// FVD: a "yes" vote is a uniformly random field element. Aggregation
/// degrades to "did anyone vote yes" since any nonzero XOR sum answers that.
pub struct EfficientCodec;

impl VoteCodec for EfficientCodec {
    fn encode_vote(
        &self,
        _k0: &[u8; 32],
        _offset: u64,
        _voter_index: u32,
        _voter_id: &str,
        vote: bool,
        rng: &mut dyn RngCore,
    ) -> [u8; 32] {
        if !vote {
            return [0u8; 32];
        }
        let mut v = [0u8; 32];
        rng.fill_bytes(&mut v);
        v
    }
}

/// GFVD: a "yes" vote is the PRF image under a label unique to this voter
/// and election offset, so the tallier's Bloom filter can test for
/// threshold-many "yes" votes without learning which voters cast them.
pub struct GenericCodec;

impl VoteCodec for GenericCodec {
    fn encode_vote(
        &self,
        k0: &[u8; 32],
        offset: u64,
        voter_index: u32,
        voter_id: &str,
        vote: bool,
        _rng: &mut dyn RngCore,
    ) -> [u8; 32] {
        if !vote {
            return [0u8; 32];
        }
        prf(k0, &vote_label(offset, voter_index, voter_id))
    }
}

pub fn codec_for(mode: AggregationMode) -> Box<dyn VoteCodec> {
    match mode {
        AggregationMode::Efficient => Box::new(EfficientCodec),
        AggregationMode::Generic => Box::new(GenericCodec),
    }
}
