// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use vev_bloom::BloomFilter;
use vev_config::AggregationMode;

/// Derives the final 0/1 verdict from the XOR fold of every surviving
/// contribution. Efficient and generic variants disagree only in how that
/// fold is interpreted.
pub trait VerdictStrategy: Send + Sync {
    fn finalize(&self, xor: [u8; 32], bloom: Option<&BloomFilter>) -> u8;
}

/// FVD: any nonzero fold means at least one "yes".
pub struct EfficientVerdict;

impl VerdictStrategy for EfficientVerdict {
    fn finalize(&self, xor: [u8; 32], _bloom: Option<&BloomFilter>) -> u8 {
        if xor == [0u8; 32] {
            0
        } else {
            1
        }
    }
}

/// GFVD: membership of the fold in the final voter's Bloom filter over
/// every size-≥k "yes" subset.
pub struct GenericVerdict;

impl VerdictStrategy for GenericVerdict {
    fn finalize(&self, xor: [u8; 32], bloom: Option<&BloomFilter>) -> u8 {
        match bloom {
            Some(bf) => bf.check(&xor) as u8,
            None => {
                tracing::error!("generic verdict requested with no Bloom filter installed");
                0
            }
        }
    }
}

pub fn verdict_for(mode: AggregationMode) -> Box<dyn VerdictStrategy> {
    match mode {
        AggregationMode::Efficient => Box::new(EfficientVerdict),
        AggregationMode::Generic => Box::new(GenericVerdict),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficient_zero_fold_is_no() {
        assert_eq!(EfficientVerdict.finalize([0u8; 32], None), 0);
    }

    #[test]
    fn efficient_nonzero_fold_is_yes() {
        let mut xor = [0u8; 32];
        xor[31] = 1;
        assert_eq!(EfficientVerdict.finalize(xor, None), 1);
    }

    #[test]
    fn generic_checks_bloom_membership() {
        let mut bf = BloomFilter::new(10);
        let mut item = [0u8; 32];
        item[31] = 42;
        bf.add(&item);
        assert_eq!(GenericVerdict.finalize(item, Some(&bf)), 1);

        let mut absent = [0u8; 32];
        absent[31] = 99;
        // Not a strict guarantee (false positives exist) but with this few
        // insertions collisions at this size are astronomically unlikely.
        assert_eq!(GenericVerdict.finalize(absent, Some(&bf)), 0);
    }

    #[test]
    fn generic_with_no_bloom_defaults_to_no() {
        assert_eq!(GenericVerdict.finalize([1u8; 32], None), 0);
    }
}
