// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use sha2::{Digest, Sha256};

/// Keyed pseudo-random function: `SHA-256(k || label)`, read as a 256-bit output.
///
/// Callers must build `label` with the helpers below rather than ad hoc
/// formatting, so that the field ordering the label encodes can never be
/// transposed between call sites.
pub fn prf(k: &[u8; 32], label: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(k);
    hasher.update(label);
    hasher.finalize().into()
}

/// Label for a voter's masking pad: `"1" || offset || voter_index || voter_id`.
pub fn pad_label(offset: u64, voter_index: u32, voter_id: &str) -> Vec<u8> {
    let mut label = Vec::with_capacity(1 + 8 + 4 + voter_id.len());
    label.push(b'1');
    label.extend_from_slice(&offset.to_be_bytes());
    label.extend_from_slice(&voter_index.to_be_bytes());
    label.extend_from_slice(voter_id.as_bytes());
    label
}

/// Label for a generic-variant "yes" vote image: `"2" || offset || voter_index || voter_id`.
pub fn vote_label(offset: u64, voter_index: u32, voter_id: &str) -> Vec<u8> {
    let mut label = Vec::with_capacity(1 + 8 + 4 + voter_id.len());
    label.push(b'2');
    label.extend_from_slice(&offset.to_be_bytes());
    label.extend_from_slice(&voter_index.to_be_bytes());
    label.extend_from_slice(voter_id.as_bytes());
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_inputs() {
        let k = [7u8; 32];
        let label = pad_label(0, 3, "voter3");
        assert_eq!(prf(&k, &label), prf(&k, &label));
    }

    #[test]
    fn distinct_labels_yield_distinct_outputs() {
        let k = [7u8; 32];
        let a = prf(&k, &pad_label(0, 1, "voter1"));
        let b = prf(&k, &vote_label(0, 1, "voter1"));
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_keys_yield_distinct_outputs() {
        let label = pad_label(0, 0, "voter0");
        let a = prf(&[1u8; 32], &label);
        let b = prf(&[2u8; 32], &label);
        assert_ne!(a, b);
    }
}
