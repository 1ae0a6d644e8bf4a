// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::time::Duration;

use chacha20::cipher::generic_array::GenericArray;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20Legacy;
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroize;

/// An RSW time-lock puzzle encapsulating a 256-bit payload.
///
/// `n`, `a`, `ck`, `cm` and `nonce` are exactly the values carried on the
/// wire (see the `time_locked` message in the wire protocol); `t` is the
/// number of sequential squarings `solve` must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLockPuzzle {
    pub n: BigUint,
    pub a: BigUint,
    pub t: u64,
    pub ck: BigUint,
    pub cm: BigUint,
    pub nonce: BigUint,
}

#[derive(Debug, Error)]
pub enum TimeLockError {
    #[error("recovered key did not decrypt to a 32-byte plaintext")]
    DecryptionFailed,
    #[error("CK - b underflowed: arithmetic precondition violated")]
    ArithmeticOutOfRange,
}

impl TimeLockPuzzle {
    /// Encodes `message` so that it becomes recoverable only after roughly
    /// `delta` of sequential computation at `squarings_per_sec` squarings/s.
    ///
    /// `delta` is clamped to zero if it has already elapsed, matching the
    /// voter's behaviour of still posting a (trivially solvable) puzzle for
    /// a vote time in the past.
    pub fn encode(
        message: [u8; 32],
        delta: Duration,
        squarings_per_sec: u64,
        bits: u32,
        rng: &mut impl RngCore,
    ) -> Self {
        let (n, phi) = crate::generate_modulus(bits, rng);
        let t = (delta.as_secs_f64() * squarings_per_sec as f64).ceil() as u64;

        let mut key = [0u8; 32];
        rng.fill_bytes(&mut key);
        let mut nonce_bytes = [0u8; 8];
        rng.fill_bytes(&mut nonce_bytes);

        let mut buf = message;
        let mut cipher = ChaCha20Legacy::new(
            GenericArray::from_slice(&key),
            GenericArray::from_slice(&nonce_bytes),
        );
        cipher.apply_keystream(&mut buf);
        let cm = BigUint::from_bytes_be(&buf);

        let a = rng.gen_biguint_range(&BigUint::from(2u32), &n);
        let e = BigUint::from(2u32).modpow(&BigUint::from(t), &phi);
        let b = a.modpow(&e, &n);
        let ck = BigUint::from_bytes_be(&key) + &b;

        key.zeroize();
        Self {
            n,
            a,
            t,
            ck,
            cm,
            nonce: BigUint::from_bytes_be(&nonce_bytes),
        }
    }

    /// Performs `t` sequential squarings mod `n` and recovers the payload.
    ///
    /// This is the only step in the protocol that cannot be parallelized
    /// without knowledge of `phi(n)`, which the encoder discards.
    pub fn solve(&self) -> Result<[u8; 32], TimeLockError> {
        let mut x = self.a.clone();
        for _ in 0..self.t {
            x = (&x * &x) % &self.n;
        }
        let b = x;

        if self.ck < b {
            return Err(TimeLockError::ArithmeticOutOfRange);
        }
        let key_int = &self.ck - &b;
        let mut key = to_fixed_be(&key_int, 32);
        if key.len() != 32 {
            return Err(TimeLockError::DecryptionFailed);
        }
        let nonce = to_fixed_be(&self.nonce, 8);
        let mut key_arr = [0u8; 32];
        key_arr.copy_from_slice(&key);
        key.zeroize();

        let mut nonce_arr = [0u8; 8];
        nonce_arr.copy_from_slice(&nonce);

        let mut plaintext = to_fixed_be(&self.cm, 32);
        if plaintext.len() != 32 {
            return Err(TimeLockError::DecryptionFailed);
        }
        let mut cipher = ChaCha20Legacy::new(
            GenericArray::from_slice(&key_arr),
            GenericArray::from_slice(&nonce_arr),
        );
        cipher.apply_keystream(&mut plaintext);
        key_arr.zeroize();

        let mut out = [0u8; 32];
        out.copy_from_slice(&plaintext);
        Ok(out)
    }
}

/// Encodes `x` as exactly `len` big-endian bytes, left-padding with zeros.
/// Returns a longer vector (never truncates) if `x` does not fit — callers
/// treat a mismatched length as a puzzle-solve failure.
fn to_fixed_be(x: &BigUint, len: usize) -> Vec<u8> {
    if x.is_zero() {
        return vec![0u8; len];
    }
    let raw = x.to_bytes_be();
    if raw.len() >= len {
        return raw;
    }
    let mut out = vec![0u8; len - raw.len()];
    out.extend_from_slice(&raw);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn round_trips_a_payload() {
        let mut rng = thread_rng();
        let message = {
            let mut m = [0u8; 32];
            rng.fill_bytes(&mut m);
            m
        };
        // squarings_per_sec chosen so t is small and the test is fast.
        let puzzle = TimeLockPuzzle::encode(message, Duration::from_millis(1), 50, 64, &mut rng);
        assert!(puzzle.t <= 1);
        let recovered = puzzle.solve().expect("solve should succeed");
        assert_eq!(recovered, message);
    }

    #[test]
    fn t_is_monotonic_in_delta_and_rate() {
        let mut rng = thread_rng();
        let message = [0u8; 32];
        let small = TimeLockPuzzle::encode(message, Duration::from_secs(1), 10, 64, &mut rng);
        let bigger_delta = TimeLockPuzzle::encode(message, Duration::from_secs(4), 10, 64, &mut rng);
        let bigger_rate = TimeLockPuzzle::encode(message, Duration::from_secs(1), 40, 64, &mut rng);
        assert!(bigger_delta.t >= small.t);
        assert!(bigger_rate.t >= small.t);
    }

    #[test]
    fn zero_delta_solves_immediately() {
        let mut rng = thread_rng();
        let message = [9u8; 32];
        let puzzle = TimeLockPuzzle::encode(message, Duration::from_secs(0), 3_000_000, 64, &mut rng);
        assert_eq!(puzzle.t, 0);
        assert_eq!(puzzle.solve().unwrap(), message);
    }
}
