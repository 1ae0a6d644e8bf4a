// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::RngCore;

/// Miller-Rabin rounds. 40 rounds bound the false-prime probability below
/// 2^-80, comfortably under the spec's 2^-64 floor.
const MILLER_RABIN_ROUNDS: u32 = 40;

/// Draws two independent `bits / 2`-bit primes and returns `(n, phi)` where
/// `n = p * q` and `phi = (p - 1) * (q - 1)`.
///
/// `bits` is a caller-supplied parameter, not a constant: the reference
/// protocol this is modeled on used a fixed 128-bit modulus, which is
/// cryptographically weak and suitable only for experimental benchmarking.
/// Callers building anything beyond a benchmark should pass `bits >= 2048`.
pub fn generate_modulus(bits: u32, rng: &mut impl RngCore) -> (BigUint, BigUint) {
    let half = bits / 2;
    let p = random_prime(half, rng);
    let q = random_prime(half, rng);
    let n = &p * &q;
    let phi = (&p - BigUint::one()) * (&q - BigUint::one());
    (n, phi)
}

/// Rejection-samples a `bits`-wide odd candidate until one passes Miller-Rabin.
fn random_prime(bits: u32, rng: &mut impl RngCore) -> BigUint {
    loop {
        let mut candidate = rng.gen_biguint(bits as u64);
        // Fix the top bit so the candidate is exactly `bits` wide, and the
        // bottom bit so it is odd.
        candidate.set_bit(bits as u64 - 1, true);
        candidate.set_bit(0, true);
        if is_probable_prime(&candidate, rng) {
            return candidate;
        }
    }
}

/// Miller-Rabin primality test with [`MILLER_RABIN_ROUNDS`] independent bases.
fn is_probable_prime(n: &BigUint, rng: &mut impl RngCore) -> bool {
    let small_primes: [u32; 8] = [2, 3, 5, 7, 11, 13, 17, 19];
    for &p in &small_primes {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    if n < &BigUint::from(2u32) {
        return false;
    }

    // n - 1 = 2^r * d, d odd.
    let one = BigUint::one();
    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut r: u64 = 0;
    while (&d).is_even() {
        d >>= 1;
        r += 1;
    }

    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = rng.gen_biguint_range(&BigUint::from(2u32), &(n - &one));
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 0..r - 1 {
            x = x.modpow(&BigUint::from(2u32), n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn generates_modulus_of_requested_width() {
        let mut rng = thread_rng();
        let (n, phi) = generate_modulus(64, &mut rng);
        assert!(n.bits() >= 60 && n.bits() <= 64);
        assert!(phi < n);
    }

    #[test]
    fn known_small_primes_pass() {
        let mut rng = thread_rng();
        for p in [BigUint::from(2u32), BigUint::from(97u32), BigUint::from(7919u32)] {
            assert!(is_probable_prime(&p, &mut rng));
        }
    }

    #[test]
    fn known_composites_fail() {
        let mut rng = thread_rng();
        for c in [BigUint::from(4u32), BigUint::from(9u32), BigUint::from(221u32)] {
            assert!(!is_probable_prime(&c, &mut rng));
        }
    }
}
