// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::fmt;
use std::time::{Duration, SystemTime};

use vev_utils::Redacted32;

use crate::validation::{validate, ConfigError};

/// Whether absent voters' contributions are recoverable via time-lock
/// puzzles after a bounded delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropoutPolicy {
    Original,
    DropoutResilient,
}

/// Whether the tallier aggregates with plain OR (threshold 1) or tests
/// Bloom-filter membership for a variable threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    Efficient,
    Generic,
}

/// All parameters shared by every participant in one election run.
///
/// Ports default to `None`, meaning "bind an ephemeral OS-assigned port" —
/// the reference protocol's hardcoded 65432/65433 loopback ports are
/// construction parameters here, never process-wide constants.
#[derive(Clone)]
pub struct ElectionConfig {
    pub k0: [u8; 32],
    pub n: u32,
    pub k: u32,
    pub offset: u64,
    pub dropout_policy: DropoutPolicy,
    pub aggregation_mode: AggregationMode,
    pub vote_time: Option<SystemTime>,
    pub squarings_per_sec: u64,
    pub modulus_bits: u32,
    pub final_voter_port: Option<u16>,
    pub tallier_port: Option<u16>,
    pub intake_deadline: Option<Duration>,
}

/// Elides `k0` (the election's PRF key, shared by every participant) behind
/// [`vev_utils::Redacted32`] so an accidental `tracing::debug!(?cfg, ...)` or
/// test failure message never prints the full key.
impl fmt::Debug for ElectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElectionConfig")
            .field("k0", &Redacted32(self.k0))
            .field("n", &self.n)
            .field("k", &self.k)
            .field("offset", &self.offset)
            .field("dropout_policy", &self.dropout_policy)
            .field("aggregation_mode", &self.aggregation_mode)
            .field("vote_time", &self.vote_time)
            .field("squarings_per_sec", &self.squarings_per_sec)
            .field("modulus_bits", &self.modulus_bits)
            .field("final_voter_port", &self.final_voter_port)
            .field("tallier_port", &self.tallier_port)
            .field("intake_deadline", &self.intake_deadline)
            .finish()
    }
}

/// Default squarings-per-second estimate, matching the reference
/// protocol's build-time constant.
pub const DEFAULT_SQUARINGS_PER_SEC: u64 = 3_000_000;

/// Modulus width used for benchmark-speed parity with the reference
/// implementation. Anything below 2048 bits is experimental-only; see
/// `ElectionConfigBuilder::modulus_bits`.
pub const DEFAULT_MODULUS_BITS: u32 = 128;
const EXPERIMENTAL_MODULUS_BITS_FLOOR: u32 = 2048;

impl ElectionConfig {
    pub fn builder(k0: [u8; 32], n: u32) -> ElectionConfigBuilder {
        ElectionConfigBuilder::new(k0, n)
    }
}

#[derive(Debug, Clone)]
pub struct ElectionConfigBuilder {
    k0: [u8; 32],
    n: u32,
    k: Option<u32>,
    offset: u64,
    dropout_policy: DropoutPolicy,
    aggregation_mode: AggregationMode,
    vote_time: Option<SystemTime>,
    squarings_per_sec: u64,
    modulus_bits: u32,
    final_voter_port: Option<u16>,
    tallier_port: Option<u16>,
    intake_deadline: Option<Duration>,
}

impl ElectionConfigBuilder {
    pub fn new(k0: [u8; 32], n: u32) -> Self {
        Self {
            k0,
            n,
            k: None,
            offset: 0,
            dropout_policy: DropoutPolicy::Original,
            aggregation_mode: AggregationMode::Efficient,
            vote_time: None,
            squarings_per_sec: DEFAULT_SQUARINGS_PER_SEC,
            modulus_bits: DEFAULT_MODULUS_BITS,
            final_voter_port: None,
            tallier_port: None,
            intake_deadline: None,
        }
    }

    pub fn threshold(mut self, k: u32) -> Self {
        self.k = Some(k);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn dropout_policy(mut self, policy: DropoutPolicy) -> Self {
        self.dropout_policy = policy;
        self
    }

    pub fn aggregation_mode(mut self, mode: AggregationMode) -> Self {
        self.aggregation_mode = mode;
        self
    }

    pub fn vote_time(mut self, vote_time: SystemTime) -> Self {
        self.vote_time = Some(vote_time);
        self
    }

    pub fn squarings_per_sec(mut self, rate: u64) -> Self {
        self.squarings_per_sec = rate;
        self
    }

    pub fn modulus_bits(mut self, bits: u32) -> Self {
        if bits < EXPERIMENTAL_MODULUS_BITS_FLOOR {
            tracing::warn!(
                bits,
                floor = EXPERIMENTAL_MODULUS_BITS_FLOOR,
                "modulus width below the non-experimental floor; time-lock puzzles are breakable by a patient attacker"
            );
        }
        self.modulus_bits = bits;
        self
    }

    pub fn final_voter_port(mut self, port: u16) -> Self {
        self.final_voter_port = Some(port);
        self
    }

    pub fn tallier_port(mut self, port: u16) -> Self {
        self.tallier_port = Some(port);
        self
    }

    pub fn intake_deadline(mut self, deadline: Duration) -> Self {
        self.intake_deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Result<ElectionConfig, ConfigError> {
        let efficient = matches!(self.aggregation_mode, AggregationMode::Efficient);
        let k = self.k.unwrap_or_else(|| {
            if efficient {
                1
            } else {
                self.n / 2 + 1
            }
        });
        validate(self.n, k, efficient)?;

        Ok(ElectionConfig {
            k0: self.k0,
            n: self.n,
            k,
            offset: self.offset,
            dropout_policy: self.dropout_policy,
            aggregation_mode: self.aggregation_mode,
            vote_time: self.vote_time,
            squarings_per_sec: self.squarings_per_sec,
            modulus_bits: self.modulus_bits,
            final_voter_port: self.final_voter_port,
            tallier_port: self.tallier_port,
            intake_deadline: self.intake_deadline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_prints_the_full_key() {
        let cfg = ElectionConfig::builder([0xABu8; 32], 4).build().unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains(&"ab".repeat(32)));
    }

    #[test]
    fn rejects_fewer_than_two_voters() {
        let err = ElectionConfig::builder([0u8; 32], 1).build().unwrap_err();
        assert_eq!(err, ConfigError::TooFewVoters(1));
    }

    #[test]
    fn efficient_defaults_threshold_to_one() {
        let cfg = ElectionConfig::builder([0u8; 32], 4).build().unwrap();
        assert_eq!(cfg.k, 1);
    }

    #[test]
    fn generic_defaults_threshold_to_majority() {
        let cfg = ElectionConfig::builder([0u8; 32], 5)
            .aggregation_mode(AggregationMode::Generic)
            .build()
            .unwrap();
        assert_eq!(cfg.k, 3);
    }

    #[test]
    fn rejects_efficient_with_explicit_threshold_other_than_one() {
        let err = ElectionConfig::builder([0u8; 32], 4)
            .threshold(2)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::EfficientThresholdNotOne(2));
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let err = ElectionConfig::builder([0u8; 32], 4)
            .aggregation_mode(AggregationMode::Generic)
            .threshold(5)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ThresholdOutOfRange { k: 5, n: 4 });
    }
}
