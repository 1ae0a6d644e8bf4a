// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// Fatal configuration problems, caught before any socket is opened.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("need at least 2 voters, got {0}")]
    TooFewVoters(u32),
    #[error("threshold {k} must be in [1, {n}]")]
    ThresholdOutOfRange { k: u32, n: u32 },
    #[error("efficient variants use OR aggregation: threshold must be 1, got {0}")]
    EfficientThresholdNotOne(u32),
}

pub(crate) fn validate(n: u32, k: u32, efficient: bool) -> Result<(), ConfigError> {
    if n < 2 {
        return Err(ConfigError::TooFewVoters(n));
    }
    if k < 1 || k > n {
        return Err(ConfigError::ThresholdOutOfRange { k, n });
    }
    if efficient && k != 1 {
        return Err(ConfigError::EfficientThresholdNotOne(k));
    }
    Ok(())
}
