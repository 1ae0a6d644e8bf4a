// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod election_config;
mod validation;

pub use election_config::{
    AggregationMode, DropoutPolicy, ElectionConfig, ElectionConfigBuilder, DEFAULT_MODULUS_BITS,
    DEFAULT_SQUARINGS_PER_SEC,
};
pub use validation::ConfigError;
