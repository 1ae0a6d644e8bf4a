// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod redact;
mod rng;

pub use redact::{hexf, Redacted32};
pub use rng::{shared_rng_from_seed, SharedRng};
