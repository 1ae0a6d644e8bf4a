// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod codec;
mod error;
mod final_voter;
mod generic_bloom;
#[cfg(test)]
mod proptest_invariants;
mod tallier;
mod verdict;
mod voter;
mod xor;

pub use codec::{codec_for, EfficientCodec, GenericCodec, VoteCodec};
pub use error::{FinalVoterError, TallyError, VoterError};
pub use final_voter::FinalVoter;
pub use generic_bloom::build_generic_bloom;
pub use tallier::{Tallier, TallierState, TallyOutcome};
pub use verdict::{verdict_for, EfficientVerdict, GenericVerdict, VerdictStrategy};
pub use voter::Voter;
