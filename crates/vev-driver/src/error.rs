// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

use vev_net::WireError;
use vev_protocol::{FinalVoterError, TallyError, VoterError};

/// Errors surfaced by wiring an election onto loopback sockets and running
/// it to completion. Per-participant protocol errors (`VoterError`,
/// `FinalVoterError`, `TallyError`) are wrapped rather than swallowed, so a
/// caller can tell a configuration mistake from a network fault.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("votes.len() ({actual}) does not match the configured voter count ({expected})")]
    VoteCountMismatch { expected: u32, actual: u32 },

    #[error("active.len() ({actual}) does not match the configured voter count ({expected})")]
    ActiveCountMismatch { expected: u32, actual: u32 },

    #[error("binding loopback sockets: {0}")]
    Bind(#[source] WireError),

    #[error("voter {index} failed: {source}")]
    Voter {
        index: u32,
        #[source]
        source: VoterError,
    },

    #[error("final voter failed: {0}")]
    FinalVoter(#[from] FinalVoterError),

    #[error("tallier failed: {0}")]
    Tally(#[from] TallyError),

    #[error("a spawned task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}
