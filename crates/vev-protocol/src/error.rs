// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use vev_net::WireError;

#[derive(Debug, Error)]
pub enum VoterError {
    #[error("sending pad to final voter: {0}")]
    PadSend(#[source] WireError),
    #[error("sending masked vote to tallier: {0}")]
    VoteSend(#[source] WireError),
}

#[derive(Debug, Error)]
pub enum FinalVoterError {
    #[error("network I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Wire(#[from] WireError),
}

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("network I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("solved-vote channel closed before all dispatched solvers reported back")]
    SolverChannelClosed,
}
