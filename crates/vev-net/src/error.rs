// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// A malformed inbound message. Per the protocol's fail-stop rule, the
/// caller must drop the message and *not* advance its intake counter —
/// counting a dropped connection would deadlock a tallier waiting on a
/// fixed number of contributions.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed JSON payload: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("payload was not a valid unbounded decimal integer")]
    NonIntegerPayload,
    #[error("network I/O error: {0}")]
    Io(#[from] std::io::Error),
}
