// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod framing;
mod wire;

pub use error::WireError;
pub use framing::{bind_loopback, read_to_end, send_and_close};
pub use wire::{
    biguint_to_fixed256, decimal_to_fixed256, fixed256_to_decimal, parse_tallier_message,
    BigUintDec, TallierMessage, TallierMessageOrBareVote,
};
