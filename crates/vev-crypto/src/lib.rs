// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod modulus;
mod prf;
mod timelock;

pub use modulus::generate_modulus;
pub use prf::{pad_label, prf, vote_label};
pub use timelock::{TimeLockError, TimeLockPuzzle};
