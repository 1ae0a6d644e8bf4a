// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

/// Truncated hex `Debug` rendering for secret material (`k0`, pads, puzzle
/// keys) so an accidental `{:?}` in a log line never prints a full key.
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", truncate(hex::encode(data)))
}

fn truncate(s: String) -> String {
    let threshold = 16;
    let keep = 6;
    if s.len() <= threshold {
        format!("0x{s}")
    } else {
        format!("0x{}..({} hex chars elided)", &s[..keep], s.len() - keep)
    }
}

/// A 32-byte secret whose `Debug` impl never prints the full value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Redacted32(pub [u8; 32]);

impl fmt::Debug for Redacted32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hexf(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_elides_most_of_the_key() {
        let k = Redacted32([0xAB; 32]);
        let rendered = format!("{k:?}");
        assert!(rendered.len() < 32 * 2);
        assert!(!rendered.contains(&"ab".repeat(32)));
    }
}
