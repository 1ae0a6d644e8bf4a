// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::str::FromStr;

use num_bigint::BigUint;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use vev_bloom::WireBloomFilter;

use crate::error::WireError;

/// A [`BigUint`] serialized as a JSON string of its decimal digits.
///
/// The reference protocol emits bare (unquoted) JSON integer literals,
/// which standard JSON numbers cannot represent losslessly once they
/// exceed 2^53 (`CK`/`CM` routinely do, being ~257-bit values). This
/// implementation instead serializes big integers as decimal strings —
/// still "unbounded decimal" per the wire spec, just quoted, which every
/// JSON parser round-trips exactly instead of silently rounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigUintDec(pub BigUint);

impl Serialize for BigUintDec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_str_radix(10))
    }
}

impl<'de> Deserialize<'de> for BigUintDec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::from_str(s.trim())
            .map(BigUintDec)
            .map_err(|_| D::Error::custom("expected a decimal integer string"))
    }
}

impl From<BigUint> for BigUintDec {
    fn from(value: BigUint) -> Self {
        BigUintDec(value)
    }
}

/// Tagged JSON messages voters and the final voter post to the tallier.
/// The `type` discriminant matches the wire spec verbatim via
/// `rename_all = "snake_case"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TallierMessage {
    TimeLocked {
        n: BigUintDec,
        a: BigUintDec,
        t: u64,
        #[serde(rename = "CK")]
        ck: BigUintDec,
        #[serde(rename = "CM")]
        cm: BigUintDec,
        nonce: BigUintDec,
    },
    NotTimeLocked {
        vote: BigUintDec,
    },
    Vote {
        content: BigUintDec,
    },
    VoteBf {
        vote: BigUintDec,
        bf: WireBloomFilter,
    },
}

/// Parses an inbound tallier message, distinguishing the original-efficient
/// variant's bare decimal-ASCII integer (no `type` tag at all) from the
/// JSON-tagged messages every other variant sends.
pub fn parse_tallier_message(payload: &[u8]) -> Result<TallierMessageOrBareVote, WireError> {
    let text = std::str::from_utf8(payload).map_err(|_| WireError::NonIntegerPayload)?;
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        let msg: TallierMessage = serde_json::from_str(trimmed)?;
        Ok(TallierMessageOrBareVote::Tagged(msg))
    } else {
        let vote = decimal_to_fixed256(trimmed)?;
        Ok(TallierMessageOrBareVote::BareVote(vote))
    }
}

#[derive(Debug, Clone)]
pub enum TallierMessageOrBareVote {
    Tagged(TallierMessage),
    BareVote([u8; 32]),
}

/// Converts a 256-bit big-endian value to its unbounded decimal ASCII
/// encoding, used for pad messages and the original-efficient variant's
/// untagged masked-vote message.
pub fn fixed256_to_decimal(value: &[u8; 32]) -> String {
    BigUint::from_bytes_be(value).to_str_radix(10)
}

/// Parses an unbounded decimal ASCII integer into a 256-bit big-endian
/// value. Fails (rather than truncating) if the value does not fit in 256
/// bits — the protocol's fail-stop rule for malformed payloads.
pub fn decimal_to_fixed256(text: &str) -> Result<[u8; 32], WireError> {
    let n = BigUint::from_str(text.trim()).map_err(|_| WireError::NonIntegerPayload)?;
    let bytes = n.to_bytes_be();
    if bytes.len() > 32 {
        return Err(WireError::NonIntegerPayload);
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Converts a [`BigUint`] to a 256-bit big-endian value. Fails if the value
/// does not fit in 256 bits, same fail-stop rule as [`decimal_to_fixed256`].
pub fn biguint_to_fixed256(value: &BigUint) -> Result<[u8; 32], WireError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(WireError::NonIntegerPayload);
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trips_fixed256() {
        let mut value = [0u8; 32];
        value[0] = 0xAB;
        value[31] = 0x01;
        let text = fixed256_to_decimal(&value);
        assert_eq!(decimal_to_fixed256(&text).unwrap(), value);
    }

    #[test]
    fn zero_round_trips() {
        let value = [0u8; 32];
        assert_eq!(fixed256_to_decimal(&value), "0");
        assert_eq!(decimal_to_fixed256("0").unwrap(), value);
    }

    #[test]
    fn rejects_oversized_decimal() {
        let huge = "9".repeat(90); // far more than 256 bits can hold
        assert!(decimal_to_fixed256(&huge).is_err());
    }

    #[test]
    fn bare_decimal_is_distinguished_from_json() {
        match parse_tallier_message(b"12345").unwrap() {
            TallierMessageOrBareVote::BareVote(_) => {}
            _ => panic!("expected a bare vote"),
        }
        match parse_tallier_message(br#"{"type":"not_time_locked","vote":"7"}"#).unwrap() {
            TallierMessageOrBareVote::Tagged(TallierMessage::NotTimeLocked { vote }) => {
                assert_eq!(vote.0, BigUint::from(7u32));
            }
            _ => panic!("expected a tagged not_time_locked message"),
        }
    }

    #[test]
    fn tag_names_match_wire_spec() {
        let msg = TallierMessage::VoteBf {
            vote: BigUintDec(BigUint::from(3u32)),
            bf: WireBloomFilter {
                size: 10,
                hash_count: 2,
                bit_array: "00".into(),
            },
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"vote_bf""#));
    }
}
