// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use num_bigint::BigUint;
use rand::rngs::OsRng;
use tracing::info;

use vev_config::{AggregationMode, DropoutPolicy, ElectionConfig};
use vev_crypto::{pad_label, prf, TimeLockPuzzle};
use vev_net::{fixed256_to_decimal, send_and_close, BigUintDec, TallierMessage};

use crate::codec::codec_for;
use crate::error::VoterError;
use crate::xor::xor256;

/// A single non-final voter: sends its masking pad to the final voter and
/// its (optionally time-locked) masked vote to the tallier.
pub struct Voter {
    pub cfg: ElectionConfig,
    pub voter_index: u32,
    pub voter_id: String,
    pub vote: bool,
    pub final_voter_addr: SocketAddr,
    pub tallier_addr: SocketAddr,
}

impl Voter {
    pub async fn run(&self) -> Result<(), VoterError> {
        let pad = prf(
            &self.cfg.k0,
            &pad_label(self.cfg.offset, self.voter_index, &self.voter_id),
        );

        let pad_send = async {
            let payload = fixed256_to_decimal(&pad);
            send_and_close(self.final_voter_addr, payload.as_bytes())
                .await
                .map_err(VoterError::PadSend)
        };

        let vote_send = async {
            let mut rng = OsRng;
            let codec = codec_for(self.cfg.aggregation_mode);
            let v = codec.encode_vote(
                &self.cfg.k0,
                self.cfg.offset,
                self.voter_index,
                &self.voter_id,
                self.vote,
                &mut rng,
            );
            let c = xor256(v, pad);
            let payload = self.build_tallier_payload(c, &mut rng);
            send_and_close(self.tallier_addr, &payload)
                .await
                .map_err(VoterError::VoteSend)
        };

        let (_, _) = tokio::try_join!(pad_send, vote_send)?;
        info!(voter_index = self.voter_index, "voter finished");
        Ok(())
    }

    /// Builds the wire payload for the masked vote `c`, matching the wire
    /// format table's four voter→tallier encodings.
    fn build_tallier_payload(&self, c: [u8; 32], rng: &mut OsRng) -> Vec<u8> {
        if self.cfg.dropout_policy == DropoutPolicy::DropoutResilient {
            let delta = self.delta_to_vote_time();
            let puzzle = TimeLockPuzzle::encode(
                c,
                delta,
                self.cfg.squarings_per_sec,
                self.cfg.modulus_bits,
                rng,
            );
            let msg = TallierMessage::TimeLocked {
                n: BigUintDec(puzzle.n),
                a: BigUintDec(puzzle.a),
                t: puzzle.t,
                ck: BigUintDec(puzzle.ck),
                cm: BigUintDec(puzzle.cm),
                nonce: BigUintDec(puzzle.nonce),
            };
            return serde_json::to_vec(&msg).expect("TallierMessage always serializes");
        }

        match self.cfg.aggregation_mode {
            AggregationMode::Efficient => fixed256_to_decimal(&c).into_bytes(),
            AggregationMode::Generic => {
                let msg = TallierMessage::Vote {
                    content: BigUintDec(BigUint::from_bytes_be(&c)),
                };
                serde_json::to_vec(&msg).expect("TallierMessage always serializes")
            }
        }
    }

    /// Time remaining until `cfg.vote_time`, clamped to zero if it has
    /// already elapsed (or was never set).
    fn delta_to_vote_time(&self) -> Duration {
        match self.cfg.vote_time {
            Some(t) => t.duration_since(SystemTime::now()).unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }
}
