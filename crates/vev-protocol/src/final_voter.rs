// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::net::SocketAddr;

use num_bigint::BigUint;
use rand::rngs::OsRng;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use vev_config::{AggregationMode, DropoutPolicy, ElectionConfig};
use vev_net::{
    decimal_to_fixed256, fixed256_to_decimal, read_to_end, send_and_close, BigUintDec,
    TallierMessage,
};

use crate::codec::codec_for;
use crate::error::FinalVoterError;
use crate::xor::xor_fold;

/// The distinguished voter at index `n - 1`: its pad is never sent anywhere
/// (it collects every other voter's pad instead), so its contribution
/// carries the cancellation of the whole election and the tallier accepts
/// it in the clear — never time-locked.
pub struct FinalVoter {
    pub cfg: ElectionConfig,
    pub voter_id: String,
    pub vote: bool,
    pub tallier_addr: SocketAddr,
}

impl FinalVoter {
    /// Listens on `listener` for `cfg.n - 1` pads, one per connection, then
    /// folds and posts its contribution to the tallier.
    pub async fn run(&self, listener: TcpListener) -> Result<(), FinalVoterError> {
        let expected = self.cfg.n - 1;
        let (tx, mut rx) = mpsc::channel::<[u8; 32]>(expected.max(1) as usize);

        let accept_handle = {
            let tx = tx.clone();
            tokio::spawn(async move {
                for _ in 0..expected {
                    let (mut stream, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "final voter accept failed");
                            continue;
                        }
                    };
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let payload = match read_to_end(&mut stream).await {
                            Ok(p) => p,
                            Err(e) => {
                                warn!(error = %e, "final voter read failed");
                                return;
                            }
                        };
                        let text = match std::str::from_utf8(&payload) {
                            Ok(t) => t,
                            Err(_) => {
                                warn!("final voter received non-UTF8 pad, dropping");
                                return;
                            }
                        };
                        match decimal_to_fixed256(text) {
                            Ok(pad) => {
                                let _ = tx.send(pad).await;
                            }
                            Err(e) => warn!(error = %e, "final voter received malformed pad"),
                        }
                    });
                }
            })
        };
        drop(tx);

        let deadline = self.cfg.intake_deadline.map(|d| tokio::time::Instant::now() + d);
        let mut pads = Vec::with_capacity(expected as usize);
        while pads.len() < expected as usize {
            let next = match deadline {
                Some(dl) => tokio::select! {
                    biased;
                    pad = rx.recv() => pad,
                    _ = tokio::time::sleep_until(dl) => {
                        warn!(
                            pads_received = pads.len(),
                            expected, "final voter intake deadline elapsed, folding partial pads"
                        );
                        break;
                    }
                },
                None => rx.recv().await,
            };
            match next {
                Some(pad) => pads.push(pad),
                None => break,
            }
        }
        accept_handle.abort();

        let pads_received = pads.len();
        let combined_pad = xor_fold(pads);
        info!(pads_received, "final voter combined all pads");

        let mut rng = OsRng;
        let codec = codec_for(self.cfg.aggregation_mode);
        let v = codec.encode_vote(
            &self.cfg.k0,
            self.cfg.offset,
            self.cfg.n - 1,
            &self.voter_id,
            self.vote,
            &mut rng,
        );
        let c_final = crate::xor::xor256(v, combined_pad);

        let payload = self.build_tallier_payload(c_final);
        send_and_close(self.tallier_addr, &payload).await?;
        Ok(())
    }

    fn build_tallier_payload(&self, c_final: [u8; 32]) -> Vec<u8> {
        if self.cfg.aggregation_mode == AggregationMode::Generic {
            let bf = crate::generic_bloom::build_generic_bloom(
                &self.cfg.k0,
                self.cfg.offset,
                self.cfg.n,
                self.cfg.k,
            );
            let msg = TallierMessage::VoteBf {
                vote: BigUintDec(BigUint::from_bytes_be(&c_final)),
                bf: bf.to_wire(),
            };
            return serde_json::to_vec(&msg).expect("TallierMessage always serializes");
        }

        match self.cfg.dropout_policy {
            DropoutPolicy::DropoutResilient => {
                let msg = TallierMessage::NotTimeLocked {
                    vote: BigUintDec(BigUint::from_bytes_be(&c_final)),
                };
                serde_json::to_vec(&msg).expect("TallierMessage always serializes")
            }
            DropoutPolicy::Original => fixed256_to_decimal(&c_final).into_bytes(),
        }
    }
}
