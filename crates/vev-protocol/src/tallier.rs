// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use vev_bloom::BloomFilter;
use vev_config::ElectionConfig;
use vev_crypto::TimeLockPuzzle;
use vev_multithread::{TaskPool, TaskTimeouts};
use vev_net::{biguint_to_fixed256, parse_tallier_message, read_to_end, TallierMessage, TallierMessageOrBareVote};

use crate::error::TallyError;
use crate::verdict::verdict_for;
use crate::xor::xor_fold;

/// The tallier's lifecycle. Transitions are one-directional: an
/// already-visited state is never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallierState {
    Listening,
    CollectingAll,
    AwaitingSolvers,
    ComputingVerdict,
    Done,
}

#[derive(Debug, Clone, Copy)]
pub struct TallyOutcome {
    pub verdict: u8,
    pub received: u32,
    pub dropped_puzzles: u32,
}

pub struct Tallier {
    pub cfg: ElectionConfig,
    pub task_pool: TaskPool,
}

/// Internal message the solver-completion channel carries back to the
/// single task that owns `encoded_votes` — the "single-writer channel"
/// pattern that keeps XOR-fold state lock-free.
enum SolverResult {
    Solved([u8; 32]),
    Dropped,
}

impl Tallier {
    /// Collects contributions until either all `n` have arrived or, when
    /// `cfg.intake_deadline` is set, the deadline elapses — whichever comes
    /// first. A deadline never discards what was already collected: per
    /// spec.md §7 ("surface as a warning; compute the verdict over what has
    /// been collected"), an elapsed deadline abandons only the messages and
    /// puzzle solves still outstanding.
    pub async fn run(&self, listener: TcpListener) -> Result<TallyOutcome, TallyError> {
        let deadline = self.cfg.intake_deadline.map(|d| Instant::now() + d);
        self.collect_and_compute(listener, deadline).await
    }

    async fn collect_and_compute(
        &self,
        listener: TcpListener,
        deadline: Option<Instant>,
    ) -> Result<TallyOutcome, TallyError> {
        let mut state = TallierState::Listening;
        let mut encoded_votes: Vec<[u8; 32]> = Vec::new();
        let mut bloom: Option<BloomFilter> = None;
        let mut received: u32 = 0;
        let mut dropped_puzzles: u32 = 0;

        let (solver_tx, mut solver_rx) = mpsc::channel::<SolverResult>(self.cfg.n as usize);
        let mut pending_solvers: u32 = 0;

        state = TallierState::CollectingAll;
        tracing::debug!(?state, "tallier listening for contributions");
        while received < self.cfg.n {
            let (mut stream, peer) = match deadline {
                Some(dl) => tokio::select! {
                    biased;
                    accepted = listener.accept() => accepted?,
                    _ = tokio::time::sleep_until(dl) => {
                        warn!(
                            received,
                            expected = self.cfg.n,
                            "intake deadline elapsed, proceeding with partial contributions"
                        );
                        break;
                    }
                },
                None => listener.accept().await?,
            };
            let payload = match read_to_end(&mut stream).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(%peer, error = %e, "tallier connection I/O error, not counted");
                    continue;
                }
            };

            let parsed = match parse_tallier_message(&payload) {
                Ok(p) => p,
                Err(e) => {
                    warn!(%peer, error = %e, "malformed tallier message, dropping without counting");
                    continue;
                }
            };
            received += 1;

            match parsed {
                TallierMessageOrBareVote::BareVote(v) => encoded_votes.push(v),
                TallierMessageOrBareVote::Tagged(TallierMessage::NotTimeLocked { vote }) => {
                    match biguint_to_fixed256(&vote.0) {
                        Ok(v) => encoded_votes.push(v),
                        Err(e) => warn!(error = %e, "not_time_locked vote out of range, dropping contribution"),
                    }
                }
                TallierMessageOrBareVote::Tagged(TallierMessage::Vote { content }) => {
                    match biguint_to_fixed256(&content.0) {
                        Ok(v) => encoded_votes.push(v),
                        Err(e) => warn!(error = %e, "vote content out of range, dropping contribution"),
                    }
                }
                TallierMessageOrBareVote::Tagged(TallierMessage::VoteBf { vote, bf }) => {
                    match biguint_to_fixed256(&vote.0) {
                        Ok(v) => encoded_votes.push(v),
                        Err(e) => warn!(error = %e, "vote_bf vote out of range, dropping contribution"),
                    }
                    match BloomFilter::from_wire(&bf) {
                        Ok(installed) => bloom = Some(installed),
                        Err(e) => warn!(error = %e, "failed to install Bloom filter"),
                    }
                }
                TallierMessageOrBareVote::Tagged(TallierMessage::TimeLocked {
                    n,
                    a,
                    t,
                    ck,
                    cm,
                    nonce,
                }) => {
                    pending_solvers += 1;
                    let puzzle = TimeLockPuzzle {
                        n: n.0,
                        a: a.0,
                        t,
                        ck: ck.0,
                        cm: cm.0,
                        nonce: nonce.0,
                    };
                    let pool = self.task_pool.clone();
                    let tx = solver_tx.clone();
                    let started_at = Instant::now();
                    tokio::spawn(async move {
                        let result = pool
                            .spawn("puzzle-solve".to_string(), TaskTimeouts::default(), move || {
                                puzzle.solve()
                            })
                            .await;
                        let outcome = match result {
                            Ok(Ok(vote)) => SolverResult::Solved(vote),
                            Ok(Err(e)) => {
                                warn!(error = %e, "time-lock puzzle failed to solve, dropping contribution");
                                SolverResult::Dropped
                            }
                            Err(e) => {
                                warn!(error = %e, "puzzle-solve task lost, dropping contribution");
                                SolverResult::Dropped
                            }
                        };
                        tracing::debug!(elapsed = ?started_at.elapsed(), "puzzle solve finished");
                        let _ = tx.send(outcome).await;
                    });
                }
            }
        }
        drop(solver_tx);

        state = TallierState::AwaitingSolvers;
        tracing::debug!(?state, pending_solvers, "awaiting outstanding puzzle solvers");
        let mut resolved_solvers: u32 = 0;
        while resolved_solvers < pending_solvers {
            let next = match deadline {
                Some(dl) => tokio::select! {
                    biased;
                    result = solver_rx.recv() => result,
                    _ = tokio::time::sleep_until(dl) => {
                        let abandoned = pending_solvers - resolved_solvers;
                        warn!(abandoned, "intake deadline elapsed, abandoning outstanding solvers");
                        dropped_puzzles += abandoned;
                        break;
                    }
                },
                None => solver_rx.recv().await,
            };
            resolved_solvers += 1;
            match next {
                Some(SolverResult::Solved(v)) => encoded_votes.push(v),
                Some(SolverResult::Dropped) => dropped_puzzles += 1,
                None => return Err(TallyError::SolverChannelClosed),
            }
        }

        state = TallierState::ComputingVerdict;
        tracing::debug!(?state, "folding contributions and deriving verdict");
        let xor = xor_fold(encoded_votes);
        let strategy = verdict_for(self.cfg.aggregation_mode);
        let verdict = strategy.finalize(xor, bloom.as_ref());

        state = TallierState::Done;
        info!(?state, received, dropped_puzzles, verdict, "tally complete");

        Ok(TallyOutcome {
            verdict,
            received,
            dropped_puzzles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vev_config::{AggregationMode, DropoutPolicy};
    use vev_net::{bind_loopback, send_and_close};

    fn base_cfg(n: u32) -> ElectionConfig {
        ElectionConfig::builder([1u8; 32], n)
            .dropout_policy(DropoutPolicy::Original)
            .intake_deadline(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn efficient_tallier_counts_a_bare_yes_vote() {
        let listener = bind_loopback(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let tallier = Tallier {
            cfg: base_cfg(2),
            task_pool: TaskPool::new(1, 4),
        };

        let run = tokio::spawn(async move { tallier.run(listener).await });

        let mut yes = [0u8; 32];
        yes[31] = 1;
        send_and_close(addr, vev_net::fixed256_to_decimal(&yes).as_bytes())
            .await
            .unwrap();
        send_and_close(addr, b"0").await.unwrap();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.received, 2);
        assert_eq!(outcome.verdict, 1);
    }

    #[tokio::test]
    async fn generic_tallier_reads_not_time_locked_and_vote_bf() {
        let listener = bind_loopback(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cfg = ElectionConfig::builder([2u8; 32], 2)
            .aggregation_mode(AggregationMode::Generic)
            .threshold(1)
            .dropout_policy(DropoutPolicy::DropoutResilient)
            .intake_deadline(Duration::from_secs(5))
            .build()
            .unwrap();
        let tallier = Tallier {
            cfg: cfg.clone(),
            task_pool: TaskPool::new(1, 4),
        };

        let run = tokio::spawn(async move { tallier.run(listener).await });

        let bf = crate::generic_bloom::build_generic_bloom(&cfg.k0, cfg.offset, cfg.n, cfg.k);
        let mut other_vote = [0u8; 32];
        other_vote[31] = 7;
        let not_time_locked = serde_json::to_vec(&TallierMessage::NotTimeLocked {
            vote: vev_net::BigUintDec(num_bigint::BigUint::from_bytes_be(&other_vote)),
        })
        .unwrap();
        send_and_close(addr, &not_time_locked).await.unwrap();

        let vote_bf = serde_json::to_vec(&TallierMessage::VoteBf {
            vote: vev_net::BigUintDec(num_bigint::BigUint::from(0u32)),
            bf: bf.to_wire(),
        })
        .unwrap();
        send_and_close(addr, &vote_bf).await.unwrap();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.received, 2);
    }
}
