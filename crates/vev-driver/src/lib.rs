// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;

pub use error::DriverError;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use vev_config::ElectionConfig;
use vev_multithread::TaskPool;
use vev_net::bind_loopback;
use vev_protocol::{FinalVoter, Tallier, TallyOutcome, Voter};

/// Worker threads the tallier's puzzle-solver pool runs on. A dropout
/// scenario solves at most `n - 1` puzzles concurrently, so a handful of
/// threads is enough without over-subscribing the host.
const SOLVER_THREADS: usize = 4;

/// Canonical voter id assigned by the driver: `"voter{index}"`.
///
/// The generic variant's Bloom filter is built over PRF images under this
/// exact label convention (see `vev_protocol::generic_bloom`), so every
/// participant the driver spawns must use it — voter ids are never
/// caller-chosen, unlike `k0`/`offset`/the vote vector.
pub fn voter_id(index: u32) -> String {
    format!("voter{index}")
}

/// Listening sockets for the final voter and the tallier, bound before any
/// participant is constructed so every voter can be built with concrete
/// addresses. Binding both up front (rather than lazily inside `run`) is
/// what lets `ElectionConfig::final_voter_port`/`tallier_port` stay `None`
/// (ephemeral) in tests while still letting the driver hand out the
/// resolved address to every voter it spawns.
pub struct ElectionBindings {
    pub final_voter_listener: TcpListener,
    pub final_voter_addr: SocketAddr,
    pub tallier_listener: TcpListener,
    pub tallier_addr: SocketAddr,
}

impl ElectionBindings {
    pub async fn bind(cfg: &ElectionConfig) -> Result<Self, DriverError> {
        let final_voter_listener = bind_loopback(cfg.final_voter_port.unwrap_or(0))
            .await
            .map_err(DriverError::Bind)?;
        let final_voter_addr = final_voter_listener
            .local_addr()
            .map_err(|e| DriverError::Bind(e.into()))?;

        let tallier_listener = bind_loopback(cfg.tallier_port.unwrap_or(0))
            .await
            .map_err(DriverError::Bind)?;
        let tallier_addr = tallier_listener
            .local_addr()
            .map_err(|e| DriverError::Bind(e.into()))?;

        Ok(Self {
            final_voter_listener,
            final_voter_addr,
            tallier_listener,
            tallier_addr,
        })
    }
}

/// Runs one election end to end: every voter participates. `votes[i]` is
/// voter `i`'s ballot; `votes` must have exactly `cfg.n` entries.
///
/// This is the function the CLI binary calls, and the one to reach for in
/// tests that don't need to simulate a silent voter.
pub async fn run_election(cfg: ElectionConfig, votes: &[bool]) -> Result<TallyOutcome, DriverError> {
    let active = vec![true; votes.len()];
    run_election_with_participation(cfg, votes, &active).await
}

/// Runs one election where `active[i] == false` means voter `i` never
/// connects to anyone — the dropout scenario spec.md §8's E5/E6 describe.
/// The final voter still waits only for pads from *active* non-final
/// voters, and the tallier still expects a contribution only from
/// participants that actually run.
///
/// A silent final voter is not a meaningful scenario (spec.md §4.6: the
/// final voter's pad carries the cancellation of everyone else's, so the
/// election cannot be completed without it) and is rejected.
pub async fn run_election_with_participation(
    cfg: ElectionConfig,
    votes: &[bool],
    active: &[bool],
) -> Result<TallyOutcome, DriverError> {
    if votes.len() as u32 != cfg.n {
        return Err(DriverError::VoteCountMismatch {
            expected: cfg.n,
            actual: votes.len() as u32,
        });
    }
    if active.len() as u32 != cfg.n {
        return Err(DriverError::ActiveCountMismatch {
            expected: cfg.n,
            actual: active.len() as u32,
        });
    }
    assert!(
        active[(cfg.n - 1) as usize],
        "the final voter cannot be silent: its pad cancels every other voter's"
    );

    let bindings = ElectionBindings::bind(&cfg).await?;
    info!(
        n = cfg.n,
        k = cfg.k,
        final_voter_addr = %bindings.final_voter_addr,
        tallier_addr = %bindings.tallier_addr,
        "election bound to loopback sockets"
    );

    let task_pool = TaskPool::new(SOLVER_THREADS, cfg.n.max(1) as usize);
    let tallier = Tallier {
        cfg: cfg.clone(),
        task_pool,
    };
    let tallier_handle =
        tokio::spawn(async move { tallier.run(bindings.tallier_listener).await });

    let final_voter = FinalVoter {
        cfg: cfg.clone(),
        voter_id: voter_id(cfg.n - 1),
        vote: votes[(cfg.n - 1) as usize],
        tallier_addr: bindings.tallier_addr,
    };
    let final_voter_handle = tokio::spawn(async move {
        final_voter.run(bindings.final_voter_listener).await
    });

    let mut voter_handles = Vec::new();
    for i in 0..cfg.n - 1 {
        if !active[i as usize] {
            continue;
        }
        let voter = Voter {
            cfg: cfg.clone(),
            voter_index: i,
            voter_id: voter_id(i),
            vote: votes[i as usize],
            final_voter_addr: bindings.final_voter_addr,
            tallier_addr: bindings.tallier_addr,
        };
        voter_handles.push((i, tokio::spawn(async move { voter.run().await })));
    }

    for (index, handle) in voter_handles {
        handle
            .await?
            .map_err(|source| DriverError::Voter { index, source })?;
    }
    final_voter_handle.await??;
    let outcome = tallier_handle.await??;

    info!(verdict = outcome.verdict, received = outcome.received, "election complete");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vev_config::{AggregationMode, DropoutPolicy};

    fn cfg_efficient(n: u32) -> ElectionConfig {
        ElectionConfig::builder([1u8; 32], n)
            .intake_deadline(Duration::from_secs(10))
            .build()
            .unwrap()
    }

    fn cfg_generic(n: u32, k: u32) -> ElectionConfig {
        ElectionConfig::builder([2u8; 32], n)
            .aggregation_mode(AggregationMode::Generic)
            .threshold(k)
            .intake_deadline(Duration::from_secs(10))
            .build()
            .unwrap()
    }

    // E1: original-efficient, n=4, all no. Expected verdict 0.
    #[tokio::test]
    async fn e1_all_no_votes_yields_zero() {
        let outcome = run_election(cfg_efficient(4), &[false, false, false, false])
            .await
            .unwrap();
        assert_eq!(outcome.verdict, 0);
        assert_eq!(outcome.received, 4);
    }

    // E2: original-efficient, n=4, one yes. Expected verdict 1.
    #[tokio::test]
    async fn e2_one_yes_vote_yields_one() {
        let outcome = run_election(cfg_efficient(4), &[false, false, true, false])
            .await
            .unwrap();
        assert_eq!(outcome.verdict, 1);
    }

    // E3: original-generic, n=5, k=3, two yes (< k). Expected verdict 0.
    #[tokio::test]
    async fn e3_below_threshold_yields_zero() {
        let outcome = run_election(cfg_generic(5, 3), &[true, true, false, false, false])
            .await
            .unwrap();
        assert_eq!(outcome.verdict, 0);
    }

    // E4: original-generic, n=5, k=3, three yes (>= k). Expected verdict 1.
    #[tokio::test]
    async fn e4_at_threshold_yields_one() {
        let outcome = run_election(cfg_generic(5, 3), &[true, true, true, false, false])
            .await
            .unwrap();
        assert_eq!(outcome.verdict, 1);
    }

    // E5: dropout-resilient efficient, n=3, votes=[0,1,0]. In the
    // dropout-resilient variant every non-final voter's contribution only
    // reaches the tallier as a time-lock puzzle (never a bare message), so
    // voter 1's "yes" vote is recoverable only by solving its puzzle. With
    // `vote_time` already elapsed, `t` is small and the solve is immediate.
    #[tokio::test]
    async fn e5_dropout_resilient_efficient_recovers_a_time_locked_yes_vote() {
        let cfg = ElectionConfig::builder([3u8; 32], 3)
            .dropout_policy(DropoutPolicy::DropoutResilient)
            .vote_time(std::time::SystemTime::now())
            .squarings_per_sec(1_000_000)
            .modulus_bits(64)
            .intake_deadline(Duration::from_secs(10))
            .build()
            .unwrap();

        let outcome = run_election(cfg, &[false, true, false]).await.unwrap();
        assert_eq!(outcome.verdict, 1);
        assert_eq!(outcome.received, 3);
    }

    // Invariant 7: a voter that never connects at all (no pad, no masked
    // vote) is excluded as if it had never been part of the election -
    // pads still cancel because the final voter folds only the pads it
    // actually received, and the tallier folds only the contributions it
    // actually received. Here the silent voter cast "no", so excluding it
    // entirely must not change the verdict.
    #[tokio::test]
    async fn invariant7_a_fully_silent_no_voter_does_not_change_the_verdict() {
        let cfg = ElectionConfig::builder([5u8; 32], 3)
            .intake_deadline(Duration::from_millis(300))
            .build()
            .unwrap();

        let outcome =
            run_election_with_participation(cfg, &[false, true, false], &[false, true, true])
                .await
                .unwrap();
        assert_eq!(outcome.verdict, 1);
        assert_eq!(outcome.received, 2);
    }

    // E6: dropout-resilient generic, n=4, k=3, all yes. Every voter
    // time-locks; the tallier solves all puzzles before tallying.
    #[tokio::test]
    async fn e6_dropout_resilient_generic_all_yes_meets_threshold() {
        let cfg = ElectionConfig::builder([4u8; 32], 4)
            .aggregation_mode(AggregationMode::Generic)
            .threshold(3)
            .dropout_policy(DropoutPolicy::DropoutResilient)
            .vote_time(std::time::SystemTime::now())
            .squarings_per_sec(1_000_000)
            .modulus_bits(64)
            .intake_deadline(Duration::from_secs(10))
            .build()
            .unwrap();

        let outcome = run_election(cfg, &[true, true, true, true]).await.unwrap();
        assert_eq!(outcome.verdict, 1);
        assert_eq!(outcome.received, 4);
    }

    #[tokio::test]
    async fn rejects_mismatched_vote_count() {
        let err = run_election(cfg_efficient(3), &[true, false])
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::VoteCountMismatch { expected: 3, actual: 2 }));
    }
}
