// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::RngCore;
use tracing::{info, Level};

use vev_config::{AggregationMode, DropoutPolicy, ElectionConfig, DEFAULT_SQUARINGS_PER_SEC};
use vev_driver::run_election;

/// Runs one election over a loopback network and prints its verdict.
///
/// Variant selection mirrors the reference protocol: `-o`/`-dr` choose
/// dropout tolerance, `-e`/`-g` choose the aggregation strategy. Omitting
/// either pair defaults to the original/efficient combination.
#[derive(Debug, Parser)]
#[command(name = "vev", about = "Run a private threshold e-voting election")]
struct Cli {
    /// Original variant: voters post their masked vote directly.
    #[arg(short = 'o', long, conflicts_with = "dropout_resilient")]
    original: bool,

    /// Dropout-resilient variant: masked votes are wrapped in a time-lock
    /// puzzle so a silent voter's contribution is still recoverable.
    #[arg(short = 'd', long = "dropout-resilient", visible_alias = "dr", conflicts_with = "original")]
    dropout_resilient: bool,

    /// Efficient variant: threshold is fixed at 1 (plain OR aggregation).
    #[arg(short = 'e', long, conflicts_with = "generic")]
    efficient: bool,

    /// Generic variant: variable k-of-n threshold via a Bloom filter.
    #[arg(short = 'g', long, conflicts_with = "efficient")]
    generic: bool,

    /// Number of voters (n >= 2).
    #[arg(short = 'n', long)]
    n: u32,

    /// Threshold k (generic variant only). Defaults to floor(n/2) + 1.
    #[arg(short = 't', long)]
    threshold: Option<u32>,

    /// Squarings per second the tallier can perform; sizes dropout-resilient
    /// time-lock puzzles. Ignored for the original variant.
    #[arg(long, env = "VEV_SQUARINGS_PER_SEC", default_value_t = DEFAULT_SQUARINGS_PER_SEC)]
    squarings: u64,

    /// Per-election salt mixed into every PRF label.
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Seconds from now at which dropout-resilient puzzles become solvable.
    /// Ignored for the original variant.
    #[arg(long = "vote-time-secs", default_value_t = 0)]
    vote_time_secs: u64,

    /// Explicit ballot vector, one 0/1 per voter, comma-separated
    /// (e.g. "0,1,0,0"). Defaults to a random ballot per voter.
    #[arg(long, value_delimiter = ',')]
    votes: Option<Vec<u8>>,

    /// Modulus width in bits for dropout-resilient time-lock puzzles.
    /// The reference protocol's 128-bit default is experimental-only.
    #[arg(long, default_value_t = vev_config::DEFAULT_MODULUS_BITS)]
    modulus_bits: u32,

    /// Reproducible-run seed: when set, `k0` and any randomly drawn ballots
    /// come from a seeded CSPRNG instead of the OS CSPRNG, so re-running
    /// with the same seed and flags reproduces the same election. Meant for
    /// demos and debugging, not for anything where k0 must stay secret.
    #[arg(long)]
    seed: Option<u64>,
}

/// Expands a 64-bit CLI seed into the 32-byte seed `vev_utils::shared_rng_from_seed`
/// wants, by repeating it across the block — sufficient for reproducibility,
/// not for cryptographic seeding.
fn expand_seed(seed: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = seed.to_le_bytes()[i % 8];
    }
    out
}

fn resolve_votes(cli: &Cli, rng: Option<&vev_utils::SharedRng>) -> Result<Vec<bool>> {
    match &cli.votes {
        Some(bits) => {
            if bits.len() != cli.n as usize {
                bail!("--votes has {} entries, expected {}", bits.len(), cli.n);
            }
            bits.iter()
                .map(|b| match b {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => bail!("--votes entries must be 0 or 1, got {other}"),
                })
                .collect()
        }
        None => match rng {
            Some(shared) => {
                let mut guard = shared.lock().expect("seeded rng mutex poisoned");
                Ok((0..cli.n).map(|_| guard.next_u32() % 2 == 1).collect())
            }
            None => {
                let mut rng = rand::rngs::OsRng;
                Ok((0..cli.n).map(|_| rng.next_u32() % 2 == 1).collect())
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    vev_logger::init_tracing(Level::INFO);
    let cli = Cli::parse();

    if cli.n < 2 {
        bail!("need at least 2 voters, got {}", cli.n);
    }

    let dropout_policy = if cli.dropout_resilient {
        DropoutPolicy::DropoutResilient
    } else {
        DropoutPolicy::Original
    };
    let aggregation_mode = if cli.generic {
        AggregationMode::Generic
    } else {
        AggregationMode::Efficient
    };

    let seeded_rng = cli.seed.map(|s| vev_utils::shared_rng_from_seed(expand_seed(s)));
    let votes = resolve_votes(&cli, seeded_rng.as_ref())?;

    let mut k0 = [0u8; 32];
    match &seeded_rng {
        Some(shared) => shared.lock().expect("seeded rng mutex poisoned").fill_bytes(&mut k0),
        None => rand::rngs::OsRng.fill_bytes(&mut k0),
    }

    let mut builder = ElectionConfig::builder(k0, cli.n)
        .dropout_policy(dropout_policy)
        .aggregation_mode(aggregation_mode)
        .offset(cli.offset)
        .squarings_per_sec(cli.squarings)
        .modulus_bits(cli.modulus_bits)
        .intake_deadline(Duration::from_secs(30));

    if let Some(k) = cli.threshold {
        builder = builder.threshold(k);
    }
    if dropout_policy == DropoutPolicy::DropoutResilient {
        builder = builder.vote_time(SystemTime::now() + Duration::from_secs(cli.vote_time_secs));
    }

    let cfg = builder
        .build()
        .context("invalid election configuration")?;

    info!(
        n = cli.n,
        k = cfg.k,
        dropout_resilient = cli.dropout_resilient,
        generic = cli.generic,
        ?votes,
        "starting election"
    );

    let outcome = run_election(cfg, &votes)
        .await
        .context("election failed")?;

    let any_yes = votes.iter().any(|v| *v);
    println!("Final verdict: {}", outcome.verdict);
    println!("Votes: {:?}", votes);
    println!("Above threshold (sanity check against the raw ballots): {any_yes}");
    println!(
        "Received {} contributions, {} time-locked puzzle(s) dropped",
        outcome.received, outcome.dropped_puzzles
    );

    Ok(())
}
