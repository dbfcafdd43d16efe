//! erst: replay Stellar transactions locally and explain what changed.
//!
//! ## Example Usage
//!
//! ```bash
//! # List the ledger keys a transaction touched
//! erst keys AAAAAAAAAAA...
//!
//! # Replay against a snapshot of testnet state
//! erst debug --tx tx.json --network testnet --snapshot testnet.json
//!
//! # Replay on two networks and diff the outcomes
//! erst debug --tx tx.json --network mainnet --snapshot mainnet.json \
//!     --compare-network testnet --compare-snapshot testnet.json --session-out session.json
//!
//! # Diff on-chain behavior against a local contract build
//! erst compare --tx tx.json --snapshot testnet.json --wasm target/token.wasm
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod erst_cli;

use erst_cli::{compare::CompareCmd, debug::DebugCmd, keys::KeysCmd, CliContext};

#[derive(Parser)]
#[command(
    name = "erst",
    author,
    version,
    about = "Replay Stellar transactions and diff their outcomes",
    long_about = "Replays a previously executed transaction through a local simulator, \
                  optionally on a second network or against a local WASM build, and \
                  reports how the outcomes differ."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Keys per ledger entry request (max 50)
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Disable the ledger entry cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Persist fetched entries on disk; `--cache-dir` alone uses the user
    /// cache directory, `--cache-dir=<DIR>` picks one
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        num_args = 0..=1,
        require_equals = true
    )]
    cache_dir: Option<Option<PathBuf>>,

    /// Simulator binary (default: $ERST_SIMULATOR_PATH or `erst-sim`)
    #[arg(long, global = true)]
    simulator: Option<PathBuf>,

    /// Extra argument passed to the simulator (repeatable)
    #[arg(long = "simulator-arg", global = true, allow_hyphen_values = true)]
    simulator_args: Vec<String>,

    /// Verbose logging (debug level)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ledger keys touched by a transaction's result metadata
    Keys(KeysCmd),

    /// Replay a transaction on one network, optionally diffing against a second
    Debug(DebugCmd),

    /// Replay on-chain and against a local WASM build, then diff
    Compare(CompareCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        command,
        json,
        batch_size,
        no_cache,
        cache_dir,
        simulator,
        simulator_args,
        verbose,
    } = Cli::parse();

    erst_cli::logging::init_tracing(verbose);

    let ctx = CliContext::new(
        json,
        batch_size,
        no_cache,
        erst_cli::resolve_cache_dir(cache_dir),
        simulator,
        simulator_args,
    )?;

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling replay");
            cancel.cancel();
        }
    });

    match command {
        Commands::Keys(cmd) => cmd.execute(&ctx),
        Commands::Debug(cmd) => cmd.execute(&ctx).await,
        Commands::Compare(cmd) => cmd.execute(&ctx).await,
    }
}
