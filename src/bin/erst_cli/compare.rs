use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use erst_core::{BranchSpec, ReplayInputs, ReplaySession};
use erst_types::{Network, Target, TransactionRecord};
use sha2::{Digest, Sha256};
use tracing::info;

use super::{finish_session, flush_caches, load_overrides, CliContext};

#[derive(Parser, Debug)]
#[command(about = "Diff on-chain behavior against a local WASM build")]
pub struct CompareCmd {
    /// Transaction JSON file (hash, envelope_xdr, result_meta_xdr)
    #[arg(long)]
    tx: PathBuf,

    /// Ledger snapshot used by both branches
    #[arg(long)]
    snapshot: PathBuf,

    /// Contract build to execute in place of the deployed code
    #[arg(long)]
    wasm: PathBuf,

    /// Network the transaction was executed on
    #[arg(long, default_value = "testnet")]
    network: Network,

    /// Ledger entries that replace fetched ones (snapshot file layout)
    #[arg(long = "override")]
    overrides: Option<PathBuf>,

    /// Write the session artifact to this file
    #[arg(long)]
    session_out: Option<PathBuf>,
}

/// Hex SHA-256 of a file, used to identify which build was compared.
fn wasm_digest(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read WASM {}", path.display()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

impl CompareCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        if !self.wasm.is_file() {
            bail!("WASM file not found: {}", self.wasm.display());
        }
        let digest = wasm_digest(&self.wasm)?;

        let tx = TransactionRecord::load(&self.tx)?;
        let mut inputs = ReplayInputs::from_transaction(&tx)
            .with_context(|| format!("cannot prepare replay of {}", tx.hash))?
            .with_network(self.network);
        if let Some(path) = &self.overrides {
            inputs = inputs.with_overrides(load_overrides(path)?);
        }
        let inputs = Arc::new(inputs);

        let chain_target = Target::Network(self.network);
        let wasm_target = Target::Wasm(self.wasm.clone());
        let chain_fetcher = ctx.fetcher_for(&self.snapshot, &chain_target)?;
        let wasm_fetcher = ctx.fetcher_for(&self.snapshot, &wasm_target)?;

        let primary = BranchSpec::new(chain_target.clone(), chain_fetcher.clone(), inputs.clone());
        let compare = BranchSpec::new(wasm_target.clone(), wasm_fetcher.clone(), inputs);
        let primary_label = primary.label_for(0);
        let compare_label = compare.label_for(1);

        info!(tx = %tx.hash, wasm = %self.wasm.display(), sha256 = %digest, "comparing against local build");
        if !ctx.json {
            println!("WASM {} (sha256 {})", self.wasm.display(), digest);
        }

        let outcome = ctx
            .orchestrator()
            .replay_pair(&ctx.cancel, primary, compare)
            .await;
        flush_caches(&[&*chain_fetcher, &*wasm_fetcher]);

        let mut session = ReplaySession::new(tx.hash.clone());
        session.record_branch(primary_label, chain_target, &outcome.primary);
        session.record_branch(compare_label, wasm_target, &outcome.compare);
        let session = session.with_comparison(outcome.comparison());

        finish_session(
            ctx,
            &session,
            self.session_out.as_deref(),
            &[&outcome.primary, &outcome.compare],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasm_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wasm");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            wasm_digest(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
