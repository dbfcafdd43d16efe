use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use erst_core::{BranchSpec, ReplayInputs, ReplaySession};
use erst_types::{Network, Target, TransactionRecord};
use tracing::info;

use super::{finish_session, flush_caches, load_overrides, CliContext};

#[derive(Parser, Debug)]
#[command(about = "Replay a transaction, optionally on a second network")]
pub struct DebugCmd {
    /// Transaction JSON file (hash, envelope_xdr, result_meta_xdr)
    #[arg(long)]
    tx: PathBuf,

    /// Network of the primary replay
    #[arg(long, default_value = "testnet")]
    network: Network,

    /// Ledger snapshot for the primary network
    #[arg(long)]
    snapshot: PathBuf,

    /// Network to replay against for comparison
    #[arg(long, requires = "compare_snapshot")]
    compare_network: Option<Network>,

    /// Ledger snapshot for the comparison network
    #[arg(long, requires = "compare_network")]
    compare_snapshot: Option<PathBuf>,

    /// Ledger entries that replace fetched ones (snapshot file layout)
    #[arg(long = "override")]
    overrides: Option<PathBuf>,

    /// Write the session artifact to this file
    #[arg(long)]
    session_out: Option<PathBuf>,
}

impl DebugCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let tx = TransactionRecord::load(&self.tx)?;
        let mut inputs = ReplayInputs::from_transaction(&tx)
            .with_context(|| format!("cannot prepare replay of {}", tx.hash))?;
        if let Some(path) = &self.overrides {
            inputs = inputs.with_overrides(load_overrides(path)?);
        }
        let inputs = Arc::new(inputs);

        let primary_target = Target::Network(self.network);
        let primary_fetcher = ctx.fetcher_for(&self.snapshot, &primary_target)?;
        let primary = BranchSpec::new(primary_target.clone(), primary_fetcher.clone(), inputs.clone());
        let primary_label = primary.label_for(0);

        let orchestrator = ctx.orchestrator();
        let mut session = ReplaySession::new(tx.hash.clone());

        match (self.compare_network, &self.compare_snapshot) {
            (Some(network), Some(snapshot)) => {
                let compare_target = Target::Network(network);
                let compare_fetcher = ctx.fetcher_for(snapshot, &compare_target)?;
                let compare = BranchSpec::new(compare_target.clone(), compare_fetcher.clone(), inputs);
                let compare_label = compare.label_for(1);

                info!(tx = %tx.hash, primary = %primary_label, compare = %compare_label, "replaying pair");
                let outcome = orchestrator.replay_pair(&ctx.cancel, primary, compare).await;
                flush_caches(&[&*primary_fetcher, &*compare_fetcher]);

                session.record_branch(primary_label, primary_target, &outcome.primary);
                session.record_branch(compare_label, compare_target, &outcome.compare);
                let session = session.with_comparison(outcome.comparison());
                finish_session(
                    ctx,
                    &session,
                    self.session_out.as_deref(),
                    &[&outcome.primary, &outcome.compare],
                )
            }
            _ => {
                info!(tx = %tx.hash, branch = %primary_label, "replaying");
                let result = orchestrator.replay_single(&ctx.cancel, primary).await;
                flush_caches(&[&*primary_fetcher]);

                session.record_branch(primary_label, primary_target, &result);
                finish_session(ctx, &session, self.session_out.as_deref(), &[&result])
            }
        }
    }
}
