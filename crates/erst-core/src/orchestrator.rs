//! Replay orchestration.
//!
//! A replay is one or more *branches*. Each branch fetches the ledger entries
//! the transaction touched from its own [`EntryFetcher`], overlays any manual
//! overrides, and hands the result to the shared [`SimulationAdapter`].
//!
//! ## Usage
//!
//! ```ignore
//! let inputs = Arc::new(ReplayInputs::from_transaction(&tx)?);
//! let orchestrator = ReplayOrchestrator::new(Arc::new(ProcessSimulator::from_env()));
//!
//! let outcome = orchestrator
//!     .replay_pair(
//!         &cancel,
//!         BranchSpec::new(Target::Network(Network::Mainnet), mainnet, inputs.clone()),
//!         BranchSpec::new(Target::Network(Network::Testnet), testnet, inputs),
//!     )
//!     .await;
//! if let Some(diff) = outcome.comparison() {
//!     println!("{}", diff.summary);
//! }
//! ```
//!
//! ## Concurrency
//!
//! Every branch of [`ReplayOrchestrator::replay`] runs as its own tokio task.
//! Results are collected only after all tasks finished and are returned in
//! input order. A failed branch does not stop its siblings; only the shared
//! [`CancellationToken`] does.

use std::collections::HashMap;
use std::sync::Arc;

use erst_ledger_keys::extract_keys;
use erst_state_fetcher::EntryFetcher;
use erst_types::{
    CancellationToken, KeySet, Network, RecordKey, ReplayRequest, ReplayResponse, Target,
    TransactionRecord,
};
use tracing::{info, info_span, warn, Instrument};

use crate::compare::{compare, ComparisonResult};
use crate::error::{BranchError, ReplayError};
use crate::simulation::SimulationAdapter;

/// Outcome of one branch.
pub type BranchResult = Result<ReplayResponse, BranchError>;

/// Transaction data shared by every branch of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayInputs {
    pub envelope_xdr: String,
    pub result_meta_xdr: String,
    /// Ledger keys to fetch, usually extracted from `result_meta_xdr`.
    pub keys: KeySet,
    /// Entries supplied by hand. These win over fetched entries.
    pub overrides: HashMap<RecordKey, String>,
    /// Network the transaction originally ran on. Sent with WASM branches,
    /// whose target carries no network of its own.
    pub network: Option<Network>,
}

impl ReplayInputs {
    pub fn new(
        envelope_xdr: impl Into<String>,
        result_meta_xdr: impl Into<String>,
        keys: KeySet,
    ) -> Self {
        Self {
            envelope_xdr: envelope_xdr.into(),
            result_meta_xdr: result_meta_xdr.into(),
            keys,
            overrides: HashMap::new(),
            network: None,
        }
    }

    /// Extract the touched keys once, before any branch is started.
    pub fn from_transaction(tx: &TransactionRecord) -> Result<Self, ReplayError> {
        let keys = extract_keys(&tx.result_meta_xdr)?;
        info!(tx = %tx.hash, keys = keys.len(), "extracted ledger keys");
        Ok(Self::new(
            tx.envelope_xdr.clone(),
            tx.result_meta_xdr.clone(),
            keys,
        ))
    }

    pub fn with_overrides(mut self, overrides: HashMap<RecordKey, String>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    fn request_for(&self, target: &Target, mut entries: HashMap<RecordKey, String>) -> ReplayRequest {
        entries.extend(
            self.overrides
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let request = ReplayRequest::new(self.envelope_xdr.clone(), self.result_meta_xdr.clone())
            .with_entries(entries);
        match target {
            Target::Network(network) => request.with_network(*network),
            Target::Wasm(path) => {
                let request = request.with_wasm_path(path.clone());
                match self.network {
                    Some(network) => request.with_network(network),
                    None => request,
                }
            }
        }
    }
}

/// One branch of a replay.
#[derive(Debug, Clone)]
pub struct BranchSpec {
    pub target: Target,
    pub fetcher: Arc<EntryFetcher>,
    pub inputs: Arc<ReplayInputs>,
    /// Overrides the positional label.
    pub label: Option<String>,
}

impl BranchSpec {
    pub fn new(target: Target, fetcher: Arc<EntryFetcher>, inputs: Arc<ReplayInputs>) -> Self {
        Self {
            target,
            fetcher,
            inputs,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// `primary:<target>` for the first branch, `compare:<target>` for the
    /// second and `compare-N:<target>` after that.
    pub fn label_for(&self, index: usize) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        let role = match index {
            0 => "primary".to_string(),
            1 => "compare".to_string(),
            n => format!("compare-{}", n),
        };
        format!("{}:{}", role, self.target.id())
    }
}

/// Results of a two-branch replay.
#[derive(Debug)]
pub struct PairOutcome {
    pub primary: BranchResult,
    pub compare: BranchResult,
}

impl PairOutcome {
    /// Diff of the two responses, when both branches produced one.
    pub fn comparison(&self) -> Option<ComparisonResult> {
        match (&self.primary, &self.compare) {
            (Ok(left), Ok(right)) => Some(compare(left, right)),
            _ => None,
        }
    }
}

/// Runs replay branches against one simulator.
#[derive(Clone)]
pub struct ReplayOrchestrator {
    simulator: Arc<dyn SimulationAdapter>,
}

impl std::fmt::Debug for ReplayOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayOrchestrator")
            .field("simulator", &self.simulator.name())
            .finish()
    }
}

impl ReplayOrchestrator {
    pub fn new(simulator: Arc<dyn SimulationAdapter>) -> Self {
        Self { simulator }
    }

    pub fn simulator(&self) -> &Arc<dyn SimulationAdapter> {
        &self.simulator
    }

    /// Run one branch on the current task.
    pub async fn replay_single(&self, cancel: &CancellationToken, branch: BranchSpec) -> BranchResult {
        let label = branch.label_for(0);
        let span = info_span!("replay_branch", branch = %label);
        run_branch(self.simulator.clone(), cancel.clone(), branch)
            .instrument(span)
            .await
            .map_err(|error| {
                warn!(branch = %label, error = %error, "replay branch failed");
                BranchError::new(label, error)
            })
    }

    /// Run every branch concurrently and return their results in input order.
    pub async fn replay(&self, cancel: &CancellationToken, branches: Vec<BranchSpec>) -> Vec<BranchResult> {
        let handles: Vec<_> = branches
            .into_iter()
            .enumerate()
            .map(|(index, branch)| {
                let label = branch.label_for(index);
                let span = info_span!("replay_branch", branch = %label);
                let task = run_branch(self.simulator.clone(), cancel.clone(), branch).instrument(span);
                (label, tokio::spawn(task))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (label, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => Err(ReplayError::Internal(format!(
                    "branch panicked: {}",
                    panic_message(e.into_panic())
                ))),
                Err(e) => Err(ReplayError::Internal(e.to_string())),
            };
            results.push(outcome.map_err(|error| {
                warn!(branch = %label, error = %error, "replay branch failed");
                BranchError::new(label, error)
            }));
        }
        results
    }

    /// Replay `primary` and `compare` side by side.
    pub async fn replay_pair(
        &self,
        cancel: &CancellationToken,
        primary: BranchSpec,
        compare: BranchSpec,
    ) -> PairOutcome {
        let mut results = self.replay(cancel, vec![primary, compare]).await.into_iter();
        let mut next = |role: &str| {
            results.next().unwrap_or_else(|| {
                Err(BranchError::new(
                    role,
                    ReplayError::Internal("branch result missing".to_string()),
                ))
            })
        };
        let primary = next("primary");
        let compare = next("compare");
        PairOutcome { primary, compare }
    }
}

async fn run_branch(
    simulator: Arc<dyn SimulationAdapter>,
    cancel: CancellationToken,
    branch: BranchSpec,
) -> Result<ReplayResponse, ReplayError> {
    if cancel.is_cancelled() {
        return Err(ReplayError::Cancelled);
    }
    let inputs = &branch.inputs;

    info!(
        source = branch.fetcher.source_name(),
        keys = inputs.keys.len(),
        "fetching ledger entries"
    );
    let (fetched, stats) = branch
        .fetcher
        .fetch_with_stats(&cancel, inputs.keys.iter().cloned())
        .await?;
    info!(
        fetched = stats.fetched,
        cache_hits = stats.cache_hits,
        missing = stats.missing,
        "ledger entries ready"
    );
    let request = inputs.request_for(&branch.target, fetched);

    info!(
        simulator = simulator.name(),
        entries = request.ledger_entries.len(),
        "simulating"
    );
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ReplayError::Cancelled),
        result = simulator.simulate(&request) => result?,
    };

    info!(
        status = %response.status,
        events = response.events.len(),
        logs = response.logs.len(),
        "branch complete"
    );
    Ok(response)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
