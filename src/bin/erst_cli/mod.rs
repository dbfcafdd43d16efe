//! Subcommands of the `erst` binary and the state they share.

pub mod compare;
pub mod debug;
pub mod keys;
pub mod logging;
pub mod output;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use erst_core::{BranchResult, ProcessSimulator, ReplayOrchestrator, ReplaySession};
use erst_state_fetcher::{EntryCache, EntryFetcher, FetcherConfig, SnapshotFile, SnapshotSource, TracingProgress};
use erst_types::paths::default_cache_dir;
use erst_types::{CancellationToken, RecordKey, Target};

/// Settings resolved from global flags and the environment.
pub struct CliContext {
    pub json: bool,
    pub fetcher_config: FetcherConfig,
    pub cache_dir: Option<PathBuf>,
    pub simulator: ProcessSimulator,
    pub cancel: CancellationToken,
}

impl CliContext {
    pub fn new(
        json: bool,
        batch_size: Option<usize>,
        no_cache: bool,
        cache_dir: Option<PathBuf>,
        simulator: Option<PathBuf>,
        simulator_args: Vec<String>,
    ) -> Result<Self> {
        let mut fetcher_config = FetcherConfig::from_env();
        if let Some(size) = batch_size {
            fetcher_config = fetcher_config.batch_size(size);
        }
        if no_cache {
            fetcher_config = fetcher_config.cache_enabled(false);
        }
        fetcher_config
            .validate()
            .context("invalid fetch settings")?;

        let mut sim = ProcessSimulator::from_env();
        if let Some(path) = simulator {
            let timeout = sim.timeout();
            sim = ProcessSimulator::new(path);
            if let Some(timeout) = timeout {
                sim = sim.with_timeout(timeout);
            }
        }
        if !simulator_args.is_empty() {
            sim = sim.with_args(simulator_args);
        }

        Ok(Self {
            json,
            fetcher_config,
            cache_dir,
            simulator: sim,
            cancel: CancellationToken::new(),
        })
    }

    pub fn orchestrator(&self) -> ReplayOrchestrator {
        ReplayOrchestrator::new(Arc::new(self.simulator.clone()))
    }

    /// One fetcher per target so entries from different ledgers never share a
    /// cache.
    pub fn fetcher_for(&self, snapshot: &Path, target: &Target) -> Result<Arc<EntryFetcher>> {
        let source = SnapshotSource::from_file(snapshot)?;
        let mut fetcher = EntryFetcher::new(Arc::new(source), self.fetcher_config.clone())
            .with_context(|| format!("cannot build fetcher for {}", target))?
            .with_progress(Arc::new(TracingProgress::new(target.id())));

        if self.fetcher_config.cache_enabled {
            if let Some(dir) = &self.cache_dir {
                let cache = EntryCache::with_storage(dir.join(cache_dir_name(target)))?;
                fetcher = fetcher.with_cache(cache);
            }
        }
        Ok(Arc::new(fetcher))
    }
}

/// `--cache-dir` without a value falls back to the user cache directory.
pub fn resolve_cache_dir(flag: Option<Option<PathBuf>>) -> Option<PathBuf> {
    flag.map(|dir| dir.unwrap_or_else(default_cache_dir))
}

fn cache_dir_name(target: &Target) -> String {
    target
        .id()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

/// Write cached entries back to disk, logging rather than failing.
pub fn flush_caches(fetchers: &[&EntryFetcher]) {
    for fetcher in fetchers {
        if let Some(cache) = fetcher.cache() {
            if let Err(e) = cache.flush() {
                tracing::warn!(error = %e, "failed to persist entry cache");
            }
        }
    }
}

/// Manual entries, in the same layout as a snapshot file.
pub fn load_overrides(path: &Path) -> Result<HashMap<RecordKey, String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read overrides {}", path.display()))?;
    let file = SnapshotFile::parse(&data)
        .with_context(|| format!("Failed to parse overrides {}", path.display()))?;
    Ok(file.ledger_entries)
}

/// Print the session, write it to `session_out` when asked, and fail if any
/// branch failed.
pub fn finish_session(
    ctx: &CliContext,
    session: &ReplaySession,
    session_out: Option<&Path>,
    results: &[&BranchResult],
) -> Result<()> {
    output::print_session(session, ctx.json)?;
    if let Some(path) = session_out {
        session.write_to(path)?;
        tracing::info!(path = %path.display(), "session written");
    }

    let failed: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(|e| e.to_string())
        .collect();
    if !failed.is_empty() {
        anyhow::bail!("{} branch(es) failed: {}", failed.len(), failed.join("; "));
    }
    Ok(())
}
