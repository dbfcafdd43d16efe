//! Progress side channel for long fetches.

use tracing::info;

/// Observer notified after each completed batch.
///
/// Purely informational; attaching or removing an observer never changes the
/// fetch result.
pub trait FetchProgress: Send + Sync {
    fn on_progress(&self, fetched: usize, total: usize);
}

/// Logs progress through `tracing` under a label (usually the branch name).
#[derive(Debug, Clone)]
pub struct TracingProgress {
    label: String,
}

impl TracingProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl FetchProgress for TracingProgress {
    fn on_progress(&self, fetched: usize, total: usize) {
        info!(label = %self.label, fetched, total, "fetching ledger entries");
    }
}

impl<F> FetchProgress for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, fetched: usize, total: usize) {
        self(fetched, total)
    }
}
