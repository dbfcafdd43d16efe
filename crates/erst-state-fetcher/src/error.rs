//! Fetch errors.

use std::fmt;

/// Errors returned by [`EntryFetcher::fetch_entries`](crate::EntryFetcher::fetch_entries).
#[derive(Debug)]
pub enum FetchError {
    /// A batch request to the source failed. No partial result is returned.
    Batch {
        /// Zero-based index of the failed batch
        batch_index: usize,
        /// Requested keys not resolved when the failure was observed
        unresolved: usize,
        source: anyhow::Error,
    },
    /// The shared cancellation token fired before the fetch completed.
    Cancelled,
    /// The fetcher was configured with values it cannot honour.
    InvalidConfig(String),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Batch {
                batch_index,
                unresolved,
                source,
            } => write!(
                f,
                "ledger entry batch {} failed ({} keys unresolved): {}",
                batch_index, unresolved, source
            ),
            FetchError::Cancelled => write!(f, "ledger entry fetch cancelled"),
            FetchError::InvalidConfig(msg) => write!(f, "invalid fetcher config: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Batch { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
