//! Ledger entry retrieval for transaction replay.
//!
//! [`EntryFetcher`] turns a set of canonical ledger keys into encoded ledger
//! entries through any [`LedgerEntrySource`]:
//!
//! - keys are deduplicated and served from an [`EntryCache`] when enabled
//! - the rest are requested in batches of at most 50 keys
//! - a shared cancellation token aborts the fetch between or during batches
//!
//! ```no_run
//! use std::sync::Arc;
//! use erst_state_fetcher::{EntryFetcher, FetcherConfig, SnapshotSource};
//! use erst_types::CancellationToken;
//!
//! # async fn example(keys: erst_types::KeySet) -> anyhow::Result<()> {
//! let source = SnapshotSource::from_file("snapshot.json".as_ref())?;
//! let fetcher = EntryFetcher::new(Arc::new(source), FetcherConfig::from_env())?;
//! let entries = fetcher
//!     .fetch_entries(&CancellationToken::new(), keys.into_iter())
//!     .await?;
//! println!("{} entries", entries.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod progress;
pub mod snapshot;
pub mod source;
pub mod types;

pub use cache::EntryCache;
pub use config::{FetcherConfig, MAX_BATCH_SIZE};
pub use error::FetchError;
pub use fetcher::EntryFetcher;
pub use progress::{FetchProgress, TracingProgress};
pub use snapshot::{SnapshotFile, SnapshotSource};
pub use source::LedgerEntrySource;
pub use types::FetchStats;
