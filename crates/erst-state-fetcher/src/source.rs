//! Remote fetch boundary.
//!
//! The fetcher never talks to a network itself. Anything that can map a batch
//! of keys to encoded entries (an RPC client, a snapshot file, an in-memory
//! fixture) implements [`LedgerEntrySource`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use erst_types::RecordKey;

use crate::config::MAX_BATCH_SIZE;

/// Batch lookup of ledger entries by canonical key.
#[async_trait::async_trait]
pub trait LedgerEntrySource: Send + Sync {
    /// Fetch entries for `keys`. Keys absent from the source are simply
    /// missing from the returned map.
    ///
    /// Implementations may reject batches larger than [`max_batch_size`](Self::max_batch_size).
    async fn fetch_batch(&self, keys: &[RecordKey]) -> Result<HashMap<RecordKey, String>>;

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    /// Short name for logs.
    fn name(&self) -> &str {
        "source"
    }
}

#[async_trait::async_trait]
impl<S: LedgerEntrySource + ?Sized> LedgerEntrySource for Arc<S> {
    async fn fetch_batch(&self, keys: &[RecordKey]) -> Result<HashMap<RecordKey, String>> {
        (**self).fetch_batch(keys).await
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
