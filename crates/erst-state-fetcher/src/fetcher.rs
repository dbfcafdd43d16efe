//! Batched ledger entry retrieval.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use erst_types::{CancellationToken, RecordKey};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::EntryCache;
use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::progress::FetchProgress;
use crate::source::LedgerEntrySource;
use crate::types::FetchStats;

/// Resolves ledger keys to encoded entries through a [`LedgerEntrySource`].
///
/// Keys are deduplicated, served from the cache when possible, and the rest
/// are requested in batches of at most `batch_size`. Up to
/// `max_concurrent_batches` requests are in flight at once.
pub struct EntryFetcher {
    source: Arc<dyn LedgerEntrySource>,
    config: FetcherConfig,
    /// `config.batch_size` clamped to what the source accepts.
    batch_size: usize,
    cache: Option<EntryCache>,
    progress: Option<Arc<dyn FetchProgress>>,
    last_stats: RwLock<FetchStats>,
}

impl std::fmt::Debug for EntryFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryFetcher")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("batch_size", &self.batch_size)
            .field("cached", &self.cache.as_ref().map(EntryCache::len))
            .finish()
    }
}

impl EntryFetcher {
    pub fn new(
        source: Arc<dyn LedgerEntrySource>,
        config: FetcherConfig,
    ) -> Result<Self, FetchError> {
        config.validate()?;
        let source_limit = source.max_batch_size();
        if source_limit == 0 {
            return Err(FetchError::InvalidConfig(format!(
                "source '{}' accepts no keys per batch",
                source.name()
            )));
        }
        let batch_size = config.batch_size.min(source_limit);
        let cache = config.cache_enabled.then(EntryCache::new);

        Ok(Self {
            source,
            config,
            batch_size,
            cache,
            progress: None,
            last_stats: RwLock::new(FetchStats::default()),
        })
    }

    /// Use `cache` (typically one with disk storage) and enable caching.
    pub fn with_cache(mut self, cache: EntryCache) -> Self {
        self.config.cache_enabled = true;
        self.cache = Some(cache);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn FetchProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Keys per source request actually used.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn cache(&self) -> Option<&EntryCache> {
        self.cache.as_ref()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Statistics of the last call to complete.
    ///
    /// Calls running concurrently on one fetcher overwrite each other here;
    /// use [`fetch_with_stats`](Self::fetch_with_stats) to get the numbers
    /// for a specific call.
    pub fn last_stats(&self) -> FetchStats {
        self.last_stats.read().clone()
    }

    /// Fetch the entries for `keys`.
    ///
    /// The returned map holds one entry per requested key the source knew
    /// about; keys the source does not return are absent. Any failed batch
    /// fails the whole call.
    pub async fn fetch_entries(
        &self,
        cancel: &CancellationToken,
        keys: impl IntoIterator<Item = RecordKey>,
    ) -> Result<HashMap<RecordKey, String>, FetchError> {
        self.fetch_with_stats(cancel, keys)
            .await
            .map(|(entries, _)| entries)
    }

    /// Like [`fetch_entries`](Self::fetch_entries), also returning the
    /// statistics of this call.
    pub async fn fetch_with_stats(
        &self,
        cancel: &CancellationToken,
        keys: impl IntoIterator<Item = RecordKey>,
    ) -> Result<(HashMap<RecordKey, String>, FetchStats), FetchError> {
        let started = Instant::now();
        let mut seen = HashSet::new();
        let unique: Vec<RecordKey> = keys
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .collect();

        if unique.is_empty() {
            *self.last_stats.write() = FetchStats::default();
            return Ok((HashMap::new(), FetchStats::default()));
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let total = unique.len();
        let (mut resolved, misses) = match &self.cache {
            Some(cache) => cache.partition(&unique),
            None => (HashMap::new(), unique),
        };
        let mut stats = FetchStats {
            requested: total,
            cache_hits: resolved.len(),
            ..FetchStats::default()
        };

        let batches: Vec<Vec<RecordKey>> = misses
            .chunks(self.batch_size)
            .map(<[RecordKey]>::to_vec)
            .collect();
        stats.batches = batches.len();
        debug!(
            source = self.source.name(),
            total,
            cache_hits = stats.cache_hits,
            batches = batches.len(),
            batch_size = self.batch_size,
            "fetching ledger entries"
        );

        let source = &self.source;
        let mut pending = std::pin::pin!(stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| async move {
                let result = source.fetch_batch(&batch).await;
                (index, batch, result)
            })
            .buffer_unordered(self.config.max_concurrent_batches));

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(source = self.source.name(), "fetch cancelled");
                    return Err(FetchError::Cancelled);
                }
                next = pending.next() => next,
            };
            let Some((index, batch, result)) = next else {
                break;
            };

            let mut found = match result {
                Ok(found) => found,
                Err(error) => {
                    let unresolved = total - resolved.len() - stats.missing;
                    warn!(
                        source = self.source.name(),
                        batch = index,
                        unresolved,
                        error = %error,
                        "ledger entry batch failed"
                    );
                    stats.elapsed = started.elapsed();
                    *self.last_stats.write() = stats;
                    return Err(FetchError::Batch {
                        batch_index: index,
                        unresolved,
                        source: error,
                    });
                }
            };

            let mut batch_entries = Vec::with_capacity(batch.len());
            for key in batch {
                match found.remove(&key) {
                    Some(value) => batch_entries.push((key, value)),
                    None => stats.missing += 1,
                }
            }
            debug!(
                batch = index,
                returned = batch_entries.len(),
                ignored = found.len(),
                "batch complete"
            );
            stats.fetched += batch_entries.len();
            if let Some(cache) = &self.cache {
                cache.put_many(batch_entries.iter().cloned());
            }
            resolved.extend(batch_entries);

            if let Some(progress) = &self.progress {
                progress.on_progress(resolved.len(), total);
            }
        }

        stats.elapsed = started.elapsed();
        *self.last_stats.write() = stats.clone();
        Ok((resolved, stats))
    }
}
