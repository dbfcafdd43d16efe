//! Fetcher configuration.

use erst_types::env_utils::{env_bool_or, env_var_or};

use crate::error::FetchError;

/// Hard upper bound on keys per source request.
pub const MAX_BATCH_SIZE: usize = 50;

/// Configuration for an [`EntryFetcher`](crate::EntryFetcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Keys per source request (1..=50).
    pub batch_size: usize,
    /// Batches allowed in flight at once. 1 means strictly sequential.
    pub max_concurrent_batches: usize,
    /// Reuse previously fetched entries within this fetcher.
    pub cache_enabled: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            max_concurrent_batches: 1,
            cache_enabled: true,
        }
    }
}

impl FetcherConfig {
    /// Defaults overridden by `ERST_BATCH_SIZE`, `ERST_FETCH_CONCURRENCY`
    /// and `ERST_CACHE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: env_var_or("ERST_BATCH_SIZE", defaults.batch_size),
            max_concurrent_batches: env_var_or(
                "ERST_FETCH_CONCURRENCY",
                defaults.max_concurrent_batches,
            ),
            cache_enabled: env_bool_or("ERST_CACHE", defaults.cache_enabled),
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_concurrent_batches(mut self, n: usize) -> Self {
        self.max_concurrent_batches = n;
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(FetchError::InvalidConfig(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        if self.max_concurrent_batches == 0 {
            return Err(FetchError::InvalidConfig(
                "max_concurrent_batches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.max_concurrent_batches, 1);
        assert!(config.cache_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(FetcherConfig::default().batch_size(0).validate().is_err());
        assert!(FetcherConfig::default().batch_size(51).validate().is_err());
        assert!(FetcherConfig::default().batch_size(1).validate().is_ok());
        assert!(FetcherConfig::default()
            .max_concurrent_batches(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("ERST_BATCH_SIZE", "10");
        std::env::set_var("ERST_FETCH_CONCURRENCY", "4");
        std::env::set_var("ERST_CACHE", "0");

        let config = FetcherConfig::from_env();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrent_batches, 4);
        assert!(!config.cache_enabled);

        std::env::remove_var("ERST_BATCH_SIZE");
        std::env::remove_var("ERST_FETCH_CONCURRENCY");
        std::env::remove_var("ERST_CACHE");
    }
}
