//! Fetch statistics.

use std::time::Duration;

/// Statistics about one fetch call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Unique keys requested.
    pub requested: usize,

    /// Keys served from the cache.
    pub cache_hits: usize,

    /// Keys returned by the source.
    pub fetched: usize,

    /// Keys the source did not know about.
    pub missing: usize,

    /// Source calls issued.
    pub batches: usize,

    /// Wall-clock time of the call.
    pub elapsed: Duration,
}

impl FetchStats {
    /// Whether every requested key resolved to an entry.
    pub fn is_complete(&self) -> bool {
        self.cache_hits + self.fetched == self.requested
    }

    /// Cache hit rate (0.0 to 1.0).
    pub fn cache_hit_rate(&self) -> f64 {
        if self.requested == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.requested as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completeness_and_hit_rate() {
        let stats = FetchStats {
            requested: 4,
            cache_hits: 1,
            fetched: 2,
            missing: 1,
            batches: 1,
            elapsed: Duration::ZERO,
        };
        assert!(!stats.is_complete());
        assert_eq!(stats.cache_hit_rate(), 0.25);
        assert_eq!(FetchStats::default().cache_hit_rate(), 0.0);
        assert!(FetchStats::default().is_complete());
    }
}
