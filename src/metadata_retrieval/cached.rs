//! Cached metadata provider implementation
//!
//! This module provides a caching wrapper for metadata providers that
//! automatically stores and retrieves episode listings from a local cache.

use super::{MetadataRetrievalError, SeriesSource, TvSeries};
use crate::cache::{CacheError, CacheStorage};
use std::time::Duration;
use tracing::{debug, warn};

/// A caching wrapper for metadata providers
///
/// Listings are persisted across runs; cache failures never fail a lookup,
/// they only cost a network request.
pub struct CachedSeriesSource<P>
where
    P: SeriesSource,
{
    provider: P,
    cache: CacheStorage<TvSeries>,
}

impl<P> CachedSeriesSource<P>
where
    P: SeriesSource,
{
    /// Creates a new cached metadata provider wrapping the given provider
    pub(crate) fn new(provider: P, cache: CacheStorage<TvSeries>) -> Self {
        Self { provider, cache }
    }

    /// Wraps `provider` with the platform's persistent metadata cache
    pub fn open(provider: P, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let cache = CacheStorage::open("metadata", ttl)?;
        Ok(Self::new(provider, cache))
    }
}

impl<P> SeriesSource for CachedSeriesSource<P>
where
    P: SeriesSource,
{
    fn fetch_series(&self, series_name: &str) -> Result<TvSeries, MetadataRetrievalError> {
        match self.cache.load(series_name) {
            Ok(Some(series)) => {
                debug!(series = series_name, "episode listing served from cache");
                return Ok(series);
            }
            Ok(None) => {}
            Err(e) => warn!(series = series_name, error = %e, "ignoring unreadable cache entry"),
        }

        let series = self.provider.fetch_series(series_name)?;

        if let Err(e) = self.cache.store(series_name, &series) {
            warn!(series = series_name, error = %e, "failed to cache episode listing");
        }

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::SeriesEpisode;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl SeriesSource for CountingSource {
        fn fetch_series(&self, series_name: &str) -> Result<TvSeries, MetadataRetrievalError> {
            self.calls.set(self.calls.get() + 1);
            Ok(TvSeries {
                name: series_name.to_string(),
                episodes: vec![SeriesEpisode {
                    season: 1,
                    number: 1,
                    airdate: None,
                }],
            })
        }
    }

    #[test]
    fn test_second_fetch_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStorage::open_in(dir.path(), "metadata", None).unwrap();
        let source = CachedSeriesSource::new(CountingSource { calls: Cell::new(0) }, cache);

        let first = source.fetch_series("Lost").unwrap();
        let second = source.fetch_series("Lost").unwrap();

        assert_eq!(first, second);
        assert_eq!(source.provider.calls.get(), 1);
    }
}
