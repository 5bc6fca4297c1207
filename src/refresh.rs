//! Rate-limited feed cache
//!
//! [`RefreshGate`] keeps the most recent unfiltered result batch and only
//! asks the indexer again once the minimum interval has passed since the
//! last successful refresh. The interval is a hard floor: no caller can
//! force an earlier refresh.
//!
//! Concurrency discipline: the cached state is only ever replaced as a
//! whole, under a write lock, by the single caller holding the refresh lock.
//! A caller arriving while a refresh is in flight is served the previous
//! batch instead of starting a second remote round.

use crate::indexer::Search;
use crate::show::ResultItem;
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default minimum time between two remote refresh rounds
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The monotonic system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// The cached result batch and when it was fetched
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    /// Completion time of the last successful refresh, `None` before the first
    pub last_fetch: Option<Instant>,
    /// Results of the last successful refresh
    pub batch: Arc<Vec<ResultItem>>,
}

/// Serves the cached feed batch, refreshing it at most once per interval
pub struct RefreshGate<S, C = SystemClock> {
    /// Provider name used in log entries
    name: String,
    searcher: Arc<S>,
    min_interval: Duration,
    clock: C,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
}

impl<S> RefreshGate<S, SystemClock>
where
    S: Search,
{
    /// Creates a gate around `searcher` using the system clock
    pub fn new(name: impl Into<String>, searcher: Arc<S>, min_interval: Duration) -> Self {
        Self::with_clock(name, searcher, min_interval, SystemClock)
    }
}

impl<S, C> RefreshGate<S, C>
where
    S: Search,
    C: Clock,
{
    /// Creates a gate with an explicit clock
    pub fn with_clock(
        name: impl Into<String>,
        searcher: Arc<S>,
        min_interval: Duration,
        clock: C,
    ) -> Self {
        Self {
            name: name.into(),
            searcher,
            min_interval,
            clock,
            state: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the current feed batch, refreshing it first when stale
    ///
    /// A refresh that yields no items leaves the cache untouched and stale,
    /// so the next call retries.
    pub fn get(&self) -> Arc<Vec<ResultItem>> {
        if let Some(batch) = self.fresh_batch() {
            return batch;
        }

        let _guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!(provider = %self.name, "refresh in flight, serving cached batch");
                return self.snapshot().batch;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        // A refresh may have completed between the freshness check and the lock
        if let Some(batch) = self.fresh_batch() {
            return batch;
        }

        info!(provider = %self.name, "refreshing feed cache");
        let items = self.searcher.search("");

        if items.is_empty() {
            warn!(provider = %self.name, "feed refresh returned no items, cache stays stale");
            return self.snapshot().batch;
        }

        let batch = Arc::new(items);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = CacheState {
            last_fetch: Some(self.clock.now()),
            batch: Arc::clone(&batch),
        };
        debug!(provider = %self.name, items = batch.len(), "feed cache replaced");

        batch
    }

    /// Returns a copy of the cached state without refreshing
    pub fn snapshot(&self) -> CacheState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true when the cache is within the minimum interval
    pub fn is_fresh(&self) -> bool {
        self.fresh_batch().is_some()
    }

    /// Returns the cached batch if it is still fresh
    fn fresh_batch(&self) -> Option<Arc<Vec<ResultItem>>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let last_fetch = state.last_fetch?;

        if self.clock.now().saturating_duration_since(last_fetch) < self.min_interval {
            Some(Arc::clone(&state.batch))
        } else {
            None
        }
    }
}
