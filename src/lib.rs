//! kat_search - KickAss episode-search provider
//!
//! This library turns a show and an optional season/episode target into
//! search strings, runs them page by page against the KickAss JSON search
//! API, and publishes the most recent TV uploads as a rate-limited RSS feed.
//!
//! The pipeline, leaf first:
//!
//! - [`QueryBuilder`] derives deduplicated search strings from a show's names
//!   and its numbering or air-date convention
//! - [`PagedSearcher`] fetches a bounded number of result pages per query and
//!   normalizes them, skipping pages that fail to load or parse
//! - [`RefreshGate`] caches the unfiltered result batch and refreshes it at
//!   most once per minimum interval
//! - [`render_feed`] renders a batch as RSS 2.0
//!
//! [`KickAssProvider`] wires these together behind a [`ProviderConfig`].

mod cache;
mod config;
mod feed;
mod indexer;
mod metadata_retrieval;
mod naming;
mod provider;
mod quality;
mod query;
mod refresh;
mod show;

// Re-export error types
pub use cache::CacheError;
pub use config::ConfigError;
pub use feed::FeedError;
pub use indexer::{FetchError, PageError};
pub use metadata_retrieval::MetadataRetrievalError;
pub use show::LookupError;

pub use config::ProviderConfig;
pub use feed::render_feed;
pub use indexer::{
    Fetch, HttpTransport, PagedSearcher, Search, StatusClass, build_search_url, canonical_title,
    classify_status, search_endpoint,
};
pub use metadata_retrieval::{
    CachedSeriesSource, SeriesEpisode, SeriesLibrary, SeriesSource, TvMazeSource, TvSeries,
};
pub use naming::{
    DEFAULT_EPISODE_PATTERN, MAX_PADDING_WIDTH, NameVariants, SceneNames, format_air_date,
    format_episode_token, is_valid_episode_pattern, sanitize_scene_name,
};
pub use provider::{KickAssProvider, PROVIDER_NAME};
pub use quality::{Quality, QualityClassifier, SceneQuality};
pub use query::{QueryBuilder, airbydate_season_range};
pub use refresh::{CacheState, Clock, DEFAULT_MIN_INTERVAL, RefreshGate, SystemClock};
pub use show::{
    EpisodeLookup, EpisodeRecord, EpisodeStatus, EpisodeTarget, Overview, RecordedStatus,
    ResultItem, Show, StatusClassifier,
};

use thiserror::Error;

/// Top-level error type for kat_search operations
#[derive(Debug, Error)]
pub enum KatSearchError {
    /// Error loading or validating configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error rendering the RSS feed
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error during metadata retrieval
    #[error("Metadata retrieval error: {0}")]
    MetadataRetrieval(#[from] MetadataRetrievalError),

    /// Error looking up episodes
    #[error("Episode lookup error: {0}")]
    Lookup(#[from] LookupError),
}
