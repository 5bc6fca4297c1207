//! The KickAss search provider
//!
//! [`KickAssProvider`] is what the orchestrator holds on to. It owns the
//! paged searcher and the feed cache, and exposes targeted season/episode
//! searches next to the rate-limited RSS feed.

use crate::config::{ConfigError, ProviderConfig};
use crate::feed::{FeedError, render_feed};
use crate::indexer::{Fetch, HttpTransport, PagedSearcher, Search};
use crate::naming::SceneNames;
use crate::quality::{Quality, QualityClassifier, SceneQuality};
use crate::query::QueryBuilder;
use crate::refresh::RefreshGate;
use crate::show::{EpisodeLookup, EpisodeTarget, ResultItem, Show, StatusClassifier};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Display name of the provider
pub const PROVIDER_NAME: &str = "KickAss";

/// Episode search provider backed by the KickAss JSON API
pub struct KickAssProvider<F = HttpTransport> {
    config: ProviderConfig,
    searcher: Arc<PagedSearcher<F>>,
    gate: RefreshGate<PagedSearcher<F>>,
    names: SceneNames,
    quality: Box<dyn QualityClassifier>,
}

impl KickAssProvider<HttpTransport> {
    /// Creates a provider talking HTTP to the configured indexer
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config.timeout(), config.user_agent.clone());
        Self::with_fetcher(config, transport)
    }
}

impl<F> KickAssProvider<F>
where
    F: Fetch,
{
    /// Creates a provider issuing its page requests through `fetcher`
    pub fn with_fetcher(config: ProviderConfig, fetcher: F) -> Result<Self, ConfigError> {
        config.validate()?;

        let searcher = Arc::new(PagedSearcher::new(
            PROVIDER_NAME,
            fetcher,
            config.endpoint()?,
            config.page_count,
        ));
        let gate = RefreshGate::new(PROVIDER_NAME, Arc::clone(&searcher), config.refresh_interval());

        info!(provider = PROVIDER_NAME, url = config.effective_base_url(), "initializing");

        Ok(Self {
            config,
            searcher,
            gate,
            names: SceneNames,
            quality: Box::new(SceneQuality),
        })
    }

    /// Replaces the quality classifier
    pub fn with_quality_classifier(mut self, classifier: impl QualityClassifier + 'static) -> Self {
        self.quality = Box::new(classifier);
        self
    }

    pub fn name(&self) -> &str {
        PROVIDER_NAME
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The indexer URL advertised in the feed
    pub fn url(&self) -> &str {
        self.config.effective_base_url()
    }

    /// Runs a single search directly against the indexer, bypassing the feed cache
    pub fn search(&self, query: &str) -> Vec<ResultItem> {
        if !self.is_enabled() {
            debug!(provider = PROVIDER_NAME, "provider disabled, skipping search");
            return Vec::new();
        }
        self.searcher.search(query)
    }

    /// Returns a query builder wired to this provider's naming settings
    pub fn query_builder<'a>(
        &'a self,
        lookup: &'a dyn EpisodeLookup,
        classifier: &'a dyn StatusClassifier,
    ) -> QueryBuilder<'a> {
        QueryBuilder::new(lookup, classifier, &self.names, &self.config.episode_pattern)
    }

    /// Searches every wanted episode of a season
    pub fn find_season(
        &self,
        lookup: &dyn EpisodeLookup,
        classifier: &dyn StatusClassifier,
        show: Option<&Show>,
        season: &str,
    ) -> Vec<ResultItem> {
        let queries = self.query_builder(lookup, classifier).season_queries(show, season);
        self.search_all(&queries)
    }

    /// Searches a single episode
    ///
    /// Without a target this is the unfiltered most-recent search.
    pub fn find_episode(
        &self,
        lookup: &dyn EpisodeLookup,
        classifier: &dyn StatusClassifier,
        show: Option<&Show>,
        target: Option<EpisodeTarget>,
    ) -> Vec<ResultItem> {
        if target.is_none() {
            return self.search("");
        }
        let queries = self.query_builder(lookup, classifier).episode_queries(show, target);
        self.search_all(&queries)
    }

    /// Returns the cached feed batch, refreshing it when the interval has passed
    pub fn cached_results(&self) -> Arc<Vec<ResultItem>> {
        if !self.is_enabled() {
            return Arc::new(Vec::new());
        }
        self.gate.get()
    }

    /// Renders the cached feed batch as RSS
    pub fn feed(&self) -> Result<String, FeedError> {
        let batch = self.cached_results();
        render_feed(PROVIDER_NAME, self.url(), &batch)
    }

    /// Classifies the quality of a result from its canonicalized title
    pub fn quality(&self, item: &ResultItem) -> Quality {
        self.quality.classify(&item.title)
    }

    /// Runs each query in order, keeping the first result per link
    fn search_all(&self, queries: &[String]) -> Vec<ResultItem> {
        if queries.is_empty() {
            debug!(provider = PROVIDER_NAME, "nothing to search");
            return Vec::new();
        }

        let mut seen = HashSet::new();
        queries
            .iter()
            .flat_map(|query| self.search(query))
            .filter(|item| seen.insert(item.link.clone()))
            .collect()
    }
}
