//! Show and episode data model
//!
//! This module describes the shows and episodes the provider searches for,
//! along with the collaborator traits the host uses to answer episode
//! lookups and download-status questions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by an episode lookup collaborator
#[derive(Debug, Error)]
pub enum LookupError {
    /// The show is unknown to the lookup backend
    #[error("Show not found: {0}")]
    ShowNotFound(String),

    /// The backend failed to answer the query
    #[error("Episode lookup failed: {0}")]
    Backend(String),
}

/// A show the provider can search for
///
/// Immutable for the duration of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    /// The canonical show name
    pub name: String,
    /// Alternate names the show is released under
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Whether episodes are identified by broadcast date instead of numbering
    #[serde(default)]
    pub air_by_date: bool,
}

impl Show {
    /// Creates a numbered show without aliases
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            air_by_date: false,
        }
    }

    /// Marks this show as air-by-date
    pub fn air_by_date(mut self) -> Self {
        self.air_by_date = true;
        self
    }

    /// Adds an alternate release name
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Recorded download status of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    /// Not yet broadcast
    Unaired,
    /// Deliberately not downloaded
    Skipped,
    /// Aired and missing
    Wanted,
    /// Downloaded in a quality below the show's target
    Downloaded,
    /// Downloaded and final
    Archived,
    /// Snatched and waiting for the download client
    Snatched,
    /// Present on disk but not downloaded by us
    Ignored,
}

/// What the orchestrator wants to do with an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overview {
    /// The episode should be searched for
    Wanted,
    /// A better quality release should be searched for
    Qual,
    /// Nothing left to do
    Good,
    /// Excluded from searching
    Skipped,
    /// Not available yet
    Unaired,
    /// Already snatched
    Snatched,
}

impl Overview {
    /// Returns true when an episode with this overview contributes queries
    pub fn is_searchable(self) -> bool {
        matches!(self, Overview::Wanted | Overview::Qual)
    }
}

/// A single episode as known by the host's episode database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Season number (0 for specials)
    pub season: u32,
    /// Episode number within the season
    pub episode: u32,
    /// Original broadcast date, if known
    pub airdate: Option<NaiveDate>,
    /// Recorded download status
    pub status: EpisodeStatus,
}

/// The content a search should target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeTarget {
    /// A numbered episode
    Numbered { season: u32, episode: u32 },
    /// An episode identified by its broadcast date
    AirDate(NaiveDate),
}

/// A normalized search result
///
/// The title has its separators canonicalized and the link is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Canonicalized release title
    pub title: String,
    /// Torrent download link
    pub link: String,
}

/// Episode lookups against the host's episode database
pub trait EpisodeLookup {
    /// Returns every known episode of the given season
    fn episodes_in_season(
        &self,
        show: &Show,
        season: u32,
    ) -> Result<Vec<EpisodeRecord>, LookupError>;

    /// Returns every episode aired within `[from, to]`, both ends inclusive
    fn episodes_aired_between(
        &self,
        show: &Show,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EpisodeRecord>, LookupError>;
}

/// Maps an episode's recorded status to an [`Overview`]
pub trait StatusClassifier {
    fn overview(&self, show: &Show, episode: &EpisodeRecord) -> Overview;
}

/// Classifier that trusts the recorded status as-is
///
/// `Downloaded` episodes are treated as upgrade candidates, since the host
/// only keeps that status while a better quality is still wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordedStatus;

impl StatusClassifier for RecordedStatus {
    fn overview(&self, _show: &Show, episode: &EpisodeRecord) -> Overview {
        match episode.status {
            EpisodeStatus::Wanted => Overview::Wanted,
            EpisodeStatus::Downloaded => Overview::Qual,
            EpisodeStatus::Archived | EpisodeStatus::Ignored => Overview::Good,
            EpisodeStatus::Skipped => Overview::Skipped,
            EpisodeStatus::Unaired => Overview::Unaired,
            EpisodeStatus::Snatched => Overview::Snatched,
        }
    }
}
