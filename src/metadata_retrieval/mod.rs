//! Show metadata for episode lookups
//!
//! This module fetches episode listings (numbering and air dates) from a
//! metadata provider and exposes them through the [`EpisodeLookup`] trait the
//! query builder consumes. It backs the command line tool, which has no
//! episode database of its own.
mod cached;
mod tvmaze;
mod tvmaze_types;

pub use cached::CachedSeriesSource;
pub use tvmaze::TvMazeSource;

use crate::show::{EpisodeLookup, EpisodeRecord, EpisodeStatus, LookupError, Show};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataRetrievalError {
    /// Request to the metadata provider failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The requested series was not found
    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    /// The API returned invalid or unexpected data
    #[error("API returned invalid data: {0}")]
    InvalidData(String),
}

/// A single episode listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEpisode {
    /// The season number this episode belongs to
    pub season: u32,
    /// The episode number within the season
    pub number: u32,
    /// First broadcast date, if announced
    pub airdate: Option<NaiveDate>,
}

/// A TV series with its complete episode listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvSeries {
    /// The name of the TV series as known by the provider
    pub name: String,
    /// Every numbered episode, ordered by season and number
    pub episodes: Vec<SeriesEpisode>,
}

/// Trait for metadata providers that can fetch TV series information.
pub trait SeriesSource {
    /// Fetches the episode listing for a series by name.
    fn fetch_series(&self, series_name: &str) -> Result<TvSeries, MetadataRetrievalError>;
}

/// Episode lookup backed by a [`SeriesSource`]
///
/// Episodes that aired on or before `today` are considered wanted; later or
/// undated ones are unaired.
pub struct SeriesLibrary<P> {
    source: P,
    today: NaiveDate,
}

impl<P> SeriesLibrary<P>
where
    P: SeriesSource,
{
    /// Creates a library judging air dates against `today`
    pub fn new(source: P, today: NaiveDate) -> Self {
        Self { source, today }
    }

    fn records<F>(&self, show: &Show, keep: F) -> Result<Vec<EpisodeRecord>, LookupError>
    where
        F: Fn(&SeriesEpisode) -> bool,
    {
        let series = self.source.fetch_series(&show.name).map_err(|e| match e {
            MetadataRetrievalError::SeriesNotFound(name) => LookupError::ShowNotFound(name),
            other => LookupError::Backend(other.to_string()),
        })?;

        Ok(series
            .episodes
            .iter()
            .filter(|ep| keep(ep))
            .map(|ep| EpisodeRecord {
                season: ep.season,
                episode: ep.number,
                airdate: ep.airdate,
                status: match ep.airdate {
                    Some(date) if date <= self.today => EpisodeStatus::Wanted,
                    _ => EpisodeStatus::Unaired,
                },
            })
            .collect())
    }
}

impl<P> EpisodeLookup for SeriesLibrary<P>
where
    P: SeriesSource,
{
    fn episodes_in_season(
        &self,
        show: &Show,
        season: u32,
    ) -> Result<Vec<EpisodeRecord>, LookupError> {
        self.records(show, |ep| ep.season == season)
    }

    fn episodes_aired_between(
        &self,
        show: &Show,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EpisodeRecord>, LookupError> {
        self.records(show, |ep| ep.airdate.is_some_and(|d| d >= from && d <= to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Option<TvSeries>);

    impl SeriesSource for FixedSource {
        fn fetch_series(&self, series_name: &str) -> Result<TvSeries, MetadataRetrievalError> {
            self.0
                .clone()
                .ok_or_else(|| MetadataRetrievalError::SeriesNotFound(series_name.to_string()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn library() -> SeriesLibrary<FixedSource> {
        let series = TvSeries {
            name: "Show".to_string(),
            episodes: vec![
                SeriesEpisode { season: 1, number: 1, airdate: Some(date(2013, 9, 2)) },
                SeriesEpisode { season: 1, number: 2, airdate: Some(date(2013, 9, 9)) },
                SeriesEpisode { season: 1, number: 3, airdate: Some(date(2013, 9, 16)) },
                SeriesEpisode { season: 2, number: 1, airdate: None },
            ],
        };
        SeriesLibrary::new(FixedSource(Some(series)), date(2013, 9, 10))
    }

    #[test]
    fn test_episodes_in_season_marks_future_as_unaired() {
        let records = library().episodes_in_season(&Show::new("Show"), 1).unwrap();

        let statuses: Vec<EpisodeStatus> = records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![EpisodeStatus::Wanted, EpisodeStatus::Wanted, EpisodeStatus::Unaired]
        );
    }

    #[test]
    fn test_episodes_aired_between_is_inclusive() {
        let records = library()
            .episodes_aired_between(&Show::new("Show"), date(2013, 9, 2), date(2013, 9, 9))
            .unwrap();
        let numbers: Vec<u32> = records.iter().map(|r| r.episode).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_unknown_series_maps_to_show_not_found() {
        let library = SeriesLibrary::new(FixedSource(None), date(2013, 9, 10));
        assert!(matches!(
            library.episodes_in_season(&Show::new("Nope"), 1),
            Err(LookupError::ShowNotFound(_))
        ));
    }
}
