//! Search string generation
//!
//! Builds the list of search strings that plausibly match a season or a
//! single episode of a show, across every name the show is released under.
//! Nothing in here touches the network; episode data comes from the
//! [`EpisodeLookup`] collaborator.

use crate::naming::{NameVariants, format_air_date, format_episode_token, sanitize_scene_name};
use crate::show::{EpisodeLookup, EpisodeRecord, EpisodeTarget, Show, StatusClassifier};
use chrono::{Days, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Computes the first and last day of an air-by-date "season"
///
/// The season token is a `YYYY-MM` month. Returns `None` when the token
/// cannot be parsed into a valid month.
///
/// # Examples
///
/// ```
/// use kat_search::airbydate_season_range;
/// use chrono::NaiveDate;
///
/// let (min, max) = airbydate_season_range("2013-11").unwrap();
/// assert_eq!(min, NaiveDate::from_ymd_opt(2013, 11, 1).unwrap());
/// assert_eq!(max, NaiveDate::from_ymd_opt(2013, 11, 30).unwrap());
/// ```
pub fn airbydate_season_range(season: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = season.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;

    let min_date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let max_date = if month == 12 {
        NaiveDate::from_ymd_opt(year, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?.checked_sub_days(Days::new(1))?
    };

    Some((min_date, max_date))
}

/// Builds search strings for seasons and episodes of a show
pub struct QueryBuilder<'a> {
    lookup: &'a dyn EpisodeLookup,
    classifier: &'a dyn StatusClassifier,
    names: &'a dyn NameVariants,
    episode_pattern: &'a str,
}

impl<'a> QueryBuilder<'a> {
    /// Creates a query builder from its collaborators
    ///
    /// # Arguments
    ///
    /// * `lookup` - Episode database access
    /// * `classifier` - Decides which episodes still need a download
    /// * `names` - Produces every name the show is released under
    /// * `episode_pattern` - Numbering pattern such as `S{season:02}E{episode:02}`
    pub fn new(
        lookup: &'a dyn EpisodeLookup,
        classifier: &'a dyn StatusClassifier,
        names: &'a dyn NameVariants,
        episode_pattern: &'a str,
    ) -> Self {
        Self {
            lookup,
            classifier,
            names,
            episode_pattern,
        }
    }

    /// Builds the search strings for every wanted episode of a season
    ///
    /// For air-by-date shows `season` is a `YYYY-MM` month, otherwise a
    /// season number. Only episodes classified as wanted or as quality
    /// upgrade candidates contribute strings.
    ///
    /// Never fails: a missing show, an unparseable season, a failed lookup or
    /// a season without wanted episodes all yield an empty list.
    pub fn season_queries(&self, show: Option<&Show>, season: &str) -> Vec<String> {
        let Some(show) = show else {
            return Vec::new();
        };

        let episodes = if show.air_by_date {
            let Some((min_date, max_date)) = airbydate_season_range(season) else {
                warn!(show = %show.name, season, "invalid air-by-date season token");
                return Vec::new();
            };
            self.lookup.episodes_aired_between(show, min_date, max_date)
        } else {
            let Ok(number) = season.trim().parse::<u32>() else {
                warn!(show = %show.name, season, "invalid season number");
                return Vec::new();
            };
            self.lookup.episodes_in_season(show, number)
        };

        let episodes = match episodes {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(show = %show.name, season, error = %e, "episode lookup failed");
                return Vec::new();
            }
        };

        let mut queries = Vec::new();
        for episode in &episodes {
            let overview = self.classifier.overview(show, episode);
            if !overview.is_searchable() {
                debug!(
                    show = %show.name,
                    season = episode.season,
                    episode = episode.episode,
                    ?overview,
                    "skipping episode"
                );
                continue;
            }

            if let Some(token) = self.episode_token(show, episode) {
                queries.extend(self.with_names(show, &token));
            }
        }

        dedup_in_order(queries)
    }

    /// Builds the search strings for a single episode
    ///
    /// The token follows the show's convention: air-by-date shows are
    /// searched by date, all others by the numbering pattern. When the target
    /// is given in the other form, the matching episode is resolved through
    /// the lookup first; an unresolvable target yields an empty list.
    pub fn episode_queries(&self, show: Option<&Show>, target: Option<EpisodeTarget>) -> Vec<String> {
        let (Some(show), Some(target)) = (show, target) else {
            return Vec::new();
        };

        let token = match (show.air_by_date, target) {
            (true, EpisodeTarget::AirDate(date)) => Some(format_air_date(date)),
            (false, EpisodeTarget::Numbered { season, episode }) => {
                Some(format_episode_token(self.episode_pattern, season, episode))
            }
            (true, EpisodeTarget::Numbered { season, episode }) => self
                .resolve(show, target, |ep| ep.season == season && ep.episode == episode)
                .and_then(|ep| ep.airdate)
                .map(format_air_date),
            (false, EpisodeTarget::AirDate(date)) => self
                .resolve(show, target, |ep| ep.airdate == Some(date))
                .map(|ep| format_episode_token(self.episode_pattern, ep.season, ep.episode)),
        };

        match token {
            Some(token) => dedup_in_order(self.with_names(show, &token)),
            None => {
                debug!(show = %show.name, ?target, "could not resolve episode target");
                Vec::new()
            }
        }
    }

    /// Renders the token for an episode drawn from the lookup
    fn episode_token(&self, show: &Show, episode: &EpisodeRecord) -> Option<String> {
        if show.air_by_date {
            episode.airdate.map(format_air_date)
        } else {
            Some(format_episode_token(
                self.episode_pattern,
                episode.season,
                episode.episode,
            ))
        }
    }

    /// Finds the episode the target refers to, in whichever form the lookup needs
    fn resolve<F>(&self, show: &Show, target: EpisodeTarget, matches: F) -> Option<EpisodeRecord>
    where
        F: Fn(&EpisodeRecord) -> bool,
    {
        let episodes = match target {
            EpisodeTarget::Numbered { season, .. } => self.lookup.episodes_in_season(show, season),
            EpisodeTarget::AirDate(date) => self.lookup.episodes_aired_between(show, date, date),
        };

        match episodes {
            Ok(episodes) => episodes.into_iter().find(|ep| matches(ep)),
            Err(e) => {
                warn!(show = %show.name, ?target, error = %e, "episode lookup failed");
                None
            }
        }
    }

    /// Prefixes `token` with every sanitized name of the show
    fn with_names(&self, show: &Show, token: &str) -> Vec<String> {
        self.names
            .all_names(show)
            .iter()
            .map(|name| format!("{} {}", sanitize_scene_name(name), token))
            .collect()
    }
}

/// Removes repeated strings while keeping first occurrences in order
fn dedup_in_order(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|query| seen.insert(query.clone()))
        .collect()
}
