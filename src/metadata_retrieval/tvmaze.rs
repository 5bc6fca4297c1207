/// TVMaze metadata provider implementation.
use super::tvmaze_types::{TvMazeEpisode, TvMazeShow};
use super::{MetadataRetrievalError, SeriesEpisode, SeriesSource, TvSeries};
use chrono::NaiveDate;
use tracing::debug;

/// Metadata provider for the TVMaze API.
///
/// This provider fetches episode listings from https://api.tvmaze.com
/// using the singlesearch endpoint with embedded episodes.
pub struct TvMazeSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl TvMazeSource {
    /// Creates a new TVMaze provider instance.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: "https://api.tvmaze.com".to_string(),
        }
    }

    /// Converts a TVMaze episode, skipping unnumbered specials.
    fn convert_episode(tvmaze_episode: TvMazeEpisode) -> Option<SeriesEpisode> {
        let number = tvmaze_episode.number?;
        let airdate = tvmaze_episode
            .airdate
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        Some(SeriesEpisode {
            season: tvmaze_episode.season,
            number,
            airdate,
        })
    }

    /// Converts TVMaze show data to our internal TvSeries structure.
    fn convert_to_series(tvmaze_show: TvMazeShow) -> Result<TvSeries, MetadataRetrievalError> {
        let episodes = tvmaze_show
            .embedded
            .ok_or_else(|| {
                MetadataRetrievalError::InvalidData("No episodes found in API response".to_string())
            })?
            .episodes;

        let mut episodes: Vec<SeriesEpisode> = episodes
            .into_iter()
            .filter_map(Self::convert_episode)
            .collect();
        episodes.sort_by_key(|e| (e.season, e.number));

        Ok(TvSeries {
            name: tvmaze_show.name,
            episodes,
        })
    }
}

impl Default for TvMazeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesSource for TvMazeSource {
    fn fetch_series(&self, series_name: &str) -> Result<TvSeries, MetadataRetrievalError> {
        let url = format!("{}/singlesearch/shows", self.base_url);
        debug!(series = series_name, "fetching episode listing from TVMaze");

        let response = self
            .client
            .get(&url)
            .query(&[("q", series_name), ("embed", "episodes")])
            .send()
            .map_err(|e| MetadataRetrievalError::RequestError(e.to_string()))?;

        if response.status() == 404 {
            return Err(MetadataRetrievalError::SeriesNotFound(
                series_name.to_string(),
            ));
        }

        if !response.status().is_success() {
            return Err(MetadataRetrievalError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let tvmaze_show: TvMazeShow = response
            .json()
            .map_err(|e| MetadataRetrievalError::ParseError(e.to_string()))?;

        Self::convert_to_series(tvmaze_show)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_to_series() {
        let json = r#"{
            "name": "The Daily Show",
            "_embedded": {"episodes": [
                {"season": 2013, "number": 2, "airdate": "2013-12-03"},
                {"season": 2013, "number": 1, "airdate": "2013-12-02"},
                {"season": 2013, "number": null, "airdate": "2013-12-24"},
                {"season": 2014, "number": 1, "airdate": ""},
                {"season": 2014, "number": 2, "airdate": null}
            ]}
        }"#;
        let show: TvMazeShow = serde_json::from_str(json).unwrap();
        let series = TvMazeSource::convert_to_series(show).unwrap();

        assert_eq!(series.name, "The Daily Show");
        assert_eq!(series.episodes.len(), 4);
        assert_eq!(series.episodes[0].number, 1);
        assert_eq!(series.episodes[0].airdate, NaiveDate::from_ymd_opt(2013, 12, 2));
        assert_eq!(series.episodes[2].airdate, None);
        assert_eq!(series.episodes[3].airdate, None);
    }

    #[test]
    fn test_convert_without_episodes_is_invalid() {
        let show: TvMazeShow = serde_json::from_str(r#"{"name": "Empty"}"#).unwrap();
        assert!(matches!(
            TvMazeSource::convert_to_series(show),
            Err(MetadataRetrievalError::InvalidData(_))
        ));
    }
}
