/// KickAss JSON search API response types for deserialization.
///
/// These structures mirror the payload returned by `json.php`. Anything that
/// does not fit them is treated as a malformed page.
use serde::Deserialize;

/// One page of search results.
#[derive(Debug, Deserialize)]
pub(super) struct SearchPage {
    /// Matching torrents; an absent key means the page has no results
    #[serde(default)]
    pub list: Vec<TorrentRecord>,
    /// Total number of hits across all pages, when reported
    pub total_results: Option<u64>,
}

/// A single torrent from the search API.
#[derive(Debug, Deserialize)]
pub(super) struct TorrentRecord {
    /// Raw release title, dot-separated as uploaded
    pub title: String,
    /// Direct link to the .torrent file
    #[serde(rename = "torrentLink")]
    pub torrent_link: String,
}
