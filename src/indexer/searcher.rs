//! Paged search against the indexer's JSON API
//!
//! A search walks a fixed number of result pages in order, normalizing each
//! page that loads and parses, and skipping (with a log entry) each page that
//! does not.

use super::kat_types::SearchPage;
use super::transport::{Fetch, FetchError};
use crate::show::ResultItem;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Category filter appended to every remote query
const TV_CATEGORY: &str = "category:tv";

/// Errors that can occur for a single result page
///
/// These never escape [`PagedSearcher::search`]; they only decide what gets
/// logged for the page.
#[derive(Debug, Error)]
pub enum PageError {
    /// The page could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The page body does not match the expected payload structure
    #[error("Invalid data on search page {page}: {source}")]
    MalformedPayload {
        page: u32,
        source: serde_json::Error,
    },
}

impl PageError {
    /// Short failure kind recorded in log entries
    pub fn kind(&self) -> &'static str {
        match self {
            PageError::Fetch(FetchError::Transport { .. }) => "transport",
            PageError::Fetch(FetchError::UnacceptableStatus { .. }) => "unacceptable_status",
            PageError::Fetch(FetchError::NotFound { .. }) => "not_found",
            PageError::MalformedPayload { .. } => "malformed_payload",
        }
    }
}

/// Anything that can run a textual search and return normalized results
pub trait Search: Send + Sync {
    /// Runs a search; an empty query lists the most recent TV uploads
    ///
    /// Failures are absorbed: the worst outcome is an empty list.
    fn search(&self, query: &str) -> Vec<ResultItem>;
}

/// Resolves the JSON search endpoint below an indexer base URL
///
/// The base URL is treated as a directory even without a trailing slash.
pub fn search_endpoint(base_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("json.php")
}

/// Builds the request URL for one page of a query
///
/// A non-empty query is restricted to TV and ordered by seeders; the empty
/// query lists all TV uploads, newest first.
pub fn build_search_url(endpoint: &Url, query: &str, page: u32) -> Url {
    let (q, field) = if query.is_empty() {
        (TV_CATEGORY.to_string(), "time_add")
    } else {
        (format!("{} {}", query, TV_CATEGORY), "seeders")
    };

    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("q", &q)
        .append_pair("order", "desc")
        .append_pair("page", &page.to_string())
        .append_pair("field", field);
    url
}

/// Canonicalizes a raw release title by turning dots into spaces
pub fn canonical_title(raw: &str) -> String {
    raw.replace('.', " ")
}

/// Parses one page body into normalized result items
///
/// Records without a download link are dropped.
pub(crate) fn normalize_page(body: &[u8]) -> Result<Vec<ResultItem>, serde_json::Error> {
    let page: SearchPage = serde_json::from_slice(body)?;

    if let Some(total) = page.total_results {
        debug!(total, "indexer reported total results");
    }

    Ok(page
        .list
        .into_iter()
        .filter_map(|record| {
            if record.torrent_link.trim().is_empty() {
                debug!(title = %record.title, "dropping result without torrent link");
                return None;
            }
            debug!(title = %record.title, "search result");
            Some(ResultItem {
                title: canonical_title(&record.title),
                link: record.torrent_link,
            })
        })
        .collect())
}

/// Searches the indexer page by page
pub struct PagedSearcher<F> {
    /// Provider name used in log entries
    name: String,
    fetcher: F,
    endpoint: Url,
    page_count: u32,
}

impl<F> PagedSearcher<F>
where
    F: Fetch,
{
    /// Creates a searcher walking pages `1..=page_count` of `endpoint`
    pub fn new(name: impl Into<String>, fetcher: F, endpoint: Url, page_count: u32) -> Self {
        Self {
            name: name.into(),
            fetcher,
            endpoint,
            page_count,
        }
    }

    /// Returns the JSON endpoint this searcher queries
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetches and normalizes a single page
    fn fetch_page(&self, query: &str, page: u32) -> Result<Vec<ResultItem>, PageError> {
        let url = build_search_url(&self.endpoint, query, page);
        let body = self.fetcher.fetch(&url)?;
        normalize_page(&body).map_err(|source| PageError::MalformedPayload { page, source })
    }
}

impl<F> Search for PagedSearcher<F>
where
    F: Fetch,
{
    fn search(&self, query: &str) -> Vec<ResultItem> {
        info!(provider = %self.name, query, "performing search");

        let mut results = Vec::new();

        for page in 1..=self.page_count {
            match self.fetch_page(query, page) {
                Ok(items) => results.extend(items),
                Err(PageError::Fetch(FetchError::NotFound { .. })) => {
                    debug!(provider = %self.name, page, "no data on search page");
                }
                Err(e) => {
                    warn!(provider = %self.name, page, kind = e.kind(), error = %e, "search page failed");
                }
            }
        }

        if results.is_empty() {
            debug!(provider = %self.name, query, "no results found");
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Fetcher replaying scripted responses and recording requested URLs
    struct ScriptedFetch {
        responses: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
        requests: Mutex<Vec<Url>>,
    }

    impl ScriptedFetch {
        fn new(responses: Vec<Result<Vec<u8>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Url> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetch for ScriptedFetch {
        fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().unwrap().push(url.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(br#"{"list": []}"#.to_vec()))
        }
    }

    impl Fetch for &ScriptedFetch {
        fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            (**self).fetch(url)
        }
    }

    fn endpoint() -> Url {
        search_endpoint("http://kat.ph").unwrap()
    }

    fn searcher(fetch: &ScriptedFetch) -> PagedSearcher<&ScriptedFetch> {
        PagedSearcher::new("KickAss", fetch, endpoint(), 2)
    }

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn page_body(records: &[(&str, &str)]) -> Vec<u8> {
        let list: Vec<_> = records
            .iter()
            .map(|(title, link)| serde_json::json!({ "title": title, "torrentLink": link }))
            .collect();
        serde_json::to_vec(&serde_json::json!({ "list": list, "total_results": list.len() })).unwrap()
    }

    #[test]
    fn test_search_endpoint() {
        assert_eq!(endpoint().as_str(), "http://kat.ph/json.php");
        assert_eq!(
            search_endpoint("https://mirror.example/kat/").unwrap().as_str(),
            "https://mirror.example/kat/json.php"
        );
        assert_eq!(
            search_endpoint("https://mirror.example/kat").unwrap().as_str(),
            "https://mirror.example/kat/json.php"
        );
        assert!(search_endpoint("not a url").is_err());
    }

    #[test]
    fn test_empty_query_requests_recent_tv() {
        let fetch = ScriptedFetch::new(Vec::new());
        searcher(&fetch).search("");

        let requests = fetch.requests();
        assert_eq!(requests.len(), 2);
        for (index, url) in requests.iter().enumerate() {
            assert_eq!(url.path(), "/json.php");
            assert_eq!(param(url, "q").as_deref(), Some("category:tv"));
            assert_eq!(param(url, "field").as_deref(), Some("time_add"));
            assert_eq!(param(url, "order").as_deref(), Some("desc"));
            assert_eq!(param(url, "page"), Some((index + 1).to_string()));
        }
    }

    #[test]
    fn test_query_requests_by_seeders() {
        let fetch = ScriptedFetch::new(Vec::new());
        searcher(&fetch).search("foo");

        let requests = fetch.requests();
        assert_eq!(requests.len(), 2);
        for url in &requests {
            assert_eq!(param(url, "q").as_deref(), Some("foo category:tv"));
            assert_eq!(param(url, "field").as_deref(), Some("seeders"));
            assert_eq!(param(url, "order").as_deref(), Some("desc"));
        }
        assert_eq!(param(&requests[0], "page").as_deref(), Some("1"));
        assert_eq!(param(&requests[1], "page").as_deref(), Some("2"));
    }

    #[test]
    fn test_malformed_first_page_does_not_abort() {
        let fetch = ScriptedFetch::new(vec![
            Ok(b"<html>not json</html>".to_vec()),
            Ok(page_body(&[("Show.Name.S01E02", "http://kat.ph/t/1.torrent")])),
        ]);

        let results = searcher(&fetch).search("Show.Name S01E02");

        assert_eq!(
            results,
            vec![ResultItem {
                title: "Show Name S01E02".to_string(),
                link: "http://kat.ph/t/1.torrent".to_string(),
            }]
        );
        assert_eq!(fetch.requests().len(), 2);
    }

    #[test]
    fn test_fetch_failures_are_recovered() {
        let fetch = ScriptedFetch::new(vec![
            Err(FetchError::Transport {
                url: "http://kat.ph/json.php".into(),
                reason: "connection refused".into(),
            }),
            Err(FetchError::UnacceptableStatus {
                url: "http://kat.ph/json.php".into(),
                status: 503,
            }),
        ]);

        assert!(searcher(&fetch).search("").is_empty());
        assert_eq!(fetch.requests().len(), 2);
    }

    #[test]
    fn test_page_error_kinds() {
        let transport = PageError::from(FetchError::Transport {
            url: "http://kat.ph/json.php".into(),
            reason: "connection refused".into(),
        });
        let status = PageError::from(FetchError::UnacceptableStatus {
            url: "http://kat.ph/json.php".into(),
            status: 500,
        });
        let malformed = PageError::MalformedPayload {
            page: 1,
            source: serde_json::from_slice::<SearchPage>(b"nope").unwrap_err(),
        };

        assert_eq!(transport.kind(), "transport");
        assert_eq!(status.kind(), "unacceptable_status");
        assert_eq!(malformed.kind(), "malformed_payload");
    }

    #[test]
    fn test_not_found_yields_no_items() {
        let fetch = ScriptedFetch::new(vec![
            Err(FetchError::NotFound {
                url: "http://kat.ph/json.php".into(),
            }),
            Ok(page_body(&[("A.S01E01", "http://kat.ph/a.torrent")])),
        ]);

        let results = searcher(&fetch).search("");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "A S01E01");
    }

    #[test]
    fn test_pages_are_appended_in_order_without_dedup() {
        let fetch = ScriptedFetch::new(vec![
            Ok(page_body(&[
                ("First.S01E01", "http://kat.ph/1.torrent"),
                ("Second.S01E02", "http://kat.ph/2.torrent"),
            ])),
            Ok(page_body(&[("First.S01E01", "http://kat.ph/1.torrent")])),
        ]);

        let titles: Vec<String> = searcher(&fetch)
            .search("")
            .into_iter()
            .map(|item| item.title)
            .collect();

        assert_eq!(titles, vec!["First S01E01", "Second S01E02", "First S01E01"]);
    }

    #[test]
    fn test_page_count_is_configurable() {
        let fetch = ScriptedFetch::new(Vec::new());
        PagedSearcher::new("KickAss", &fetch, endpoint(), 3).search("");
        assert_eq!(fetch.requests().len(), 3);
    }

    #[test]
    fn test_normalize_page_without_list_is_empty() {
        assert!(normalize_page(br#"{"title": "KickAss"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_page_rejects_records_missing_fields() {
        assert!(normalize_page(br#"{"list": [{"title": "No.Link"}]}"#).is_err());
        assert!(normalize_page(br#"{"list": [0]}"#).is_err());
    }

    #[test]
    fn test_normalize_page_drops_empty_links() {
        let body = page_body(&[("Empty.Link", ""), ("Good.One", "http://kat.ph/g.torrent")]);
        let items = normalize_page(&body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Good One");
    }

    #[test]
    fn test_http_search_skips_malformed_page() {
        use crate::indexer::HttpTransport;
        use std::time::Duration;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/json.php"))
                .and(query_param("page", "1"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/json.php"))
                .and(query_param("page", "2"))
                .and(query_param("q", "Show S01E02 category:tv"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_bytes(page_body(&[("Show.S01E02.720p", "http://kat.ph/s.torrent")])),
                )
                .expect(1)
                .mount(&server)
                .await;
            server
        });

        let searcher = PagedSearcher::new(
            "KickAss",
            HttpTransport::new(Duration::from_secs(5), None),
            search_endpoint(&server.uri()).unwrap(),
            2,
        );
        let results = searcher.search("Show S01E02");

        assert_eq!(
            results,
            vec![ResultItem {
                title: "Show S01E02 720p".to_string(),
                link: "http://kat.ph/s.torrent".to_string(),
            }]
        );
        runtime.block_on(server.verify());
    }

    #[test]
    fn test_canonical_title() {
        assert_eq!(canonical_title("Show.Name.S01E02"), "Show Name S01E02");
        assert_eq!(canonical_title("Already Spaced"), "Already Spaced");
    }
}
