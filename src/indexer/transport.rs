//! HTTP transport for indexer requests
//!
//! Provides the [`Fetch`] seam the searcher talks through, and its blocking
//! `reqwest` implementation sharing one lazily-built client.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors that can occur while fetching a page from the indexer
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or HTTP-layer failure reaching the indexer
    #[error("Failed to load {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The indexer answered with a status outside the tolerated set
    #[error("{url} returned unacceptable status {status}")]
    UnacceptableStatus { url: String, status: u16 },

    /// The indexer has nothing under this URL (HTTP 404)
    #[error("{url} returned no data")]
    NotFound { url: String },
}

/// How a response status is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The body carries a payload
    Content,
    /// Valid "nothing here" answer
    Empty,
    /// Anything else
    Rejected,
}

/// Classifies an HTTP status code returned by the indexer
///
/// Only 200, 302 and 303 carry content; 404 is an empty answer.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200 | 302 | 303 => StatusClass::Content,
        404 => StatusClass::Empty,
        _ => StatusClass::Rejected,
    }
}

/// Fetches raw response bodies
///
/// Implementations must be safe to share between the feed refresh and
/// on-demand searches.
pub trait Fetch: Send + Sync {
    /// Retrieves the body behind `url`
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP transport backed by `reqwest`
///
/// The underlying client is built on first use and reused afterwards.
/// Construction happens under a lock, so concurrent first calls still build
/// exactly one client.
pub struct HttpTransport {
    timeout: Duration,
    user_agent: Option<String>,
    client: Mutex<Option<reqwest::blocking::Client>>,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout
    pub fn new(timeout: Duration, user_agent: Option<String>) -> Self {
        Self {
            timeout,
            user_agent,
            client: Mutex::new(None),
        }
    }

    /// Returns the shared client, building it on first use
    fn client(&self) -> Result<reqwest::blocking::Client, reqwest::Error> {
        let mut slot = self.client.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let mut builder = reqwest::blocking::Client::builder().timeout(self.timeout);
        if let Some(ref agent) = self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder.build()?;
        *slot = Some(client.clone());

        Ok(client)
    }
}

impl Fetch for HttpTransport {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "retrieving URL");

        let transport_error = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let client = self.client().map_err(transport_error)?;
        let response = client.get(url.as_str()).send().map_err(transport_error)?;
        let status = response.status().as_u16();

        match classify_status(status) {
            StatusClass::Content => {
                let body = response.bytes().map_err(transport_error)?;
                Ok(body.to_vec())
            }
            StatusClass::Empty => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            StatusClass::Rejected => Err(FetchError::UnacceptableStatus {
                url: url.to_string(),
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Starts a server answering every GET on `/json.php` with `response`
    ///
    /// The runtime must outlive the blocking requests made against the server.
    fn serve(response: ResponseTemplate) -> (Runtime, MockServer) {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/json.php"))
                .respond_with(response)
                .mount(&server)
                .await;
            server
        });
        (runtime, server)
    }

    fn json_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/json.php?q=category%3Atv", server.uri())).unwrap()
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5), None)
    }

    #[test]
    fn test_fetch_returns_body_on_ok() {
        let (_runtime, server) = serve(ResponseTemplate::new(200).set_body_string(r#"{"list": []}"#));

        let body = transport().fetch(&json_url(&server)).unwrap();

        assert_eq!(body, br#"{"list": []}"#);
    }

    #[test]
    fn test_fetch_maps_404_to_not_found() {
        let (_runtime, server) = serve(ResponseTemplate::new(404));

        let err = transport().fetch(&json_url(&server)).unwrap_err();

        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[test]
    fn test_fetch_rejects_server_error() {
        let (_runtime, server) = serve(ResponseTemplate::new(500).set_body_string(r#"{"list": []}"#));

        let err = transport().fetch(&json_url(&server)).unwrap_err();

        assert!(matches!(err, FetchError::UnacceptableStatus { status: 500, .. }));
    }

    #[test]
    fn test_fetch_reports_unreachable_host() {
        let url = Url::parse("http://127.0.0.1:1/json.php").unwrap();

        let err = transport().fetch(&url).unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), StatusClass::Content);
        assert_eq!(classify_status(302), StatusClass::Content);
        assert_eq!(classify_status(303), StatusClass::Content);
        assert_eq!(classify_status(404), StatusClass::Empty);
        assert_eq!(classify_status(201), StatusClass::Rejected);
        assert_eq!(classify_status(301), StatusClass::Rejected);
        assert_eq!(classify_status(500), StatusClass::Rejected);
        assert_eq!(classify_status(503), StatusClass::Rejected);
    }

    #[test]
    fn test_client_is_built_once() {
        let transport = HttpTransport::new(Duration::from_secs(5), Some("kat-search/test".into()));
        assert!(transport.client.lock().unwrap().is_none());

        transport.client().unwrap();
        transport.client().unwrap();

        assert!(transport.client.lock().unwrap().is_some());
    }

    #[test]
    fn test_fetch_error_messages() {
        let err = FetchError::UnacceptableStatus {
            url: "http://kat.ph/json.php".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "http://kat.ph/json.php returned unacceptable status 503");

        let err = FetchError::NotFound {
            url: "http://kat.ph/json.php".into(),
        };
        assert_eq!(err.to_string(), "http://kat.ph/json.php returned no data");
    }

    #[test]
    fn test_transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpTransport>();
    }
}
