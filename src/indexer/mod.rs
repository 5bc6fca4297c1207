//! KickAss indexer access
//!
//! This module talks to the indexer's JSON search API: the transport that
//! fetches raw pages, the payload schema, and the paged searcher that turns
//! a query into normalized results.
mod kat_types;
mod searcher;
mod transport;

pub use searcher::{PageError, PagedSearcher, Search, build_search_url, canonical_title, search_endpoint};
pub use transport::{Fetch, FetchError, HttpTransport, StatusClass, classify_status};
