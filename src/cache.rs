//! Show metadata cache
//!
//! Persists show metadata fetched for the CLI as JSON files in the system's
//! standard cache directory, each stamped with its storage time so entries
//! can expire. Search results are never stored here; they only live in the
//! in-memory [`RefreshGate`](crate::RefreshGate).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to determine cache directory location
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

    /// Failed to create or access cache directory
    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read cached data
    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write cached data
    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to deserialize cached data
    #[error("Failed to deserialize cache file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize data for caching
    #[error("Failed to serialize data: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// On-disk wrapper recording when an entry was stored
#[derive(Serialize, Deserialize)]
struct Entry<T> {
    stored_at: DateTime<Utc>,
    data: T,
}

/// A JSON file cache for serializable data with optional expiry
pub(crate) struct CacheStorage<T> {
    cache_dir: PathBuf,
    /// Entries older than this are ignored; `None` keeps them forever
    ttl: Option<Duration>,
    _phantom: PhantomData<T>,
}

impl<T> CacheStorage<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Opens or creates the named cache below the platform cache directory
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let cache: CacheStorage<TvSeries> =
    ///     CacheStorage::open("metadata", Some(Duration::from_secs(24 * 60 * 60)))?;
    /// ```
    pub fn open(name: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let proj_dirs = directories::ProjectDirs::from("org", "katsearch", "kat-search")
            .ok_or(CacheError::CacheDirectoryNotFound)?;

        Self::open_in(proj_dirs.cache_dir(), name, ttl)
    }

    /// Opens or creates the named cache below an explicit directory
    pub fn open_in(root: &Path, name: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let cache_dir = root.join(sanitize_name(name));

        fs::create_dir_all(&cache_dir).map_err(|e| CacheError::DirectoryCreationFailed {
            path: cache_dir.clone(),
            source: e,
        })?;

        Ok(Self {
            cache_dir,
            ttl,
            _phantom: PhantomData,
        })
    }

    /// Loads cached data for the given identifier
    ///
    /// Returns `None` when nothing is stored or the entry has expired, and
    /// an error when a stored entry cannot be read or deserialized.
    pub fn load(&self, identifier: &str) -> Result<Option<T>, CacheError> {
        let file_path = self.entry_path(identifier);

        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path).map_err(|e| CacheError::ReadFailed {
            path: file_path.clone(),
            source: e,
        })?;

        let entry: Entry<T> =
            serde_json::from_str(&content).map_err(|e| CacheError::DeserializationFailed {
                path: file_path.clone(),
                source: e,
            })?;

        if self.is_expired(entry.stored_at) {
            debug!(path = %file_path.display(), "cache entry expired");
            return Ok(None);
        }

        Ok(Some(entry.data))
    }

    /// Stores data under the given identifier, stamped with the current time
    pub fn store(&self, identifier: &str, data: &T) -> Result<(), CacheError> {
        let file_path = self.entry_path(identifier);

        let entry = Entry {
            stored_at: Utc::now(),
            data,
        };
        let content = serde_json::to_string_pretty(&entry)?;

        fs::write(&file_path, content).map_err(|e| CacheError::WriteFailed {
            path: file_path,
            source: e,
        })?;

        Ok(())
    }

    fn entry_path(&self, identifier: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", sanitize_name(identifier)))
    }

    fn is_expired(&self, stored_at: DateTime<Utc>) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        // An entry from the future (clock skew) counts as fresh
        match (Utc::now() - stored_at).to_std() {
            Ok(age) => age >= ttl,
            Err(_) => false,
        }
    }
}

/// Sanitizes a name for use in file paths
///
/// Converts to lowercase and replaces all characters that are not
/// a-z, 0-9, or hyphen with underscores.
fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
