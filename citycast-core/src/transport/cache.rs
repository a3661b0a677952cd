//! Read-through response cache with a fixed time-to-live. A failed write is
//! logged and the fresh response is still returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use super::{HttpRequest, HttpResponse, Transport};
use crate::{config::CacheConfig, error::TransportError};

const CACHE_FILE_NAME: &str = "responses.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub response: HttpResponse,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(response: HttpResponse, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| fetched_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            response,
            fetched_at,
            expires_at,
        }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

pub trait CacheStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, TransportError>;
    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), TransportError>;
}

/// Process-local store, forgotten on exit.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, TransportError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), TransportError> {
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }
}

/// JSON file inside the cache directory, loaded once and rewritten on every insert.
///
/// Not safe against concurrent processes sharing the same directory.
#[derive(Debug)]
pub struct FileCache {
    file: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl FileCache {
    pub fn open(dir: &Path) -> Result<Self, TransportError> {
        let file = dir.join(CACHE_FILE_NAME);

        let entries = if file.exists() {
            let contents = fs::read_to_string(&file).map_err(|e| {
                TransportError::Cache(format!("failed to read {}: {e}", file.display()))
            })?;

            serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable response cache {}: {}", file.display(), e);
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        tracing::debug!(path = %file.display(), entries = entries.len(), "opened response cache");

        Ok(Self {
            file,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    fn persist(&self, entries: &HashMap<String, CacheEntry>) -> Result<(), TransportError> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TransportError::Cache(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string(entries)
            .map_err(|e| TransportError::Cache(format!("failed to serialize cache: {e}")))?;

        let tmp = self.file.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &self.file))
            .map_err(|e| {
                TransportError::Cache(format!("failed to write {}: {e}", self.file.display()))
            })
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, TransportError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), TransportError> {
        let mut entries = self.entries.lock();
        let now = entry.fetched_at;

        entries.retain(|_, e| e.is_fresh_at(now));
        entries.insert(key.to_string(), entry);

        self.persist(&entries)
    }
}

/// Serves fresh entries from `store`; misses go to `inner` and successful answers are stored.
#[derive(Debug)]
pub struct CachingTransport<T> {
    inner: T,
    store: Box<dyn CacheStore>,
    ttl: Duration,
}

impl<T: Transport> CachingTransport<T> {
    pub fn new(inner: T, store: Box<dyn CacheStore>, ttl: Duration) -> Self {
        Self { inner, store, ttl }
    }

    /// File-backed cache at the configured directory.
    pub fn from_config(inner: T, config: &CacheConfig) -> Result<Self, TransportError> {
        let store = FileCache::open(&config.path)?;
        Ok(Self::new(inner, Box::new(store), config.ttl))
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = request.cache_key();
        let now = Utc::now();

        if let Some(entry) = self.store.get(&key)? {
            if entry.is_fresh_at(now) {
                tracing::info!("Cache hit for {}", key);
                return Ok(entry.response);
            }
            tracing::debug!("Cache entry for {} expired at {}", key, entry.expires_at);
        } else {
            tracing::debug!("Cache miss for {}", key);
        }

        let response = self.inner.get(request).await?;

        if response.is_success() {
            let entry = CacheEntry::new(response.clone(), Utc::now(), self.ttl);
            if let Err(err) = self.store.put(&key, entry) {
                tracing::warn!("Response for {} not cached: {}", key, err);
            }
        }

        Ok(response)
    }
}
