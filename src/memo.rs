//! Key-value memo store and the memoization discipline built on top of it.
//!
//! Entries are write-once/read-many and never invalidated. Concurrent
//! misses on the same key are not deduplicated: both callers compute and
//! both write, the last write winning silently. That race is accepted
//! because a computed value never goes stale, so either write is a valid
//! value for the key. The one case where an existing entry is overwritten
//! is an entry that fails to deserialize: the value is recomputed and the
//! write-through replaces the corrupt bytes.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::SignalError;
use crate::observability::metrics::Metrics;

/// Byte-string key/value store with no expiry requirement.
#[async_trait]
pub trait MemoStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-wide in-memory backing; entries live for the store's lifetime.
#[derive(Debug, Default)]
pub struct InMemoryMemoStore {
    entries: RwLock<FxHashMap<String, String>>,
}

impl InMemoryMemoStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoStore for InMemoryMemoStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[must_use]
pub fn text_key(url: &str) -> String {
    format!("texts|{url}")
}

#[must_use]
pub fn predictions_key(backend: &str, url: &str) -> String {
    format!("predictions|{backend}|{url}")
}

#[must_use]
pub fn entities_key(url: &str) -> String {
    format!("entities|{url}")
}

/// Typed `get_or_compute` wrapper over a [`MemoStore`].
#[derive(Clone)]
pub struct Memoizer {
    store: Arc<dyn MemoStore>,
    metrics: Arc<Metrics>,
}

impl Memoizer {
    #[must_use]
    pub fn new(store: Arc<dyn MemoStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    /// Returns the cached value for `key`, or runs `compute` and caches the
    /// result.
    ///
    /// Store reads and writes are best-effort: a failed read falls through
    /// to `compute`, and a failed write still returns the computed value.
    ///
    /// # Errors
    /// Propagates only errors raised by `compute` itself.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> Result<T, SignalError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SignalError>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.metrics.cache_hits.inc();
                    debug!(key, "memo hit");
                    return Ok(value);
                }
                Err(error) => {
                    warn!(key, %error, "memo entry failed to deserialize, recomputing");
                }
            },
            Ok(None) => {}
            Err(error) => {
                warn!(key, error = %error, "memo read failed, recomputing");
            }
        }

        self.metrics.cache_misses.inc();
        debug!(key, "memo miss");
        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(error) = self.store.set(key, &raw).await {
                    warn!(key, error = %error, "memo write failed, returning computed value");
                }
            }
            Err(error) => {
                warn!(key, %error, "memo value failed to serialize, skipping cache write");
            }
        }

        Ok(value)
    }
}
