//! Key-value storage for conversation state.
//!
//! Behaviors keep state across messages in an agent-scoped
//! [`KeyValueStore`]. Thread-scoped state rides on [`PrefixStore`], which
//! namespaces keys per conversation and remembers what it wrote so closing
//! the conversation wipes exactly its own entries.
//!
//! Stores hold `String` values; structured state goes through `serde_json`
//! at the call site.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The tracked-keys record could not be encoded or decoded.
    #[error("failed to encode tracked keys")]
    TrackedKeys(#[from] serde_json::Error),

    /// The backing store failed.
    #[error("storage backend failed: {reason}")]
    Backend { reason: String },
}

impl StorageError {
    /// Creates a backend failure with the given description.
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value; `None` deletes the key. Deleting an absent key is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    async fn put_item(&self, key: &str, value: Option<&str>) -> Result<(), StorageError>;

    /// Releases whatever the store holds; implementations decide what that
    /// means.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    async fn close(&self) -> Result<(), StorageError>;
}

/// Process-local store backed by a mutexed map. The default agent storage.
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.data
            .lock()
            .map_err(|_| StorageError::backend("in-memory store mutex poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.locked()?.get(key).cloned())
    }

    async fn put_item(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let mut data = self.locked()?;
        match value {
            Some(value) => {
                data.insert(key.to_owned(), value.to_owned());
            }
            None => {
                data.remove(key);
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Persisted record of the keys a prefix owns.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackedKeys {
    tracked_keys: Vec<String>,
}

/// Namespacing wrapper over any [`KeyValueStore`].
///
/// Every key is stored as `"{prefix}:{key}"`. Written keys are recorded
/// under a reserved tracking key inside the same namespace, so the record
/// survives this wrapper: a later `PrefixStore` over the same backing store
/// and prefix can still [`close`](KeyValueStore::close) the namespace, which
/// deletes every tracked entry and the record itself.
pub struct PrefixStore {
    inner: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl PrefixStore {
    const TRACKED_KEYS_KEY: &'static str = "_tracked_keys";

    /// Wraps `inner`, namespacing all keys under `prefix`.
    pub fn new(inner: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    /// The namespace this store writes under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    async fn tracked_keys(&self) -> Result<Vec<String>, StorageError> {
        let raw = self
            .inner
            .get_item(&self.prefixed(Self::TRACKED_KEYS_KEY))
            .await?;
        match raw {
            Some(raw) => Ok(serde_json::from_str::<TrackedKeys>(&raw)?.tracked_keys),
            None => Ok(Vec::new()),
        }
    }

    async fn track(&self, prefixed_key: String) -> Result<(), StorageError> {
        let mut tracked_keys = self.tracked_keys().await?;
        if !tracked_keys.contains(&prefixed_key) {
            tracked_keys.push(prefixed_key);
            let raw = serde_json::to_string(&TrackedKeys { tracked_keys })?;
            self.inner
                .put_item(&self.prefixed(Self::TRACKED_KEYS_KEY), Some(&raw))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for PrefixStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(&self.prefixed(key)).await
    }

    async fn put_item(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let prefixed_key = self.prefixed(key);
        self.inner.put_item(&prefixed_key, value).await?;
        if value.is_some() {
            self.track(prefixed_key).await?;
        }
        Ok(())
    }

    /// Deletes every entry this namespace wrote, then the tracking record.
    async fn close(&self) -> Result<(), StorageError> {
        for key in self.tracked_keys().await? {
            self.inner.put_item(&key, None).await?;
        }
        self.inner
            .put_item(&self.prefixed(Self::TRACKED_KEYS_KEY), None)
            .await
    }
}
