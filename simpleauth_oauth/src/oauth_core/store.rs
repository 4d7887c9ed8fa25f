use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::AuthError;

/// Key/value store (session or cache) that keeps state across the redirect.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), AuthError>;

    /// Removes and returns the value under `key`.
    async fn remove(&self, key: &str) -> Result<Option<String>, AuthError>;
}

/// Process-local store, suitable for a single instance and for tests.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), AuthError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.remove(key).map(|(_, value)| value))
    }
}
