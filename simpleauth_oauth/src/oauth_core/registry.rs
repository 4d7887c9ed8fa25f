use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::error::AuthError;
use super::fake::FakeProvider;
use super::provider::AuthenticationProvider;

const FAKE_PREFIX: &str = "fake";

/// Maps provider keys to configured providers. Keys are case-insensitive.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<DashMap<String, Arc<dyn AuthenticationProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `key`. With `replace_existing` unset, an
    /// already registered key is a configuration error.
    pub fn register(
        &self,
        key: &str,
        provider: Arc<dyn AuthenticationProvider>,
        replace_existing: bool,
    ) -> Result<(), AuthError> {
        let normalized = normalize(key)?;
        if !replace_existing && self.providers.contains_key(&normalized) {
            return Err(AuthError::Configuration(format!(
                "A provider is already registered under the key '{key}'."
            )));
        }
        debug!(key = %normalized, provider = provider.name(), "registered provider");
        self.providers.insert(normalized, provider);
        Ok(())
    }

    /// Looks up `key`. Unknown keys starting with `fake` resolve to a
    /// [`FakeProvider`].
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn AuthenticationProvider>, AuthError> {
        let normalized = key.trim().to_lowercase();
        if let Some(entry) = self.providers.get(&normalized) {
            return Ok(Arc::clone(entry.value()));
        }
        if normalized.starts_with(FAKE_PREFIX) {
            return Ok(Arc::new(FakeProvider::new(key.trim())));
        }
        Err(AuthError::NotFound(format!(
            "No authentication provider is registered under the key '{key}'."
        )))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(&key.trim().to_lowercase())
    }

    pub fn remove(&self, key: &str) -> Option<Arc<dyn AuthenticationProvider>> {
        self.providers.remove(&key.trim().to_lowercase()).map(|(_, provider)| provider)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> =
            self.providers.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn normalize(key: &str) -> Result<String, AuthError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AuthError::Configuration("A provider key must not be empty.".into()));
    }
    Ok(key.to_lowercase())
}
