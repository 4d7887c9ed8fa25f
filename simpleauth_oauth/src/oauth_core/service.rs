//! Entry points used by web-handler glue: begin and complete an attempt by
//! provider key, optionally persisting the attempt's state in a [`StateStore`].

use std::collections::HashMap;

use tracing::{debug, instrument, warn};
use url::Url;

use super::csrf::{self, CsrfToken};
use super::error::AuthError;
use super::provider::AuthenticationProvider;
use super::registry::ProviderRegistry;
use super::store::StateStore;
use super::types::{AuthenticatedClient, AuthenticationState, RedirectSettings};

const OAUTH1_STATE_KEY: &str = "oauth_token";

/// Outcome of a store-backed completion.
#[derive(Debug, Clone)]
pub struct CompletedAuthentication {
    pub client: AuthenticatedClient,
    /// Extra data remembered when the attempt began, usually a return URL.
    pub return_url: Option<String>,
}

#[derive(Clone, Default)]
pub struct AuthenticationService {
    registry: ProviderRegistry,
}

impl AuthenticationService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Redirect for the provider registered under `provider_key`. The returned
    /// state is the value to remember until the callback.
    pub async fn begin_authentication(
        &self,
        provider_key: &str,
        callback_uri: &Url,
    ) -> Result<RedirectSettings, AuthError> {
        self.begin_with_data(provider_key, callback_uri, None).await
    }

    /// Like [`begin_authentication`](Self::begin_authentication), with
    /// `extra_data` carried in the remembered state.
    #[instrument(skip(self, callback_uri, extra_data), level = "debug")]
    pub async fn begin_with_data(
        &self,
        provider_key: &str,
        callback_uri: &Url,
        extra_data: Option<&str>,
    ) -> Result<RedirectSettings, AuthError> {
        let provider = self.registry.resolve(provider_key)?;
        begin(provider.as_ref(), callback_uri, extra_data).await
    }

    /// Completes the attempt against the remembered `expected_state`.
    #[instrument(skip(self, query, expected_state, callback_uri), level = "debug")]
    pub async fn complete_authentication(
        &self,
        provider_key: &str,
        query: &HashMap<String, String>,
        expected_state: &str,
        callback_uri: &Url,
    ) -> Result<AuthenticatedClient, AuthError> {
        let provider = self.registry.resolve(provider_key)?;
        provider.authenticate_client(query, expected_state, callback_uri).await
    }

    /// Begins an attempt and stores its [`AuthenticationState`] as JSON under
    /// `store_key`, replacing any unfinished attempt stored there.
    #[instrument(skip(self, store, callback_uri, return_url), level = "debug")]
    pub async fn begin_with_store<S: StateStore + ?Sized>(
        &self,
        store: &S,
        store_key: &str,
        provider_key: &str,
        callback_uri: &Url,
        return_url: Option<&str>,
    ) -> Result<RedirectSettings, AuthError> {
        let provider = self.registry.resolve(provider_key)?;
        let settings = begin(provider.as_ref(), callback_uri, return_url).await?;
        let state = AuthenticationState::new(settings.state.clone(), provider_key)
            .with_state_key(provider.state_key().unwrap_or(OAUTH1_STATE_KEY));
        let serialized = serde_json::to_string(&state).map_err(|e| {
            AuthError::Store(format!("Failed to serialize the authentication state: {e}."))
        })?;
        store.set(store_key, serialized).await?;
        debug!("authentication state stored");
        Ok(settings)
    }

    /// Consumes the state stored under `store_key` and completes the attempt.
    /// The state is removed whether the attempt succeeds or fails, and the
    /// value echoed under its `state_key` is checked before any provider call.
    #[instrument(skip(self, store, query, callback_uri), level = "debug")]
    pub async fn complete_with_store<S: StateStore + ?Sized>(
        &self,
        store: &S,
        store_key: &str,
        provider_key: &str,
        query: &HashMap<String, String>,
        callback_uri: &Url,
    ) -> Result<CompletedAuthentication, AuthError> {
        let raw = store.remove(store_key).await?.ok_or_else(|| {
            AuthError::NotFound(format!(
                "No authentication state is stored under '{store_key}'; \
                 the attempt has expired or was already completed."
            ))
        })?;
        let state: AuthenticationState = serde_json::from_str(&raw).map_err(|e| {
            AuthError::Format(format!("The stored authentication state is not valid: {e}."))
        })?;
        if !state.created_for.eq_ignore_ascii_case(provider_key) {
            warn!(
                created_for = %state.created_for,
                "callback provider does not match the stored state"
            );
            return Err(AuthError::CsrfValidation(format!(
                "The authentication state was created for '{}' \
                 but the callback is for '{provider_key}'.",
                state.created_for
            )));
        }

        let received = query.get(&state.state_key).ok_or_else(|| {
            AuthError::CsrfValidation(format!(
                "The callback query string doesn't include the '{}' parameter \
                 required to check it against the stored state.",
                state.state_key
            ))
        })?;
        let return_url = csrf::validate_token(&state.state, received)?;

        let provider = self.registry.resolve(provider_key)?;
        let client = provider
            .authenticate_client(query, &state.state, callback_uri)
            .await?;
        Ok(CompletedAuthentication { client, return_url })
    }
}

impl From<ProviderRegistry> for AuthenticationService {
    fn from(registry: ProviderRegistry) -> Self {
        Self::new(registry)
    }
}

async fn begin(
    provider: &dyn AuthenticationProvider,
    callback_uri: &Url,
    extra_data: Option<&str>,
) -> Result<RedirectSettings, AuthError> {
    let token = csrf::create_token(extra_data);
    let mut settings = provider.redirect_settings(callback_uri, &token.to_send).await?;
    settings.state = if provider.state_key().is_some() {
        token.to_keep
    } else {
        CsrfToken::with_extra_data(settings.state, extra_data).to_keep
    };
    Ok(settings)
}
