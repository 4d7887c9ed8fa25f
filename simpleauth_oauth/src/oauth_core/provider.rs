use std::collections::HashMap;

use async_trait::async_trait;
use url::Url;

use super::error::AuthError;
use super::types::{AuthenticatedClient, RedirectSettings, DEFAULT_STATE_KEY};

/// Implement this to support "Login via X".
///
/// Implementations hold nothing but immutable configuration and can be
/// shared across concurrent login attempts.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync + 'static {
    /// Display name, e.g. "Google".
    fn name(&self) -> &str;

    /// Query key under which the provider echoes the state back on the
    /// callback. `None` for flows that correlate through their own tokens.
    fn state_key(&self) -> Option<&str> {
        Some(DEFAULT_STATE_KEY)
    }

    /// Builds the redirect to the provider's authorization page. `state` is
    /// the value the provider should echo back, flows without a state
    /// parameter ignore it and return their own correlation value.
    async fn redirect_settings(
        &self,
        callback_uri: &Url,
        state: &str,
    ) -> Result<RedirectSettings, AuthError>;

    /// After callback: verify the query, exchange it for an access token and
    /// fetch the user's profile.
    async fn authenticate_client(
        &self,
        query: &HashMap<String, String>,
        expected_state: &str,
        callback_uri: &Url,
    ) -> Result<AuthenticatedClient, AuthError>;
}
