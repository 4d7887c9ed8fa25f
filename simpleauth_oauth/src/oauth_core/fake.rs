//! A provider that performs no HTTP, for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::codec::build_query_string;
use super::csrf;
use super::error::{AuthError, AuthStep};
use super::provider::AuthenticationProvider;
use super::types::{
    AccessToken, AuthenticatedClient, RedirectSettings, UserInformation, DEFAULT_STATE_KEY,
};

/// Authorization code placed on the callback by [`FakeProvider`].
pub const FAKE_CODE: &str = "fake-code";

/// Redirects straight back to the callback and returns a canned client.
#[derive(Debug, Clone)]
pub struct FakeProvider {
    name: String,
    client: AuthenticatedClient,
    failure: Option<String>,
}

impl FakeProvider {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let user_information = UserInformation {
            id: format!("{}-user", name.to_lowercase()),
            name: Some("Fake User".to_string()),
            user_name: Some("fake.user".to_string()),
            email: Some("fake.user@example.com".to_string()),
            ..UserInformation::default()
        };
        let raw_user_information = serde_json::json!({
            "id": user_information.id,
            "name": "Fake User",
            "username": "fake.user",
            "email": "fake.user@example.com",
        })
        .to_string();
        let client = AuthenticatedClient {
            provider_name: name.clone(),
            access_token: AccessToken::non_expiring("fake-access-token"),
            user_information,
            raw_user_information,
        };
        Self { name, client, failure: None }
    }

    /// Client returned on success.
    pub fn with_client(mut self, client: AuthenticatedClient) -> Self {
        self.client = client;
        self
    }

    /// Makes every callback fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl AuthenticationProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn redirect_settings(
        &self,
        callback_uri: &Url,
        state: &str,
    ) -> Result<RedirectSettings, AuthError> {
        let redirect_uri =
            build_query_string(callback_uri, &[("code", FAKE_CODE), (DEFAULT_STATE_KEY, state)]);
        Ok(RedirectSettings { redirect_uri, state: state.to_string() })
    }

    async fn authenticate_client(
        &self,
        query: &HashMap<String, String>,
        expected_state: &str,
        _callback_uri: &Url,
    ) -> Result<AuthenticatedClient, AuthError> {
        let state = query.get(DEFAULT_STATE_KEY).map(String::as_str).unwrap_or_default();
        csrf::validate_token(expected_state, state)?;
        if let Some(message) = &self.failure {
            return Err(AuthError::protocol(AuthStep::Callback, message.clone()));
        }
        debug!(provider = %self.name, "fake authentication completed");
        Ok(self.client.clone())
    }
}
