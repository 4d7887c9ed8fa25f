//! OAuth 1.0a three-legged flow with HMAC-SHA1 signed requests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use url::Url;

use super::codec::{build_query_string, parse_token_body, TokenFormat};
use super::crypto::OAuth1Signer;
use super::error::{snippet, AuthError, AuthStep};
use super::http_client::{HttpMethod, HttpRequest, HttpResponse, OAuthHttpClient};
use super::oauth2::map_user_information;
use super::profile::UserMapper;
use super::provider::AuthenticationProvider;
use super::types::{
    AccessToken, AuthenticatedClient, ProviderCredentials, RedirectSettings, UserInformation,
};

/// Endpoints of an OAuth 1.0a provider.
#[derive(Debug, Clone, Copy)]
pub struct OAuth1Profile {
    pub name: &'static str,
    pub request_token_endpoint: &'static str,
    pub authorize_endpoint: &'static str,
    pub access_token_endpoint: &'static str,
    pub user_info_endpoint: &'static str,
    pub map_user: UserMapper,
}

/// OAuth 1.0a provider configured by a profile and the consumer credentials.
#[derive(Clone)]
pub struct OAuth1Provider<C: OAuthHttpClient> {
    profile: OAuth1Profile,
    credentials: ProviderCredentials,
    http: C,
    timeout: Option<Duration>,
}

impl<C: OAuthHttpClient> OAuth1Provider<C> {
    pub fn new(profile: OAuth1Profile, credentials: ProviderCredentials, http: C) -> Self {
        Self { profile, credentials, http, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn profile(&self) -> &OAuth1Profile {
        &self.profile
    }

    fn signer(&self) -> OAuth1Signer<'_> {
        OAuth1Signer::new(&self.credentials.public_key, &self.credentials.secret_key)
    }

    async fn send(&self, step: AuthStep, request: HttpRequest) -> Result<String, AuthError> {
        let response: HttpResponse = self
            .http
            .execute(request.timeout(self.timeout))
            .await
            .map_err(|e| AuthError::transport(step, self.profile.name, e))?;
        let text = response.text();
        if !response.is_success() {
            let name = self.profile.name;
            return Err(AuthError::unexpected_status(step, name, response.status, &text));
        }
        Ok(text)
    }

    /// Reads `oauth_token` and `oauth_token_secret` from a token response.
    fn token_pair(&self, step: AuthStep, body: &str) -> Result<(String, String), AuthError> {
        let mut values = parse_token_body(body, None, TokenFormat::KeyValue);
        match (values.remove("oauth_token"), values.remove("oauth_token_secret")) {
            (Some(token), Some(secret)) if !token.is_empty() => Ok((token, secret)),
            _ => Err(AuthError::protocol(
                step,
                format!(
                    "The response from {} did not include both oauth_token \
                     and oauth_token_secret. Response body: {}",
                    self.profile.name,
                    snippet(body)
                ),
            )),
        }
    }

    /// Obtains a request token and builds the redirect to the provider. The
    /// returned state is the request token.
    #[instrument(skip_all, fields(provider = self.profile.name), level = "debug")]
    pub async fn begin_authentication(
        &self,
        callback_uri: &Url,
    ) -> Result<RedirectSettings, AuthError> {
        let result = self.request_token(callback_uri).await;
        if let Err(e) = &result {
            warn!(error = %e, "request token failed");
        }
        result
    }

    async fn request_token(&self, callback_uri: &Url) -> Result<RedirectSettings, AuthError> {
        let endpoint = self.profile.request_token_endpoint;
        let authorization = self
            .signer()
            .callback(callback_uri.as_str())
            .authorization_header(HttpMethod::POST, endpoint)?;
        let request = HttpRequest::post(endpoint).header("Authorization", authorization);
        let body = self.send(AuthStep::RequestToken, request).await?;
        let (token, _secret) = self.token_pair(AuthStep::RequestToken, &body)?;

        let authorize = Url::parse(self.profile.authorize_endpoint).map_err(|e| {
            AuthError::Configuration(format!(
                "{} endpoint '{}' is not a valid URL: {e}.",
                self.profile.name, self.profile.authorize_endpoint
            ))
        })?;
        let redirect_uri = build_query_string(&authorize, &[("oauth_token", token.as_str())]);
        debug!("obtained request token");
        Ok(RedirectSettings { redirect_uri, state: token })
    }

    /// Handles the callback: exchanges the verifier for an access token and
    /// fetches the profile.
    #[instrument(skip_all, fields(provider = self.profile.name), level = "debug")]
    pub async fn complete_authentication(
        &self,
        query: &HashMap<String, String>,
    ) -> Result<AuthenticatedClient, AuthError> {
        let result = self.complete(query).await;
        match &result {
            Ok(client) => {
                debug!(user_id = %client.user_information.id, "authentication completed")
            }
            Err(e) => warn!(step = ?e.step(), error = %e, "authentication failed"),
        }
        result
    }

    async fn complete(
        &self,
        query: &HashMap<String, String>,
    ) -> Result<AuthenticatedClient, AuthError> {
        if query.contains_key("denied") {
            return Err(AuthError::protocol(
                AuthStep::Callback,
                format!("The user denied the authorization request on {}.", self.profile.name),
            ));
        }
        let required = |key: &str| {
            query.get(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                AuthError::protocol(
                    AuthStep::Callback,
                    format!(
                        "The callback query string from {} doesn't include \
                         the required '{key}' parameter.",
                        self.profile.name
                    ),
                )
            })
        };
        let request_token = required("oauth_token")?;
        let verifier = required("oauth_verifier")?;

        let access_token = self.exchange_verifier(request_token, verifier).await?;
        let (user_information, raw_user_information) =
            self.fetch_user_information(&access_token).await?;
        Ok(AuthenticatedClient {
            provider_name: self.profile.name.to_string(),
            access_token,
            user_information,
            raw_user_information,
        })
    }

    /// Exchanges the authorized request token for a non-expiring access token.
    pub async fn exchange_verifier(
        &self,
        request_token: &str,
        verifier: &str,
    ) -> Result<AccessToken, AuthError> {
        let endpoint = self.profile.access_token_endpoint;
        let authorization = self
            .signer()
            .token(request_token, "")
            .verifier(verifier)
            .authorization_header(HttpMethod::POST, endpoint)?;
        let request = HttpRequest::post(endpoint).header("Authorization", authorization);
        let body = self.send(AuthStep::TokenExchange, request).await?;
        let (token, secret) = self.token_pair(AuthStep::TokenExchange, &body)?;
        Ok(AccessToken::non_expiring(token).with_secret(secret))
    }

    /// Signed profile request. Returns the raw body alongside.
    pub async fn fetch_user_information(
        &self,
        token: &AccessToken,
    ) -> Result<(UserInformation, String), AuthError> {
        let endpoint = self.profile.user_info_endpoint;
        let authorization = self
            .signer()
            .token(&token.token, token.secret.as_deref().unwrap_or_default())
            .authorization_header(HttpMethod::GET, endpoint)?;
        let request = HttpRequest::get(endpoint)
            .header("Authorization", authorization)
            .header("Accept", "application/json");
        let body = self.send(AuthStep::UserInformation, request).await?;
        let user = map_user_information(self.profile.name, self.profile.map_user, &body)?;
        Ok((user, body))
    }
}

#[async_trait]
impl<C: OAuthHttpClient> AuthenticationProvider for OAuth1Provider<C> {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn state_key(&self) -> Option<&str> {
        None
    }

    async fn redirect_settings(
        &self,
        callback_uri: &Url,
        _state: &str,
    ) -> Result<RedirectSettings, AuthError> {
        self.begin_authentication(callback_uri).await
    }

    /// `expected_state` is not compared here; the request token correlates the
    /// callback, and `AuthenticationService` checks it against the stored state.
    async fn authenticate_client(
        &self,
        query: &HashMap<String, String>,
        _expected_state: &str,
        _callback_uri: &Url,
    ) -> Result<AuthenticatedClient, AuthError> {
        self.complete_authentication(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth_core::http_client::InMemoryHttpClient;
    use crate::oauth_core::profile::map_standard_user;

    const PROFILE: OAuth1Profile = OAuth1Profile {
        name: "Legacy",
        request_token_endpoint: "https://legacy.local/oauth/request_token",
        authorize_endpoint: "https://legacy.local/oauth/authorize",
        access_token_endpoint: "https://legacy.local/oauth/access_token",
        user_info_endpoint: "https://legacy.local/me",
        map_user: map_standard_user,
    };

    fn provider(http: InMemoryHttpClient) -> OAuth1Provider<InMemoryHttpClient> {
        OAuth1Provider::new(PROFILE, ProviderCredentials::new("ck", "cs").unwrap(), http)
    }

    #[tokio::test]
    async fn request_token_response_needs_a_secret() {
        let http = InMemoryHttpClient::new();
        http.insert_response(
            PROFILE.request_token_endpoint,
            HttpResponse::new(200, "oauth_token=RT1"),
        );
        let callback = Url::parse("https://app.local/cb").unwrap();
        let err = provider(http).begin_authentication(&callback).await.unwrap_err();
        assert_eq!(err.step(), Some(AuthStep::RequestToken));
    }

    #[tokio::test]
    async fn missing_verifier_is_named() {
        let http = InMemoryHttpClient::new();
        let query = HashMap::from([("oauth_token".to_string(), "RT1".to_string())]);
        let err = provider(http.clone()).complete_authentication(&query).await.unwrap_err();
        assert!(err.to_string().contains("oauth_verifier"));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn denied_callback_is_reported() {
        let http = InMemoryHttpClient::new();
        let query = HashMap::from([("denied".to_string(), "RT1".to_string())]);
        let err = provider(http.clone()).complete_authentication(&query).await.unwrap_err();
        assert_eq!(err.step(), Some(AuthStep::Callback));
        assert!(http.requests().is_empty());
    }
}
