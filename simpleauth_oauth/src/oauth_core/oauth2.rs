//! OAuth 2.0 authorization-code flow.
//!
//! One engine serves every provider; the differences between providers are
//! captured by an [`OAuth2Profile`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::codec::{build_query_string, encode_pairs, parse_token_body, TokenFormat};
use super::csrf;
use super::error::{AuthError, AuthStep};
use super::http_client::{HttpRequest, OAuthHttpClient};
use super::profile::{map_standard_user, UserMapper};
use super::provider::AuthenticationProvider;
use super::types::{
    AccessToken, AuthenticatedClient, ProviderCredentials, RedirectSettings, UserInformation,
    DEFAULT_STATE_KEY,
};

/// How a missing or unreadable expiry in the token response is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// The token never expires.
    Optional,
    /// The token response is rejected.
    Required,
}

/// How the access token is attached to the profile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTokenPlacement {
    /// `?{name}={token}`.
    QueryParameter(&'static str),
    /// `Authorization: {scheme} {token}`.
    AuthorizationHeader(&'static str),
}

/// Endpoints and quirks of an OAuth 2.0 provider.
#[derive(Debug, Clone, Copy)]
pub struct OAuth2Profile {
    pub name: &'static str,
    pub authorize_endpoint: &'static str,
    pub token_endpoint: &'static str,
    pub user_info_endpoint: &'static str,
    pub default_scopes: &'static [&'static str],
    pub scope_key: &'static str,
    pub scope_separator: &'static str,
    pub token_format: TokenFormat,
    /// Token response field holding the lifetime in seconds.
    pub expires_key: &'static str,
    pub expiry_policy: ExpiryPolicy,
    pub access_token_placement: AccessTokenPlacement,
    /// Extra headers sent with the profile request.
    pub user_info_headers: &'static [(&'static str, &'static str)],
    pub map_user: UserMapper,
}

impl OAuth2Profile {
    /// A profile with the common defaults: space separated `scope`, JSON or
    /// key-value token body, optional `expires_in`, bearer header and the
    /// standard user mapping.
    pub const fn new(
        name: &'static str,
        authorize_endpoint: &'static str,
        token_endpoint: &'static str,
        user_info_endpoint: &'static str,
    ) -> Self {
        Self {
            name,
            authorize_endpoint,
            token_endpoint,
            user_info_endpoint,
            default_scopes: &[],
            scope_key: "scope",
            scope_separator: " ",
            token_format: TokenFormat::Detect,
            expires_key: "expires_in",
            expiry_policy: ExpiryPolicy::Optional,
            access_token_placement: AccessTokenPlacement::AuthorizationHeader("Bearer"),
            user_info_headers: &[],
            map_user: map_standard_user,
        }
    }

    pub const fn default_scopes(mut self, scopes: &'static [&'static str]) -> Self {
        self.default_scopes = scopes;
        self
    }

    pub const fn scope_parameter(mut self, key: &'static str, separator: &'static str) -> Self {
        self.scope_key = key;
        self.scope_separator = separator;
        self
    }

    pub const fn token_format(mut self, format: TokenFormat) -> Self {
        self.token_format = format;
        self
    }

    pub const fn expiry(mut self, key: &'static str, policy: ExpiryPolicy) -> Self {
        self.expires_key = key;
        self.expiry_policy = policy;
        self
    }

    pub const fn access_token_placement(mut self, placement: AccessTokenPlacement) -> Self {
        self.access_token_placement = placement;
        self
    }

    pub const fn user_info_headers(
        mut self,
        headers: &'static [(&'static str, &'static str)],
    ) -> Self {
        self.user_info_headers = headers;
        self
    }

    pub const fn map_user(mut self, map_user: UserMapper) -> Self {
        self.map_user = map_user;
        self
    }
}

/// OAuth 2.0 provider configured by a profile and the application's credentials.
#[derive(Clone)]
pub struct OAuth2Provider<C: OAuthHttpClient> {
    profile: OAuth2Profile,
    credentials: ProviderCredentials,
    http: C,
    timeout: Option<Duration>,
}

impl<C: OAuthHttpClient> OAuth2Provider<C> {
    pub fn new(profile: OAuth2Profile, credentials: ProviderCredentials, http: C) -> Self {
        Self { profile, credentials, http, timeout: None }
    }

    /// Per-request timeout handed to the transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn profile(&self) -> &OAuth2Profile {
        &self.profile
    }

    /// Explicit scopes win over the provider defaults.
    fn scopes(&self) -> Vec<&str> {
        if self.credentials.scopes.is_empty() {
            self.profile.default_scopes.to_vec()
        } else {
            self.credentials.scopes.iter().map(String::as_str).collect()
        }
    }

    fn endpoint(&self, endpoint: &str) -> Result<Url, AuthError> {
        Url::parse(endpoint).map_err(|e| {
            AuthError::Configuration(format!(
                "{} endpoint '{endpoint}' is not a valid URL: {e}.",
                self.profile.name
            ))
        })
    }

    /// The provider's authorization URL for `callback_uri`, carrying `state`
    /// unless it is empty.
    pub fn authorization_url(&self, callback_uri: &Url, state: &str) -> Result<Url, AuthError> {
        let base = self.endpoint(self.profile.authorize_endpoint)?;
        let mut params = vec![
            ("client_id", self.credentials.public_key.clone()),
            ("redirect_uri", callback_uri.to_string()),
            ("response_type", "code".to_string()),
        ];
        let scopes = self.scopes();
        if !scopes.is_empty() {
            params.push((self.profile.scope_key, scopes.join(self.profile.scope_separator)));
        }
        if !state.is_empty() {
            params.push((DEFAULT_STATE_KEY, state.to_string()));
        }
        Ok(build_query_string(&base, &params))
    }

    /// Starts an attempt with a freshly generated state.
    pub fn begin_authentication(&self, callback_uri: &Url) -> Result<RedirectSettings, AuthError> {
        let token = csrf::create_token(None);
        let redirect_uri = self.authorization_url(callback_uri, &token.to_send)?;
        debug!(provider = self.profile.name, "built authorization redirect");
        Ok(RedirectSettings { redirect_uri, state: token.to_keep })
    }

    /// Handles the callback: CSRF check, provider error passthrough, code
    /// exchange and profile retrieval.
    #[instrument(
        skip(self, query, expected_state, callback_uri),
        fields(provider = self.profile.name),
        level = "debug"
    )]
    pub async fn complete_authentication(
        &self,
        query: &HashMap<String, String>,
        expected_state: &str,
        callback_uri: &Url,
    ) -> Result<AuthenticatedClient, AuthError> {
        let result = self.complete(query, expected_state, callback_uri).await;
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
        expected_state: &str,
        callback_uri: &Url,
    ) -> Result<AuthenticatedClient, AuthError> {
        let state = query.get(DEFAULT_STATE_KEY).ok_or_else(|| {
            AuthError::CsrfValidation(format!(
                "The callback query string doesn't include a '{DEFAULT_STATE_KEY}' parameter, \
                 so the CSRF check against the remembered state '{expected_state}' \
                 cannot be performed."
            ))
        })?;
        csrf::validate_token(expected_state, state)?;

        if let Some(error) = query.get("error") {
            let description = query
                .get("error_description")
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            return Err(AuthError::protocol(
                AuthStep::Callback,
                format!(
                    "{} returned an error while authenticating: {error}{description}",
                    self.profile.name
                ),
            ));
        }

        let code = query.get("code").filter(|c| !c.is_empty()).ok_or_else(|| {
            AuthError::protocol(
                AuthStep::Callback,
                format!(
                    "No authorization code was returned by {} in the callback query string.",
                    self.profile.name
                ),
            )
        })?;

        let access_token = self.exchange_code(code, callback_uri).await?;
        let (user_information, raw_user_information) =
            self.fetch_user_information(&access_token).await?;

        Ok(AuthenticatedClient {
            provider_name: self.profile.name.to_string(),
            access_token,
            user_information,
            raw_user_information,
        })
    }

    /// Exchanges an authorization code for an access token.
    #[instrument(skip_all, level = "debug")]
    pub async fn exchange_code(
        &self,
        code: &str,
        callback_uri: &Url,
    ) -> Result<AccessToken, AuthError> {
        let name = self.profile.name;
        let body = encode_pairs(&[
            ("client_id", self.credentials.public_key.as_str()),
            ("client_secret", self.credentials.secret_key.as_str()),
            ("redirect_uri", callback_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ]);
        let request = HttpRequest::post(self.profile.token_endpoint)
            .header("Accept", "application/json")
            .form_body(body)
            .timeout(self.timeout);
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AuthError::transport(AuthStep::TokenExchange, name, e))?;
        let text = response.text();
        if !response.is_success() {
            return Err(AuthError::unexpected_status(
                AuthStep::TokenExchange,
                name,
                response.status,
                &text,
            ));
        }

        let values = parse_token_body(&text, response.content_type(), self.profile.token_format);
        let token = values.get("access_token").filter(|t| !t.is_empty()).ok_or_else(|| {
            AuthError::protocol(
                AuthStep::TokenExchange,
                format!(
                    "The response from {name} did not include an access_token. \
                     Response body: {}",
                    super::error::snippet(&text)
                ),
            )
        })?;

        let expires_in = values.get(self.profile.expires_key).map(|v| v.trim().parse::<i64>());
        match (expires_in, self.profile.expiry_policy) {
            (Some(Ok(seconds)), _) => Ok(AccessToken::expiring_in(token.as_str(), seconds)),
            (_, ExpiryPolicy::Optional) => Ok(AccessToken::non_expiring(token.as_str())),
            (None, ExpiryPolicy::Required) => Err(AuthError::protocol(
                AuthStep::TokenExchange,
                format!(
                    "The response from {name} did not include the required '{}' field.",
                    self.profile.expires_key
                ),
            )),
            (Some(Err(_)), ExpiryPolicy::Required) => Err(AuthError::protocol(
                AuthStep::TokenExchange,
                format!(
                    "The '{}' field returned by {name} is not a number: '{}'.",
                    self.profile.expires_key,
                    values.get(self.profile.expires_key).map(String::as_str).unwrap_or_default()
                ),
            )),
        }
    }

    /// Fetches and maps the user's profile. Returns the raw body alongside.
    #[instrument(skip_all, level = "debug")]
    pub async fn fetch_user_information(
        &self,
        token: &AccessToken,
    ) -> Result<(UserInformation, String), AuthError> {
        let name = self.profile.name;
        let endpoint = self.endpoint(self.profile.user_info_endpoint)?;
        let mut request = match self.profile.access_token_placement {
            AccessTokenPlacement::QueryParameter(key) => {
                let url = build_query_string(&endpoint, &[(key, token.token.as_str())]);
                HttpRequest::get(url.as_str())
            }
            AccessTokenPlacement::AuthorizationHeader(scheme) => HttpRequest::get(endpoint.as_str())
                .header("Authorization", format!("{scheme} {}", token.token)),
        };
        request = request.header("Accept", "application/json").timeout(self.timeout);
        for (k, v) in self.profile.user_info_headers {
            request = request.header(*k, *v);
        }

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AuthError::transport(AuthStep::UserInformation, name, e))?;
        let text = response.text();
        if !response.is_success() {
            return Err(AuthError::unexpected_status(
                AuthStep::UserInformation,
                name,
                response.status,
                &text,
            ));
        }
        let user = map_user_information(name, self.profile.map_user, &text)?;
        Ok((user, text))
    }
}

/// Parses a profile body and enforces the presence of the user id.
pub(crate) fn map_user_information(
    provider: &str,
    map_user: UserMapper,
    body: &str,
) -> Result<UserInformation, AuthError> {
    let document: Value = serde_json::from_str(body).map_err(|e| {
        AuthError::protocol(
            AuthStep::UserInformation,
            format!("Failed to parse the user information returned by {provider}: {e}."),
        )
    })?;
    let user = map_user(&document);
    if user.id.is_empty() {
        return Err(AuthError::protocol(
            AuthStep::UserInformation,
            format!(
                "Unable to retrieve the User Id from the {provider} user information. \
                 The user may have denied authorization or the access token is no longer valid."
            ),
        ));
    }
    Ok(user)
}

#[async_trait]
impl<C: OAuthHttpClient> AuthenticationProvider for OAuth2Provider<C> {
    fn name(&self) -> &str {
        self.profile.name
    }

    async fn redirect_settings(
        &self,
        callback_uri: &Url,
        state: &str,
    ) -> Result<RedirectSettings, AuthError> {
        let redirect_uri = self.authorization_url(callback_uri, state)?;
        Ok(RedirectSettings { redirect_uri, state: state.to_string() })
    }

    async fn authenticate_client(
        &self,
        query: &HashMap<String, String>,
        expected_state: &str,
        callback_uri: &Url,
    ) -> Result<AuthenticatedClient, AuthError> {
        self.complete_authentication(query, expected_state, callback_uri).await
    }
}
