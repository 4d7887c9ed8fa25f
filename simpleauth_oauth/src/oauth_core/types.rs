//! Social login primitives: credentials, tokens, user information and the
//! values handed back and forth between the engines and the host application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::AuthError;

/// Default query key carrying the CSRF state on an OAuth 2.0 callback.
pub const DEFAULT_STATE_KEY: &str = "state";

/// Application credentials issued by a provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// Client identifier (`client_id` / OAuth1 consumer key).
    pub public_key: String,
    /// Client secret (`client_secret` / OAuth1 consumer secret).
    pub secret_key: String,
    /// Explicit scopes. When empty the provider defaults apply.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl ProviderCredentials {
    /// Creates credentials, rejecting empty keys.
    pub fn new(
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let public_key = public_key.into();
        let secret_key = secret_key.into();
        if public_key.trim().is_empty() {
            return Err(AuthError::Configuration(
                "The provider public key is missing or empty.".into(),
            ));
        }
        if secret_key.trim().is_empty() {
            return Err(AuthError::Configuration(
                "The provider secret key is missing or empty.".into(),
            ));
        }
        Ok(Self { public_key, secret_key, scopes: Vec::new() })
    }

    /// Replaces the requested scopes.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Reads `{PREFIX}_PUBLIC_KEY`, `{PREFIX}_SECRET_KEY` and the optional
    /// comma separated `{PREFIX}_SCOPES` from the environment.
    pub fn from_env(prefix: &str) -> Result<Self, AuthError> {
        let prefix = prefix.to_ascii_uppercase();
        let read = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();
        let public_key = read("PUBLIC_KEY").ok_or_else(|| {
            AuthError::Configuration(format!(
                "Environment variable '{prefix}_PUBLIC_KEY' is not set."
            ))
        })?;
        let secret_key = read("SECRET_KEY").ok_or_else(|| {
            AuthError::Configuration(format!(
                "Environment variable '{prefix}_SECRET_KEY' is not set."
            ))
        })?;
        let credentials = Self::new(public_key, secret_key)?;
        Ok(match read("SCOPES") {
            Some(scopes) => credentials.with_scopes(
                scopes.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            ),
            None => credentials,
        })
    }
}

// Secrets stay out of logs and panics.
impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Per-attempt correlation data the host must persist between the redirect
/// and the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationState {
    /// The kept CSRF token, optionally carrying extra data.
    pub state: String,
    /// Query key under which the provider echoes the token back.
    pub state_key: String,
    /// Key of the provider the attempt was started for.
    pub created_for: String,
}

impl AuthenticationState {
    pub fn new(state: impl Into<String>, created_for: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            state_key: DEFAULT_STATE_KEY.to_string(),
            created_for: created_for.into(),
        }
    }

    pub fn with_state_key(mut self, state_key: impl Into<String>) -> Self {
        self.state_key = state_key.into();
        self
    }
}

/// Where to send the browser, and the state to remember until it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectSettings {
    pub redirect_uri: Url,
    pub state: String,
}

/// Token obtained from the provider. Only held for the profile request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    /// OAuth 1.0a token secret.
    pub secret: Option<String>,
    /// UTC expiry, `DateTime::<Utc>::MAX_UTC` when the token never expires.
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    /// A token without expiry.
    pub fn non_expiring(token: impl Into<String>) -> Self {
        Self { token: token.into(), secret: None, expires_on: DateTime::<Utc>::MAX_UTC }
    }

    /// A token expiring `expires_in` seconds from now. Non-positive values
    /// mean the token never expires.
    pub fn expiring_in(token: impl Into<String>, expires_in: i64) -> Self {
        let expires_on = if expires_in <= 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            chrono::TimeDelta::try_seconds(expires_in)
                .and_then(|delta| Utc::now().checked_add_signed(delta))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        };
        Self { token: token.into(), secret: None, expires_on }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn never_expires(&self) -> bool {
        self.expires_on == DateTime::<Utc>::MAX_UTC
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl Gender {
    /// Lenient parse of the provider's free-form gender field.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// Provider-agnostic view of a user's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInformation {
    pub id: String,
    pub name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub locale: Option<String>,
    pub picture_url: Option<String>,
    pub gender: Gender,
}

/// Outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    pub provider_name: String,
    pub access_token: AccessToken,
    pub user_information: UserInformation,
    /// Profile response body exactly as received.
    pub raw_user_information: String,
}
