use std::fmt;

use thiserror::Error;

use super::http_client::HttpClientError;

/// Stage of an authentication attempt at which a provider interaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// OAuth 1.0a request-token call issued while building the redirect.
    RequestToken,
    /// Inspection of the callback query string.
    Callback,
    /// Exchange of an authorization code or verifier for an access token.
    TokenExchange,
    /// Retrieval of the user's profile.
    UserInformation,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestToken => write!(f, "request token"),
            Self::Callback => write!(f, "callback"),
            Self::TokenExchange => write!(f, "access token"),
            Self::UserInformation => write!(f, "user information"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or invalid credentials or provider configuration.
    #[error("{0}")]
    Configuration(String),

    /// The state echoed by the provider does not match the remembered one.
    #[error("{0}")]
    CsrfValidation(String),

    /// The remembered state could not be decoded.
    #[error("{0}")]
    Format(String),

    /// The provider answered with an error, an unexpected status or an
    /// incomplete payload, or could not be reached at all.
    #[error("{message}")]
    ProviderProtocol {
        step: AuthStep,
        message: String,
        #[source]
        source: Option<HttpClientError>,
    },

    /// No provider is registered under the requested key, or no state was
    /// stored for the attempt.
    #[error("{0}")]
    NotFound(String),

    /// The state store failed to read or write.
    #[error("{0}")]
    Store(String),
}

impl AuthError {
    pub(crate) fn protocol(step: AuthStep, message: impl Into<String>) -> Self {
        Self::ProviderProtocol { step, message: message.into(), source: None }
    }

    /// Wraps a transport failure, keeping it as the error source.
    pub(crate) fn transport(step: AuthStep, provider: &str, source: HttpClientError) -> Self {
        Self::ProviderProtocol {
            step,
            message: format!(
                "Failed to reach {provider} while retrieving the {step}: {source}"
            ),
            source: Some(source),
        }
    }

    /// Non-success HTTP status returned by the provider.
    pub(crate) fn unexpected_status(
        step: AuthStep,
        provider: &str,
        status: u16,
        body: &str,
    ) -> Self {
        Self::protocol(
            step,
            format!(
                "Failed to obtain the {step} from {provider}. Status: {status}. Response body: {}",
                snippet(body)
            ),
        )
    }

    /// True for failures of the CSRF state check, including a malformed
    /// remembered state.
    pub fn is_csrf_failure(&self) -> bool {
        matches!(self, Self::CsrfValidation(_) | Self::Format(_))
    }

    /// The step a provider interaction failed at, if any.
    pub fn step(&self) -> Option<AuthStep> {
        match self {
            Self::ProviderProtocol { step, .. } => Some(*step),
            _ => None,
        }
    }
}

const MAX_BODY_SNIPPET: usize = 512;

/// Truncates a response body for inclusion in an error message.
pub(crate) fn snippet(body: &str) -> &str {
    if body.len() <= MAX_BODY_SNIPPET {
        return body;
    }
    let mut end = MAX_BODY_SNIPPET;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
