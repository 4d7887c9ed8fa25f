//! CSRF state tokens binding a redirect to its callback.
//!
//! The token sent to the provider is always a bare random value. The token
//! kept by the application may additionally carry opaque data (typically a
//! return URL) as `{token}|{base64(data)}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

use super::error::AuthError;

const SEPARATOR: char = '|';

/// A freshly generated state token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    /// Value transmitted to the provider.
    pub to_send: String,
    /// Value remembered by the application.
    pub to_keep: String,
}

impl CsrfToken {
    /// Pairs an existing token with optional extra data.
    pub fn with_extra_data(to_send: impl Into<String>, extra_data: Option<&str>) -> Self {
        let to_send = to_send.into();
        let to_keep = match extra_data {
            Some(data) => format!("{to_send}{SEPARATOR}{}", STANDARD.encode(data.as_bytes())),
            None => to_send.clone(),
        };
        Self { to_send, to_keep }
    }
}

/// Generates a new random token (UUID v4, 122 random bits).
pub fn create_token(extra_data: Option<&str>) -> CsrfToken {
    CsrfToken::with_extra_data(Uuid::new_v4().to_string(), extra_data)
}

/// Splits a kept token into its bare token and decoded extra data.
pub fn split_token(kept_token: &str) -> Result<(&str, Option<String>), AuthError> {
    match kept_token.split_once(SEPARATOR) {
        None => Ok((kept_token, None)),
        Some((token, encoded)) => {
            let bytes = STANDARD.decode(encoded).map_err(|e| {
                AuthError::Format(format!(
                    "The remembered state '{kept_token}' carries extra data \
                     that is not valid base64: {e}."
                ))
            })?;
            let data = String::from_utf8(bytes).map_err(|e| {
                AuthError::Format(format!(
                    "The remembered state '{kept_token}' carries extra data \
                     that is not valid UTF-8: {e}."
                ))
            })?;
            Ok((token, Some(data)))
        }
    }
}

/// Checks the token echoed by the provider against the kept one and returns
/// the extra data stored alongside it.
///
/// The comparison is ordinal and case-sensitive.
pub fn validate_token(kept_token: &str, received_token: &str) -> Result<Option<String>, AuthError> {
    let (token, _) = kept_token.split_once(SEPARATOR).unwrap_or((kept_token, ""));
    if token != received_token {
        return Err(AuthError::CsrfValidation(format!(
            "CSRF check fails: the callback state value '{received_token}' \
             doesn't match the remembered state value '{token}'."
        )));
    }
    split_token(kept_token).map(|(_, data)| data)
}
