//! Ready-made social login providers.

use std::sync::Arc;

use tracing::{debug, info};

use crate::oauth_core::error::AuthError;
use crate::oauth_core::http_client::OAuthHttpClient;
use crate::oauth_core::oauth1::{OAuth1Profile, OAuth1Provider};
use crate::oauth_core::oauth2::{OAuth2Profile, OAuth2Provider};
use crate::oauth_core::provider::AuthenticationProvider;
use crate::oauth_core::registry::ProviderRegistry;
use crate::oauth_core::types::ProviderCredentials;

pub mod profiles;

pub use profiles::{BITBUCKET, FACEBOOK, GITHUB, GOOGLE, INSTAGRAM, LINKEDIN, TWITTER, WINDOWS_LIVE};

/// Profile of a built-in provider.
#[derive(Debug, Clone, Copy)]
pub enum SocialProfile {
    OAuth2(&'static OAuth2Profile),
    OAuth1(&'static OAuth1Profile),
}

/// Entry of the registration table.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinProvider {
    /// Registry key; also the environment prefix, upper-cased.
    pub key: &'static str,
    pub profile: SocialProfile,
}

impl BuiltinProvider {
    pub fn name(&self) -> &'static str {
        match self.profile {
            SocialProfile::OAuth2(profile) => profile.name,
            SocialProfile::OAuth1(profile) => profile.name,
        }
    }

    /// Builds the provider with the given credentials and transport.
    pub fn build<C: OAuthHttpClient>(
        &self,
        credentials: ProviderCredentials,
        http: C,
    ) -> Arc<dyn AuthenticationProvider> {
        match self.profile {
            SocialProfile::OAuth2(profile) => {
                Arc::new(OAuth2Provider::new(*profile, credentials, http))
            }
            SocialProfile::OAuth1(profile) => {
                Arc::new(OAuth1Provider::new(*profile, credentials, http))
            }
        }
    }
}

pub static BUILTIN_PROVIDERS: &[BuiltinProvider] = &[
    BuiltinProvider { key: "google", profile: SocialProfile::OAuth2(&GOOGLE) },
    BuiltinProvider { key: "facebook", profile: SocialProfile::OAuth2(&FACEBOOK) },
    BuiltinProvider { key: "github", profile: SocialProfile::OAuth2(&GITHUB) },
    BuiltinProvider { key: "linkedin", profile: SocialProfile::OAuth2(&LINKEDIN) },
    BuiltinProvider { key: "instagram", profile: SocialProfile::OAuth2(&INSTAGRAM) },
    BuiltinProvider { key: "windowslive", profile: SocialProfile::OAuth2(&WINDOWS_LIVE) },
    BuiltinProvider { key: "twitter", profile: SocialProfile::OAuth1(&TWITTER) },
    BuiltinProvider { key: "bitbucket", profile: SocialProfile::OAuth1(&BITBUCKET) },
];

/// Case-insensitive lookup in [`BUILTIN_PROVIDERS`].
pub fn builtin(key: &str) -> Option<&'static BuiltinProvider> {
    BUILTIN_PROVIDERS.iter().find(|p| p.key.eq_ignore_ascii_case(key.trim()))
}

/// Registers the built-in provider `key` with explicit credentials.
pub fn register_builtin<C: OAuthHttpClient>(
    registry: &ProviderRegistry,
    key: &str,
    credentials: ProviderCredentials,
    http: C,
) -> Result<(), AuthError> {
    let entry = builtin(key)
        .ok_or_else(|| AuthError::NotFound(format!("'{key}' is not a built-in provider.")))?;
    registry.register(entry.key, entry.build(credentials, http), true)
}

/// Registers every built-in provider whose `{KEY}_PUBLIC_KEY` is set.
/// Returns the registered keys.
pub fn register_from_env<C: OAuthHttpClient>(
    registry: &ProviderRegistry,
    http: C,
) -> Result<Vec<&'static str>, AuthError> {
    let mut registered = Vec::new();
    for entry in BUILTIN_PROVIDERS {
        let prefix = entry.key.to_ascii_uppercase();
        if std::env::var_os(format!("{prefix}_PUBLIC_KEY")).is_none() {
            debug!(provider = entry.name(), "no credentials in the environment");
            continue;
        }
        let credentials = ProviderCredentials::from_env(&prefix)?;
        registry.register(entry.key, entry.build(credentials, http.clone()), true)?;
        registered.push(entry.key);
    }
    info!(count = registered.len(), "registered social providers from the environment");
    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth_core::http_client::InMemoryHttpClient;

    #[test]
    fn table_keys_are_unique_and_lowercase() {
        let mut keys: Vec<_> = BUILTIN_PROVIDERS.iter().map(|p| p.key).collect();
        assert!(keys.iter().all(|k| *k == k.to_lowercase()));
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), BUILTIN_PROVIDERS.len());
    }

    #[test]
    fn builtin_lookup_ignores_case() {
        assert_eq!(builtin("GitHub").map(|p| p.name()), Some("GitHub"));
        assert!(builtin("myspace").is_none());
    }

    #[test]
    fn oauth1_providers_carry_no_state_key() {
        let credentials = ProviderCredentials::new("ck", "cs").unwrap();
        let twitter = builtin("twitter")
            .unwrap()
            .build(credentials.clone(), InMemoryHttpClient::new());
        let google = builtin("google").unwrap().build(credentials, InMemoryHttpClient::new());
        assert_eq!(twitter.state_key(), None);
        assert_eq!(google.state_key(), Some("state"));
    }

    #[test]
    fn register_builtin_rejects_unknown_keys() {
        let registry = ProviderRegistry::new();
        let credentials = ProviderCredentials::new("ck", "cs").unwrap();
        let unknown =
            register_builtin(&registry, "myspace", credentials.clone(), InMemoryHttpClient::new());
        assert!(unknown.is_err());
        register_builtin(&registry, "Facebook", credentials, InMemoryHttpClient::new()).unwrap();
        assert_eq!(registry.resolve("facebook").unwrap().name(), "Facebook");
    }
}
