pub mod oauth_core;

#[cfg(feature = "social")]
pub mod social;

pub use oauth_core::codec::{build_query_string, parse_key_value_body, TokenFormat};
pub use oauth_core::csrf::{create_token, validate_token, CsrfToken};
pub use oauth_core::error::{AuthError, AuthStep};
pub use oauth_core::fake::FakeProvider;
pub use oauth_core::http_client::{
    HttpClientError, HttpMethod, HttpRequest, HttpResponse, InMemoryHttpClient, OAuthHttpClient,
};
#[cfg(feature = "reqwest")]
pub use oauth_core::http_client::{HttpClientConfig, ReqwestHttpClient};
pub use oauth_core::oauth1::{OAuth1Profile, OAuth1Provider};
pub use oauth_core::oauth2::{AccessTokenPlacement, ExpiryPolicy, OAuth2Profile, OAuth2Provider};
pub use oauth_core::provider::AuthenticationProvider;
pub use oauth_core::registry::ProviderRegistry;
pub use oauth_core::service::{AuthenticationService, CompletedAuthentication};
pub use oauth_core::store::{InMemoryStateStore, StateStore};
pub use oauth_core::types::{
    AccessToken, AuthenticatedClient, AuthenticationState, Gender, ProviderCredentials,
    RedirectSettings, UserInformation,
};
