pub use simpleauth_oauth::oauth_core;
pub use simpleauth_oauth::social;

pub use simpleauth_oauth::{
    AccessToken, AuthError, AuthStep, AuthenticatedClient, AuthenticationProvider,
    AuthenticationService, AuthenticationState, CompletedAuthentication, FakeProvider, Gender,
    InMemoryStateStore, OAuth1Profile, OAuth1Provider, OAuth2Profile, OAuth2Provider,
    ProviderCredentials, ProviderRegistry, RedirectSettings, StateStore, UserInformation,
};
pub use simpleauth_oauth::{
    HttpClientError, HttpMethod, HttpRequest, HttpResponse, InMemoryHttpClient, OAuthHttpClient,
};
#[cfg(feature = "reqwest")]
pub use simpleauth_oauth::{HttpClientConfig, ReqwestHttpClient};

pub use simpleauth_lib as lib;

pub mod prelude {
    pub use simpleauth_oauth::social::{register_builtin, register_from_env};
    pub use simpleauth_oauth::{
        AuthError, AuthenticatedClient, AuthenticationProvider, AuthenticationService,
        InMemoryStateStore, OAuthHttpClient, ProviderCredentials, ProviderRegistry,
        RedirectSettings, StateStore,
    };
}
