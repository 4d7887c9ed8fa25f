//! Walks through a GitHub login against canned HTTP responses.
//! Run with: `cargo run --example login_flow`

use std::collections::HashMap;

use serde_json::json;
use simpleauth_oauth::social;
use simpleauth_oauth::{
    AuthError, AuthenticationService, HttpResponse, InMemoryHttpClient, InMemoryStateStore,
    ProviderCredentials, ProviderRegistry,
};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), AuthError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let http = InMemoryHttpClient::new();
    http.insert_response(
        "https://github.com/login/oauth/access_token",
        HttpResponse::json(&json!({"access_token": "gho_demo", "token_type": "bearer"})),
    );
    http.insert_response(
        "https://api.github.com/user",
        HttpResponse::json(&json!({"id": 1, "login": "octocat", "name": "The Octocat"})),
    );

    let registry = ProviderRegistry::new();
    let credentials = ProviderCredentials::new("demo-client", "demo-secret")?;
    social::register_builtin(&registry, "github", credentials, http)?;
    let service = AuthenticationService::new(registry);
    let store = InMemoryStateStore::new();
    let callback = Url::parse("http://localhost:8080/auth/github/callback")
        .map_err(|e| AuthError::Configuration(e.to_string()))?;

    let redirect = service
        .begin_with_store(&store, "session-1", "github", &callback, Some("/dashboard"))
        .await?;
    println!("Redirect the browser to: {}", redirect.redirect_uri);

    // What GitHub would send back to the callback.
    let mut query: HashMap<String, String> = redirect
        .redirect_uri
        .query_pairs()
        .filter(|(k, _)| k == "state")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    query.insert("code".to_string(), "demo-code".to_string());

    let completed = service
        .complete_with_store(&store, "session-1", "github", &query, &callback)
        .await?;
    println!(
        "Signed in {} ({}) via {}, returning to {}",
        completed.client.user_information.name.as_deref().unwrap_or("unknown"),
        completed.client.user_information.id,
        completed.client.provider_name,
        completed.return_url.as_deref().unwrap_or("/"),
    );
    Ok(())
}
