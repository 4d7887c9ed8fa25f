use std::collections::HashMap;

use serde_json::json;
use simpleauth_oauth::oauth_core::http_client::HttpMethod;
use simpleauth_oauth::{
    AuthError, AuthStep, ExpiryPolicy, HttpResponse, InMemoryHttpClient, OAuth2Profile,
    OAuth2Provider, ProviderCredentials, TokenFormat,
};
use url::Url;

const TOKEN_URL: &str = "https://auth.local/token";
const PROFILE_URL: &str = "https://api.local/me";

const PROFILE: OAuth2Profile =
    OAuth2Profile::new("Local", "https://auth.local/authorize", TOKEN_URL, PROFILE_URL)
        .default_scopes(&["profile"]);

fn provider_with(
    profile: OAuth2Profile,
    http: &InMemoryHttpClient,
) -> OAuth2Provider<InMemoryHttpClient> {
    let credentials = ProviderCredentials::new("client1", "secret1").unwrap();
    OAuth2Provider::new(profile, credentials, http.clone())
}

fn callback() -> Url {
    Url::parse("https://app.local/callback").unwrap()
}

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn test_code_exchange_and_profile() {
    let http = InMemoryHttpClient::new();
    http.insert_response(
        TOKEN_URL,
        HttpResponse::json(&json!({"access_token": "T1", "expires_in": 3600})),
    );
    http.insert_response(PROFILE_URL, HttpResponse::json(&json!({"id": "42", "name": "Ann"})));
    let provider = provider_with(PROFILE, &http);

    let client = provider
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap();

    assert_eq!(client.provider_name, "Local");
    assert_eq!(client.access_token.token, "T1");
    assert!(!client.access_token.never_expires());
    assert_eq!(client.user_information.id, "42");
    assert_eq!(client.user_information.name.as_deref(), Some("Ann"));
    assert_eq!(client.raw_user_information, r#"{"id":"42","name":"Ann"}"#);

    let requests = http.requests();
    assert_eq!(requests.len(), 2);
    let exchange = &requests[0];
    assert_eq!(exchange.method, HttpMethod::POST);
    assert_eq!(exchange.url, TOKEN_URL);
    let body = String::from_utf8(exchange.body.clone().unwrap()).unwrap();
    assert_eq!(
        body,
        "client_id=client1&client_secret=secret1\
         &redirect_uri=https%3A%2F%2Fapp.local%2Fcallback&code=C1&grant_type=authorization_code"
    );
    assert_eq!(requests[1].header_value("authorization"), Some("Bearer T1"));
}

#[tokio::test]
async fn test_missing_user_id() {
    let http = InMemoryHttpClient::new();
    http.insert_response(
        TOKEN_URL,
        HttpResponse::json(&json!({"access_token": "T1", "expires_in": 3600})),
    );
    http.insert_response(PROFILE_URL, HttpResponse::json(&json!({"name": "Ann"})));

    let err = provider_with(PROFILE, &http)
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ProviderProtocol { step: AuthStep::UserInformation, .. }));
    assert!(err.to_string().contains("User Id"));
}

#[tokio::test]
async fn test_provider_error_is_passed_through_without_http() {
    let http = InMemoryHttpClient::new();
    let err = provider_with(PROFILE, &http)
        .complete_authentication(&query(&[("state", "X"), ("error", "denied")]), "X", &callback())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ProviderProtocol { step: AuthStep::Callback, .. }));
    assert!(err.to_string().contains("denied"));
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn test_state_mismatch_fails_before_any_http() {
    let http = InMemoryHttpClient::new();
    let provider = provider_with(PROFILE, &http);

    let err = provider
        .complete_authentication(&query(&[("state", "Y"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CsrfValidation(_)));
    assert!(err.to_string().contains("'Y'") && err.to_string().contains("'X'"));

    let err = provider
        .complete_authentication(&query(&[("code", "C1")]), "X", &callback())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CsrfValidation(_)));
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn test_missing_code() {
    let http = InMemoryHttpClient::new();
    let err = provider_with(PROFILE, &http)
        .complete_authentication(&query(&[("state", "X")]), "X", &callback())
        .await
        .unwrap_err();
    assert_eq!(err.step(), Some(AuthStep::Callback));
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn test_token_endpoint_failure_reports_status_and_body() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::new(400, r#"{"error":"invalid_grant"}"#));

    let err = provider_with(PROFILE, &http)
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(AuthStep::TokenExchange));
    let message = err.to_string();
    assert!(message.contains("400"));
    assert!(message.contains("invalid_grant"));
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn test_missing_access_token() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(&json!({"token_type": "bearer"})));

    let err = provider_with(PROFILE, &http)
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("access_token"));
}

#[tokio::test]
async fn test_key_value_token_body_without_expiry_never_expires() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::new(200, "access_token=T2&token_type=bearer"));
    http.insert_response(PROFILE_URL, HttpResponse::json(&json!({"id": 7})));

    let client = provider_with(PROFILE.token_format(TokenFormat::Detect), &http)
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap();
    assert_eq!(client.access_token.token, "T2");
    assert!(client.access_token.never_expires());
    assert_eq!(client.user_information.id, "7");
}

#[tokio::test]
async fn test_non_positive_expiry_never_expires() {
    let http = InMemoryHttpClient::new();
    http.insert_response(
        TOKEN_URL,
        HttpResponse::json(&json!({"access_token": "T1", "expires_in": 0})),
    );
    http.insert_response(PROFILE_URL, HttpResponse::json(&json!({"id": "42"})));

    let client = provider_with(PROFILE.expiry("expires_in", ExpiryPolicy::Required), &http)
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap();
    assert!(client.access_token.never_expires());
}

#[tokio::test]
async fn test_required_expiry_must_be_present() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(&json!({"access_token": "T1"})));

    let err = provider_with(PROFILE.expiry("expires_in", ExpiryPolicy::Required), &http)
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap_err();
    assert_eq!(err.step(), Some(AuthStep::TokenExchange));
    assert!(err.to_string().contains("expires_in"));
}

#[tokio::test]
async fn test_transport_failure_is_wrapped() {
    use std::error::Error as _;

    let http = InMemoryHttpClient::new();
    let err = provider_with(PROFILE, &http)
        .complete_authentication(&query(&[("state", "X"), ("code", "C1")]), "X", &callback())
        .await
        .unwrap_err();
    assert_eq!(err.step(), Some(AuthStep::TokenExchange));
    assert!(err.source().is_some());
}

#[tokio::test]
async fn test_begin_then_complete_with_kept_state() {
    let http = InMemoryHttpClient::new();
    http.insert_response(
        TOKEN_URL,
        HttpResponse::json(&json!({"access_token": "T1", "expires_in": 3600})),
    );
    http.insert_response(PROFILE_URL, HttpResponse::json(&json!({"id": "42"})));
    let provider = provider_with(PROFILE, &http);

    let redirect = provider.begin_authentication(&callback()).unwrap();
    assert!(
        redirect
            .redirect_uri
            .as_str()
            .starts_with("https://auth.local/authorize?client_id=client1&")
    );
    let sent_state = redirect
        .redirect_uri
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let callback_query = query(&[("state", &sent_state), ("code", "C1")]);
    let client = provider
        .complete_authentication(&callback_query, &redirect.state, &callback())
        .await
        .unwrap();
    assert_eq!(client.user_information.id, "42");
}
