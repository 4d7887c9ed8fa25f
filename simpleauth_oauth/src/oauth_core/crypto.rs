//! OAuth 1.0a request signing (HMAC-SHA1) using `ring`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::hmac;
use simpleauth_lib::random_alphanumeric_string;
use simpleauth_lib::url_encoding::{decode_form_owned, encode_url_owned};
use url::Url;

use super::error::AuthError;
use super::http_client::HttpMethod;

const NONCE_LENGTH: usize = 32;

/// Builds the signature base string: `METHOD&enc(base_url)&enc(sorted params)`.
///
/// Parameters are percent-encoded, then sorted by key and value.
pub fn signature_base_string(
    method: HttpMethod,
    base_url: &str,
    params: &[(String, String)],
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode_url_owned(k), encode_url_owned(v)))
        .collect();
    encoded.sort();
    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.as_str(),
        encode_url_owned(base_url),
        encode_url_owned(&normalized)
    )
}

/// HMAC-SHA1 of the base string keyed with `enc(consumer_secret)&enc(token_secret)`,
/// base64 encoded.
pub fn hmac_sha1_signature(consumer_secret: &str, token_secret: &str, base_string: &str) -> String {
    let key_material = format!(
        "{}&{}",
        encode_url_owned(consumer_secret),
        encode_url_owned(token_secret)
    );
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key_material.as_bytes());
    let tag = hmac::sign(&key, base_string.as_bytes());
    STANDARD.encode(tag.as_ref())
}

/// Signs a single OAuth 1.0a request and renders its `Authorization` header.
#[derive(Clone)]
pub struct OAuth1Signer<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: Option<&'a str>,
    token_secret: &'a str,
    callback: Option<&'a str>,
    verifier: Option<&'a str>,
}

impl<'a> OAuth1Signer<'a> {
    pub fn new(consumer_key: &'a str, consumer_secret: &'a str) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            token: None,
            token_secret: "",
            callback: None,
            verifier: None,
        }
    }

    pub fn token(mut self, token: &'a str, token_secret: &'a str) -> Self {
        self.token = Some(token);
        self.token_secret = token_secret;
        self
    }

    pub fn callback(mut self, callback: &'a str) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn verifier(mut self, verifier: &'a str) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Header for a request to `url` with a fresh nonce and the current time.
    pub fn authorization_header(&self, method: HttpMethod, url: &str) -> Result<String, AuthError> {
        let nonce = random_alphanumeric_string(NONCE_LENGTH);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, &nonce, &timestamp)
    }

    /// Header for a request to `url` with the given nonce and timestamp.
    ///
    /// Query parameters of `url` take part in the signature but are not
    /// repeated in the header.
    pub fn authorization_header_with(
        &self,
        method: HttpMethod,
        url: &str,
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, AuthError> {
        let oauth_params = self.oauth_params(nonce, timestamp);
        let signature = self.signature(method, url, &oauth_params, &[])?;
        let header = oauth_params
            .iter()
            .chain(std::iter::once(&("oauth_signature".to_string(), signature)))
            .map(|(k, v)| format!("{}=\"{}\"", encode_url_owned(k), encode_url_owned(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {header}"))
    }

    /// Signature over the oauth parameters, the query of `url` and any body
    /// parameters.
    pub fn signature(
        &self,
        method: HttpMethod,
        url: &str,
        oauth_params: &[(String, String)],
        body_params: &[(String, String)],
    ) -> Result<String, AuthError> {
        let parsed = Url::parse(url).map_err(|e| {
            AuthError::Configuration(format!("'{url}' is not a valid request URL: {e}."))
        })?;
        let mut params: Vec<(String, String)> = oauth_params.to_vec();
        if let Some(query) = parsed.query() {
            params.extend(query.split('&').filter(|p| !p.is_empty()).map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_form_owned(k), decode_form_owned(v))
            }));
        }
        params.extend(body_params.iter().cloned());

        let mut base_url = parsed;
        base_url.set_query(None);
        base_url.set_fragment(None);
        let base = signature_base_string(method, base_url.as_str(), &params);
        Ok(hmac_sha1_signature(self.consumer_secret, self.token_secret, &base))
    }

    /// The `oauth_*` protocol parameters, sorted by key.
    pub fn oauth_params(&self, nonce: &str, timestamp: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.to_string()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        if let Some(callback) = self.callback {
            params.push(("oauth_callback".to_string(), callback.to_string()));
        }
        if let Some(token) = self.token {
            params.push(("oauth_token".to_string(), token.to_string()));
        }
        if let Some(verifier) = self.verifier {
            params.push(("oauth_verifier".to_string(), verifier.to_string()));
        }
        params.sort();
        params
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Worked example from Twitter's "Creating a signature" documentation.
    const CONSUMER_KEY: &str = "xvz1evFS4wEEPTGEFPHBog";
    const CONSUMER_SECRET: &str = "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw";
    const TOKEN: &str = "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb";
    const TOKEN_SECRET: &str = "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE";
    const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const TIMESTAMP: &str = "1318622958";

    fn documented_params() -> Vec<(String, String)> {
        let signer = OAuth1Signer::new(CONSUMER_KEY, CONSUMER_SECRET).token(TOKEN, TOKEN_SECRET);
        let mut params = signer.oauth_params(NONCE, TIMESTAMP);
        params.push(("status".into(), "Hello Ladies + Gentlemen, a signed OAuth request!".into()));
        params.push(("include_entities".into(), "true".into()));
        params
    }

    #[test]
    fn base_string_matches_documented_example() {
        let base = signature_base_string(
            HttpMethod::POST,
            "https://api.twitter.com/1.1/statuses/update.json",
            &documented_params(),
        );
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json\
             &include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog\
             %26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg\
             %26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958\
             %26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb\
             %26oauth_version%3D1.0\
             %26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed\
             %2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn signature_matches_documented_example() {
        let base = signature_base_string(
            HttpMethod::POST,
            "https://api.twitter.com/1.1/statuses/update.json",
            &documented_params(),
        );
        assert_eq!(
            hmac_sha1_signature(CONSUMER_SECRET, TOKEN_SECRET, &base),
            "hCtSmYh+iHYCEqBWrE7C7hYmtUk="
        );
    }

    #[test]
    fn query_and_body_parameters_are_signed() {
        let signer = OAuth1Signer::new(CONSUMER_KEY, CONSUMER_SECRET).token(TOKEN, TOKEN_SECRET);
        let oauth = signer.oauth_params(NONCE, TIMESTAMP);
        let signature = signer
            .signature(
                HttpMethod::POST,
                "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
                &oauth,
                &[("status".into(), "Hello Ladies + Gentlemen, a signed OAuth request!".into())],
            )
            .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn header_lists_oauth_params_and_signature() {
        let header = OAuth1Signer::new("ck", "cs")
            .callback("https://app.local/cb")
            .authorization_header_with(
                HttpMethod::POST,
                "https://api.local/request_token",
                "n1",
                "1",
            )
            .unwrap();
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_callback=\"https%3A%2F%2Fapp.local%2Fcb\""));
        assert!(header.contains("oauth_consumer_key=\"ck\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn empty_token_secret_is_part_of_the_key() {
        let a = hmac_sha1_signature("cs", "", "base");
        let b = hmac_sha1_signature("cs", "ts", "base");
        assert_ne!(a, b);
    }

    #[test]
    fn fresh_nonce_per_header() {
        let signer = OAuth1Signer::new("ck", "cs");
        let a = signer.authorization_header(HttpMethod::GET, "https://api.local/me").unwrap();
        let b = signer.authorization_header(HttpMethod::GET, "https://api.local/me").unwrap();
        assert_ne!(a, b);
    }
}
