//! Parsing of provider token responses and construction of outgoing query
//! strings.

use std::collections::HashMap;

use serde_json::Value;
use simpleauth_lib::url_encoding::{decode_form_owned, encode_url_owned};
use url::Url;

use super::types::DEFAULT_STATE_KEY;

/// Wire format of a provider's token response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFormat {
    /// JSON object, falling back to key-value when the body is not JSON.
    Json,
    /// `a=b&c=d`.
    KeyValue,
    /// JSON when the content type says so or the body looks like an object,
    /// key-value otherwise.
    Detect,
}

/// Splits `a=1&b=2` into a map. Segments that do not split into exactly one
/// key and one value are dropped.
pub fn parse_key_value_body(content: &str) -> HashMap<String, String> {
    content
        .trim()
        .split('&')
        .filter_map(|segment| {
            let mut parts = segment.split('=');
            let (key, value) = (parts.next()?, parts.next()?);
            if parts.next().is_some() || key.is_empty() {
                return None;
            }
            Some((decode_form_owned(key), decode_form_owned(value)))
        })
        .collect()
}

/// Flattens the top level of a JSON object into a string map. Numbers and
/// booleans are stringified, `null` members are skipped and nested values are
/// kept as JSON text. Returns `None` when the body is not a JSON object.
pub fn parse_json_body(content: &str) -> Option<HashMap<String, String>> {
    match serde_json::from_str::<Value>(content).ok()? {
        Value::Object(members) => Some(
            members
                .into_iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::Null => return None,
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        other => other.to_string(),
                    };
                    Some((key, value))
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Parses a token response into the same flat map whatever its wire format.
pub fn parse_token_body(
    content: &str,
    content_type: Option<&str>,
    format: TokenFormat,
) -> HashMap<String, String> {
    let as_json = match format {
        TokenFormat::Json => true,
        TokenFormat::KeyValue => false,
        TokenFormat::Detect => {
            content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
                || content.trim_start().starts_with('{')
        }
    };
    if as_json {
        if let Some(map) = parse_json_body(content) {
            return map;
        }
    }
    parse_key_value_body(content)
}

/// Percent-encodes pairs as `k=v&k=v`, keeping their order.
pub fn encode_pairs<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_url_owned(k.as_ref()), encode_url_owned(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends `params` to the query of `base`.
///
/// Keys and values are percent-encoded per RFC 3986 and keep their order.
/// A `state` parameter replaces an existing `state` in place instead of being
/// appended; every other key is appended even when already present.
pub fn build_query_string<K, V>(base: &Url, params: &[(K, V)]) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<String> = base
        .query()
        .map(|q| q.split('&').filter(|p| !p.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    for (key, value) in params {
        let (key, value) = (key.as_ref(), value.as_ref());
        let encoded = format!("{}={}", encode_url_owned(key), encode_url_owned(value));
        if key == DEFAULT_STATE_KEY {
            if let Some(existing) = pairs.iter_mut().find(|p| pair_key(p) == DEFAULT_STATE_KEY) {
                *existing = encoded;
                continue;
            }
        }
        pairs.push(encoded);
    }

    let mut url = base.clone();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&pairs.join("&")));
    }
    url
}

fn pair_key(pair: &str) -> String {
    decode_form_owned(pair.split('=').next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn key_value_body_is_split() {
        assert_eq!(parse_key_value_body("a=1&b=2&c=3"), map(&[("a", "1"), ("b", "2"), ("c", "3")]));
    }

    #[test]
    fn key_value_body_drops_garbage() {
        assert!(parse_key_value_body("garbage no equals").is_empty());
        assert!(parse_key_value_body("").is_empty());
        assert_eq!(parse_key_value_body("a=1&garbage"), map(&[("a", "1")]));
        assert_eq!(parse_key_value_body("a=1&b=2=3&=4"), map(&[("a", "1")]));
    }

    #[test]
    fn key_value_body_is_decoded() {
        let parsed = parse_key_value_body("oauth_token=a%2Fb&name=Ann+Lee\n");
        assert_eq!(parsed["oauth_token"], "a/b");
        assert_eq!(parsed["name"], "Ann Lee");
    }

    #[test]
    fn json_and_key_value_produce_the_same_map() {
        let json = parse_token_body(
            r#"{"access_token":"T1","expires_in":3600,"refresh":null}"#,
            Some("application/json"),
            TokenFormat::Detect,
        );
        let kv = parse_token_body(
            "access_token=T1&expires_in=3600",
            Some("text/plain"),
            TokenFormat::Detect,
        );
        assert_eq!(json, kv);
    }

    #[test]
    fn json_format_falls_back_to_key_value() {
        let parsed = parse_token_body("access_token=T1&expires=5108", None, TokenFormat::Json);
        assert_eq!(parsed, map(&[("access_token", "T1"), ("expires", "5108")]));
    }

    #[test]
    fn key_value_format_ignores_json_content_type() {
        let parsed = parse_token_body(
            r#"{"access_token":"T1"}"#,
            Some("application/json"),
            TokenFormat::KeyValue,
        );
        assert!(parsed.is_empty());
    }

    #[test]
    fn nested_json_values_are_kept_as_text() {
        let parsed = parse_json_body(r#"{"user":{"id":1},"ok":true}"#).unwrap();
        assert_eq!(parsed["user"], r#"{"id":1}"#);
        assert_eq!(parsed["ok"], "true");
        assert!(parse_json_body("[1,2]").is_none());
    }

    #[test]
    fn query_string_preserves_order_and_encodes() {
        let base = Url::parse("https://auth.local/authorize").unwrap();
        let url = build_query_string(
            &base,
            &[("client_id", "abc"), ("redirect_uri", "https://app.local/cb?x=1 2")],
        );
        assert_eq!(
            url.as_str(),
            "https://auth.local/authorize?client_id=abc\
             &redirect_uri=https%3A%2F%2Fapp.local%2Fcb%3Fx%3D1%202"
        );
    }

    #[test]
    fn query_string_replaces_existing_state_once() {
        let base = Url::parse("https://auth.local/authorize?state=old&prompt=login").unwrap();
        let url = build_query_string(&base, &[("client_id", "abc"), ("state", "new")]);
        assert_eq!(
            url.as_str(),
            "https://auth.local/authorize?state=new&prompt=login&client_id=abc"
        );
        assert_eq!(url.query_pairs().filter(|(k, _)| k == "state").count(), 1);
    }

    #[test]
    fn query_string_appends_other_repeated_keys() {
        let base = Url::parse("https://auth.local/authorize?scope=a").unwrap();
        let url = build_query_string(&base, &[("scope", "b")]);
        assert_eq!(url.as_str(), "https://auth.local/authorize?scope=a&scope=b");
    }

    #[test]
    fn query_string_appends_state_when_absent() {
        let base = Url::parse("https://auth.local/authorize").unwrap();
        let url = build_query_string(&base, &[("state", "s1")]);
        assert_eq!(url.as_str(), "https://auth.local/authorize?state=s1");
    }

    #[test]
    fn pairs_are_form_encoded() {
        assert_eq!(encode_pairs(&[("a", "1 2"), ("b", "x&y")]), "a=1%202&b=x%26y");
    }
}
