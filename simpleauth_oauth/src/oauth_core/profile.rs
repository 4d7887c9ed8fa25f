//! Helpers for projecting a provider's JSON profile onto [`UserInformation`].

use serde_json::Value;

use super::types::{Gender, UserInformation};

/// Maps a parsed profile document to user information. An empty `id` means
/// the provider did not return the user's identifier.
pub type UserMapper = fn(&Value) -> UserInformation;

/// Reads a dot-separated path (`"data.user.id"`). Strings are returned as-is,
/// numbers and booleans stringified; empty strings count as missing.
pub fn json_string(data: &Value, path: &str) -> Option<String> {
    let mut current = data;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    match current {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First path that yields a value.
pub fn first_string(data: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| json_string(data, path))
}

/// Joins two optional name parts with a space.
pub fn full_name(first: Option<String>, last: Option<String>) -> Option<String> {
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{f} {l}")),
        (Some(f), None) => Some(f),
        (None, Some(l)) => Some(l),
        (None, None) => None,
    }
}

/// Mapping for OpenID-Connect style profiles, used by custom providers.
pub fn map_standard_user(data: &Value) -> UserInformation {
    UserInformation {
        id: first_string(data, &["id", "sub", "user_id"]).unwrap_or_default(),
        name: first_string(data, &["name", "display_name"])
            .or_else(|| {
                full_name(json_string(data, "given_name"), json_string(data, "family_name"))
            }),
        user_name: first_string(data, &["username", "preferred_username", "login"]),
        email: json_string(data, "email"),
        locale: first_string(data, &["locale", "lang"]),
        picture_url: first_string(data, &["picture", "avatar_url", "picture.data.url"]),
        gender: json_string(data, "gender").map(|g| Gender::parse(&g)).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_paths_and_numbers() {
        let data = json!({"data": {"user": {"id": 42, "name": "Ann", "blank": ""}}});
        assert_eq!(json_string(&data, "data.user.id").as_deref(), Some("42"));
        assert_eq!(json_string(&data, "data.user.name").as_deref(), Some("Ann"));
        assert_eq!(json_string(&data, "data.user.blank"), None);
        assert_eq!(json_string(&data, "data.missing.id"), None);
    }

    #[test]
    fn standard_mapping() {
        let user = map_standard_user(&json!({
            "sub": "abc",
            "given_name": "Ann",
            "family_name": "Lee",
            "preferred_username": "ann",
            "email": "ann@example.com",
            "gender": "female"
        }));
        assert_eq!(user.id, "abc");
        assert_eq!(user.name.as_deref(), Some("Ann Lee"));
        assert_eq!(user.user_name.as_deref(), Some("ann"));
        assert_eq!(user.email.as_deref(), Some("ann@example.com"));
        assert_eq!(user.gender, Gender::Female);
    }

    #[test]
    fn missing_id_maps_to_empty() {
        assert!(map_standard_user(&json!({"name": "Ann"})).id.is_empty());
    }
}
