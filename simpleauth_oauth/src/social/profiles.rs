// Built-in provider profiles and their profile-field mappings.

use serde_json::Value;

use crate::oauth_core::codec::TokenFormat;
use crate::oauth_core::oauth1::OAuth1Profile;
use crate::oauth_core::oauth2::{AccessTokenPlacement, ExpiryPolicy, OAuth2Profile};
use crate::oauth_core::profile::{first_string, full_name, json_string};
use crate::oauth_core::types::{Gender, UserInformation};

fn gender(data: &Value, path: &str) -> Gender {
    json_string(data, path).map(|g| Gender::parse(&g)).unwrap_or_default()
}

// --- Google ---
pub static GOOGLE: OAuth2Profile = OAuth2Profile::new(
    "Google",
    "https://accounts.google.com/o/oauth2/auth",
    "https://accounts.google.com/o/oauth2/token",
    "https://www.googleapis.com/oauth2/v2/userinfo",
)
.default_scopes(&["profile", "email"])
.token_format(TokenFormat::Json)
.map_user(map_google_user);

fn map_google_user(data: &Value) -> UserInformation {
    UserInformation {
        id: json_string(data, "id").unwrap_or_default(),
        name: json_string(data, "name")
            .or_else(|| {
                full_name(json_string(data, "given_name"), json_string(data, "family_name"))
            }),
        user_name: None,
        email: json_string(data, "email"),
        locale: json_string(data, "locale"),
        picture_url: json_string(data, "picture"),
        gender: gender(data, "gender"),
    }
}

// --- Facebook ---
pub static FACEBOOK: OAuth2Profile = OAuth2Profile::new(
    "Facebook",
    "https://www.facebook.com/dialog/oauth",
    "https://graph.facebook.com/oauth/access_token",
    "https://graph.facebook.com/me?fields=id,name,email,first_name,last_name,locale,gender,picture",
)
.default_scopes(&["public_profile", "email"])
.scope_parameter("scope", ",")
.expiry("expires", ExpiryPolicy::Optional)
.access_token_placement(AccessTokenPlacement::QueryParameter("access_token"))
.map_user(map_facebook_user);

fn map_facebook_user(data: &Value) -> UserInformation {
    let id = json_string(data, "id").unwrap_or_default();
    let picture_url = json_string(data, "picture.data.url")
        .or_else(|| (!id.is_empty()).then(|| format!("https://graph.facebook.com/{id}/picture")));
    UserInformation {
        name: json_string(data, "name")
            .or_else(|| full_name(json_string(data, "first_name"), json_string(data, "last_name"))),
        user_name: json_string(data, "username"),
        email: json_string(data, "email"),
        locale: json_string(data, "locale"),
        picture_url,
        gender: gender(data, "gender"),
        id,
    }
}

// --- GitHub ---
pub static GITHUB: OAuth2Profile = OAuth2Profile::new(
    "GitHub",
    "https://github.com/login/oauth/authorize",
    "https://github.com/login/oauth/access_token",
    "https://api.github.com/user",
)
.default_scopes(&["user:email"])
.access_token_placement(AccessTokenPlacement::AuthorizationHeader("token"))
.user_info_headers(&[("User-Agent", "simpleauth")])
.map_user(map_github_user);

fn map_github_user(data: &Value) -> UserInformation {
    UserInformation {
        id: json_string(data, "id").unwrap_or_default(),
        name: json_string(data, "name"),
        user_name: json_string(data, "login"),
        email: json_string(data, "email"),
        locale: None,
        picture_url: json_string(data, "avatar_url"),
        gender: Gender::Unknown,
    }
}

// --- LinkedIn ---
pub static LINKEDIN: OAuth2Profile = OAuth2Profile::new(
    "LinkedIn",
    "https://www.linkedin.com/oauth/v2/authorization",
    "https://www.linkedin.com/oauth/v2/accessToken",
    "https://api.linkedin.com/v1/people/\
     ~:(id,first-name,last-name,email-address,picture-url)?format=json",
)
.default_scopes(&["r_basicprofile", "r_emailaddress"])
.token_format(TokenFormat::Json)
.expiry("expires_in", ExpiryPolicy::Required)
.access_token_placement(AccessTokenPlacement::QueryParameter("oauth2_access_token"))
.map_user(map_linkedin_user);

fn map_linkedin_user(data: &Value) -> UserInformation {
    UserInformation {
        id: json_string(data, "id").unwrap_or_default(),
        name: full_name(json_string(data, "firstName"), json_string(data, "lastName")),
        user_name: None,
        email: json_string(data, "emailAddress"),
        locale: None,
        picture_url: json_string(data, "pictureUrl"),
        gender: Gender::Unknown,
    }
}

// --- Instagram ---
pub static INSTAGRAM: OAuth2Profile = OAuth2Profile::new(
    "Instagram",
    "https://api.instagram.com/oauth/authorize",
    "https://api.instagram.com/oauth/access_token",
    "https://api.instagram.com/v1/users/self",
)
.default_scopes(&["basic"])
.access_token_placement(AccessTokenPlacement::QueryParameter("access_token"))
.map_user(map_instagram_user);

fn map_instagram_user(data: &Value) -> UserInformation {
    UserInformation {
        id: json_string(data, "data.id").unwrap_or_default(),
        name: json_string(data, "data.full_name"),
        user_name: json_string(data, "data.username"),
        email: None,
        locale: None,
        picture_url: json_string(data, "data.profile_picture"),
        gender: Gender::Unknown,
    }
}

// --- Windows Live ---
pub static WINDOWS_LIVE: OAuth2Profile = OAuth2Profile::new(
    "WindowsLive",
    "https://login.live.com/oauth20_authorize.srf",
    "https://login.live.com/oauth20_token.srf",
    "https://apis.live.net/v5.0/me",
)
.default_scopes(&["wl.signin", "wl.basic", "wl.emails"])
.access_token_placement(AccessTokenPlacement::QueryParameter("access_token"))
.map_user(map_windows_live_user);

fn map_windows_live_user(data: &Value) -> UserInformation {
    let id = json_string(data, "id").unwrap_or_default();
    UserInformation {
        name: json_string(data, "name")
            .or_else(|| full_name(json_string(data, "first_name"), json_string(data, "last_name"))),
        user_name: None,
        email: first_string(data, &["emails.preferred", "emails.account"]),
        locale: json_string(data, "locale"),
        picture_url: (!id.is_empty()).then(|| format!("https://apis.live.net/v5.0/{id}/picture")),
        gender: gender(data, "gender"),
        id,
    }
}

// --- Twitter (OAuth 1.0a) ---
pub static TWITTER: OAuth1Profile = OAuth1Profile {
    name: "Twitter",
    request_token_endpoint: "https://api.twitter.com/oauth/request_token",
    authorize_endpoint: "https://api.twitter.com/oauth/authenticate",
    access_token_endpoint: "https://api.twitter.com/oauth/access_token",
    user_info_endpoint: "https://api.twitter.com/1.1/account/verify_credentials.json",
    map_user: map_twitter_user,
};

fn map_twitter_user(data: &Value) -> UserInformation {
    UserInformation {
        id: first_string(data, &["id_str", "id"]).unwrap_or_default(),
        name: json_string(data, "name"),
        user_name: json_string(data, "screen_name"),
        email: json_string(data, "email"),
        locale: json_string(data, "lang"),
        picture_url: first_string(data, &["profile_image_url_https", "profile_image_url"]),
        gender: Gender::Unknown,
    }
}

// --- BitBucket (OAuth 1.0a) ---
pub static BITBUCKET: OAuth1Profile = OAuth1Profile {
    name: "BitBucket",
    request_token_endpoint: "https://bitbucket.org/api/1.0/oauth/request_token",
    authorize_endpoint: "https://bitbucket.org/api/1.0/oauth/authenticate",
    access_token_endpoint: "https://bitbucket.org/api/1.0/oauth/access_token",
    user_info_endpoint: "https://bitbucket.org/api/1.0/user",
    map_user: map_bitbucket_user,
};

fn map_bitbucket_user(data: &Value) -> UserInformation {
    let user_name = json_string(data, "user.username");
    UserInformation {
        id: user_name.clone().unwrap_or_default(),
        name: json_string(data, "user.display_name")
            .or_else(|| {
                full_name(json_string(data, "user.first_name"), json_string(data, "user.last_name"))
            }),
        user_name,
        email: None,
        locale: None,
        picture_url: json_string(data, "user.avatar"),
        gender: Gender::Unknown,
    }
}
