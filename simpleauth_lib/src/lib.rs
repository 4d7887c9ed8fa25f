#[cfg(feature = "url_encoding")]
pub mod url_encoding;

#[cfg(feature = "url_encoding")]
pub use url_encoding::{decode_url_owned, encode_url_owned};

use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a random string of the given length drawn from `[A-Za-z0-9]`.
///
/// Used for OAuth 1.0a nonces, where providers reject anything outside the
/// unreserved character set.
pub fn random_alphanumeric_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
