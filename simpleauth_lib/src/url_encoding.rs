use percent_encoding::{percent_decode, percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 unreserved characters (`ALPHA / DIGIT / "-" / "." / "_" / "~"`) stay
/// as-is, everything else is escaped. This is also the encoding OAuth 1.0a
/// mandates for signature base strings.
const UNRESERVED_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encodes a string for URL safety and returns an owned `String`
///
/// # Example
/// ```
/// use simpleauth_lib::url_encoding::encode_url_owned;
/// let encoded = encode_url_owned("Hello World!");
/// assert_eq!(encoded, "Hello%20World%21");
/// ```
pub fn encode_url_owned(input: &str) -> String {
    percent_encode(input.as_bytes(), UNRESERVED_SET).to_string()
}

/// Decodes a URL-encoded string and returns an owned `String`.
///
/// Invalid UTF-8 sequences are replaced, `+` is left untouched.
pub fn decode_url_owned(input: &str) -> String {
    percent_decode(input.as_bytes())
        .decode_utf8_lossy()
        .into_owned()
}

/// Decodes a form-urlencoded value, where `+` stands for a space.
pub fn decode_form_owned(input: &str) -> String {
    decode_url_owned(&input.replace('+', " "))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unreserved_characters_are_kept() {
        assert_eq!(encode_url_owned("AZaz09-._~"), "AZaz09-._~");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(encode_url_owned("a+b c/d=e&f"), "a%2Bb%20c%2Fd%3De%26f");
        assert_eq!(encode_url_owned("é"), "%C3%A9");
    }

    #[test]
    fn decode_reverses_encode() {
        let original = "Hello Ladies + Gentlemen, a signed OAuth request!";
        assert_eq!(decode_url_owned(&encode_url_owned(original)), original);
    }

    #[test]
    fn form_decoding_maps_plus_to_space() {
        assert_eq!(decode_form_owned("a+b%2Bc"), "a b+c");
        assert_eq!(decode_url_owned("a+b"), "a+b");
    }
}
