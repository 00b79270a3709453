//! URI encoding of endpoints before transmission.

use url::Url;

/// Parse an endpoint and return its serialized, percent-encoded form.
///
/// Spaces, quotes, control characters and non-ASCII are percent-encoded as
/// UTF-8; existing `%XX` escapes are kept. The host is normalized, so
/// `http://H` becomes `http://h/`.
///
/// # Examples
///
/// - `encode_uri("http://h/a b")` → `Ok("http://h/a%20b")`
/// - `encode_uri("http://h/caf%C3%A9?q=é")` → `Ok("http://h/caf%C3%A9?q=%C3%A9")`
pub fn encode_uri(endpoint: &str) -> Result<String, url::ParseError> {
    Ok(Url::parse(endpoint)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_urls_are_unchanged() {
        let url = "https://example.com/path/to/file.iso?x=1&y=two#frag";
        assert_eq!(encode_uri(url).unwrap(), url);
    }

    #[test]
    fn spaces_and_quotes_are_escaped() {
        assert_eq!(
            encode_uri("http://h/a b/\"c\"").unwrap(),
            "http://h/a%20b/%22c%22"
        );
        assert_eq!(encode_uri("http://h/?q=a b").unwrap(), "http://h/?q=a%20b");
    }

    #[test]
    fn non_ascii_is_utf8_percent_encoded() {
        assert_eq!(encode_uri("http://h/café").unwrap(), "http://h/caf%C3%A9");
        assert_eq!(encode_uri("http://h/☃").unwrap(), "http://h/%E2%98%83");
        assert_eq!(
            encode_uri("http://h/caf%C3%A9?q=é").unwrap(),
            "http://h/caf%C3%A9?q=%C3%A9"
        );
    }

    #[test]
    fn existing_escapes_are_not_double_encoded() {
        assert_eq!(encode_uri("http://h/a%20b").unwrap(), "http://h/a%20b");
        assert_eq!(encode_uri("http://h/a%2fb").unwrap(), "http://h/a%2fb");
    }

    #[test]
    fn ipv6_brackets_survive() {
        assert_eq!(
            encode_uri("http://[::1]:8080/x").unwrap(),
            "http://[::1]:8080/x"
        );
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(encode_uri("http://h/a\u{1}b").unwrap(), "http://h/a%01b");
    }

    #[test]
    fn host_is_normalized() {
        assert_eq!(encode_uri("HTTP://Example.COM").unwrap(), "http://example.com/");
    }

    #[test]
    fn unparseable_endpoints_are_rejected() {
        assert_eq!(
            encode_uri("not a url"),
            Err(url::ParseError::RelativeUrlWithoutBase)
        );
        assert!(encode_uri("http://").is_err());
    }
}
