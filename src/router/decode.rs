//! Strict percent-decoding of request paths

use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};

/// Percent-decode a request path
///
/// Unlike `percent_decode_str` on its own, a `%` that is not followed by two
/// hex digits is an error rather than being passed through, and the decoded
/// bytes must be valid UTF-8.
pub fn decode_path(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(Error::Decode(format!(
                "invalid escape at byte {i} in '{raw}'"
            )));
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| Error::Decode(format!("'{raw}' is not UTF-8 once decoded: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_unchanged() {
        assert_eq!(decode_path("/public/test.html").unwrap(), "/public/test.html");
    }

    #[test]
    fn test_decodes_escapes() {
        assert_eq!(decode_path("/api/Jan%201%202024").unwrap(), "/api/Jan 1 2024");
        assert_eq!(decode_path("/a%2Fb").unwrap(), "/a/b");
        assert_eq!(decode_path("/caf%C3%A9").unwrap(), "/café");
    }

    #[test]
    fn test_rejects_truncated_escape() {
        assert!(matches!(decode_path("/bad%"), Err(Error::Decode(_))));
        assert!(matches!(decode_path("/bad%4"), Err(Error::Decode(_))));
        assert!(matches!(decode_path("/bad%zz"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        assert!(matches!(decode_path("/%E0%A4%A"), Err(Error::Decode(_))));
        assert!(matches!(decode_path("/%FF"), Err(Error::Decode(_))));
    }
}
