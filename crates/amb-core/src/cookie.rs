//! Cookie header parsing
//!
//! Turns `a=1; b=hello%20world` into a map. Keys and values are
//! percent-decoded; `+` is kept as-is.

use std::collections::HashMap;

use tracing::trace;

/// Parse a `Cookie` header (or `document.cookie`-style string)
///
/// Pairs without `=` map to an empty value. Later duplicates win.
pub fn parse_cookie(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    if header.trim().is_empty() {
        return cookies;
    }

    for pair in header.split(';') {
        if pair.trim().is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        cookies.insert(decode(key.trim()), decode(value.trim()));
    }

    cookies
}

fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            trace!("Keeping undecodable cookie part '{}': {}", raw, e);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_header() {
        assert!(parse_cookie("").is_empty());
        assert!(parse_cookie("   ").is_empty());
    }

    #[test]
    fn test_pairs_are_trimmed_and_decoded() {
        let cookies = parse_cookie("session=abc123; user=Jane%20Doe;theme = dark+blue");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["session"], "abc123");
        assert_eq!(cookies["user"], "Jane Doe");
        assert_eq!(cookies["theme"], "dark+blue");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let cookies = parse_cookie("token=a=b=c");
        assert_eq!(cookies["token"], "a=b=c");
    }

    #[test]
    fn test_pair_without_value() {
        let cookies = parse_cookie("flag; x=1;");
        assert_eq!(cookies["flag"], "");
        assert_eq!(cookies["x"], "1");
    }

    #[test]
    fn test_later_duplicate_wins() {
        let cookies = parse_cookie("a=1; a=2");
        assert_eq!(cookies["a"], "2");
    }
}
