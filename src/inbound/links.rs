//! URL detection in message bodies

use std::sync::LazyLock;

use regex::Regex;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>\[\](){}]+").expect("valid regex")
});

/// Detect all URLs in a message body, in order of appearance
#[must_use]
pub fn detect_links(text: &str) -> Vec<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_end_matches(|c| matches!(c, '.' | ',' | '!' | '?' | ')' | ']' | '}' | '*' | '_' | '~'))
                .to_string()
        })
        .filter(|url| !url.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_simple_url() {
        assert_eq!(
            detect_links("Check this: https://example.com for more"),
            vec!["https://example.com"]
        );
    }

    #[test]
    fn detects_multiple_in_order() {
        assert_eq!(
            detect_links("See https://foo.com and http://bar.com/x?y=1"),
            vec!["https://foo.com", "http://bar.com/x?y=1"]
        );
    }

    #[test]
    fn strips_trailing_punctuation_and_markup() {
        assert_eq!(detect_links("Go to https://example.com."), vec!["https://example.com"]);
        assert_eq!(detect_links("*https://example.com*"), vec!["https://example.com"]);
    }

    #[test]
    fn detects_bare_www() {
        assert_eq!(detect_links("visit www.example.org today"), vec!["www.example.org"]);
    }

    #[test]
    fn no_links() {
        assert!(detect_links("Hello! How are you?").is_empty());
    }
}
