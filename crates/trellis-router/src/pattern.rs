//! Route pattern compilation.
//!
//! A pattern is literal text interspersed with regular-expression capture
//! groups, e.g. `/@/chat/messages/(\d+)`. Compilation anchors the whole
//! pattern so a route never matches a mere prefix of the path.

use regex::Regex;

use trellis_core::{AppError, AppResult};

/// A compiled, anchored route pattern.
#[derive(Debug, Clone)]
pub struct Matcher {
    /// Pattern as registered.
    source: String,
    /// Anchored regex.
    regex: Regex,
}

impl Matcher {
    /// Compiles `pattern` into an anchored matcher.
    pub fn compile(pattern: &str) -> AppResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| AppError::invalid_pattern(pattern, e))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Matches `path`, returning captures in textual group order.
    ///
    /// A group that did not participate (an optional segment) yields an
    /// empty string so positions stay stable.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }

    /// Whether `path` matches, without extracting captures.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Number of capture groups in the pattern.
    pub fn capture_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// The pattern as registered.
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::ErrorKind;

    #[test]
    fn test_literal_pattern() {
        let m = Matcher::compile("/health").unwrap();
        assert_eq!(m.captures("/health"), Some(vec![]));
        assert!(m.captures("/health/").is_none());
        assert!(m.captures("/healthz").is_none());
    }

    #[test]
    fn test_captures_in_order() {
        let m = Matcher::compile(r"/@/chat/rooms/(\w+)/messages/(\d+)").unwrap();
        assert_eq!(m.capture_count(), 2);
        assert_eq!(
            m.captures("/@/chat/rooms/general/messages/42"),
            Some(vec!["general".to_string(), "42".to_string()])
        );
    }

    #[test]
    fn test_anchored_both_ends() {
        let m = Matcher::compile(r"/posts/(\d+)").unwrap();
        assert!(!m.is_match("/posts/12/comments"));
        assert!(!m.is_match("/api/posts/12"));
        assert!(m.is_match("/posts/12"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let m = Matcher::compile("/a|/b").unwrap();
        assert!(m.is_match("/a"));
        assert!(m.is_match("/b"));
        assert!(!m.is_match("/a/x"));
        assert!(!m.is_match("/x/b"));
    }

    #[test]
    fn test_explicit_anchors_tolerated() {
        let m = Matcher::compile(r"^/users/(\d+)$").unwrap();
        assert_eq!(m.captures("/users/5"), Some(vec!["5".to_string()]));
    }

    #[test]
    fn test_optional_trailing_slash_only_when_pattern_says_so() {
        let strict = Matcher::compile("/blog").unwrap();
        assert!(!strict.is_match("/blog/"));

        let optional = Matcher::compile("/blog/?").unwrap();
        assert!(optional.is_match("/blog"));
        assert!(optional.is_match("/blog/"));
    }

    #[test]
    fn test_non_participating_group_keeps_position() {
        let m = Matcher::compile(r"/items(?:/(\d+))?/(\w+)").unwrap();
        assert_eq!(
            m.captures("/items/edit"),
            Some(vec![String::new(), "edit".to_string()])
        );
    }

    #[test]
    fn test_unbalanced_group_is_rejected() {
        let err = Matcher::compile(r"/broken/(\d+").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPattern);
        assert!(err.message.contains(r"/broken/(\d+"));

        assert!(Matcher::compile(r"/broken/\d+)").is_err());
    }
}
