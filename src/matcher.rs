//! Ignore rules for captured messages.
//!
//! An [`IgnorePattern`] is either a literal string or a regular expression. The
//! registry keeps patterns in the order they were first added and silently
//! collapses duplicates, so adding the same set twice changes nothing.

use regex::Regex;

use crate::error::Error;

/// A rule suppressing matching messages from ever reaching the log store.
///
/// # Examples
///
/// ```
/// use console_sieve::IgnorePattern;
///
/// let exact = IgnorePattern::from("Require cycle:");
/// assert!(exact.matches("Require cycle: a.js -> b.js"));
///
/// let pattern = IgnorePattern::regex(r"^Module \w+ not found$").unwrap();
/// assert!(pattern.matches("Module Foo not found"));
/// assert!(IgnorePattern::regex("(").is_err());
/// ```
#[derive(Debug, Clone)]
pub enum IgnorePattern {
    /// Matches when the message contains the text verbatim.
    Exact(String),
    Pattern(Regex),
}

impl IgnorePattern {
    /// Compiles `source` as a regular expression rule.
    pub fn regex(source: &str) -> Result<IgnorePattern, Error> {
        Ok(IgnorePattern::Pattern(Regex::new(source)?))
    }

    pub fn matches(&self, content: &str) -> bool {
        match self {
            IgnorePattern::Exact(text) => content.contains(text.as_str()),
            IgnorePattern::Pattern(regex) => regex.is_match(content),
        }
    }
}

impl PartialEq for IgnorePattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IgnorePattern::Exact(a), IgnorePattern::Exact(b)) => a == b,
            (IgnorePattern::Pattern(a), IgnorePattern::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for IgnorePattern {}

impl From<&str> for IgnorePattern {
    fn from(text: &str) -> Self {
        IgnorePattern::Exact(text.to_string())
    }
}

impl From<String> for IgnorePattern {
    fn from(text: String) -> Self {
        IgnorePattern::Exact(text)
    }
}

impl From<Regex> for IgnorePattern {
    fn from(regex: Regex) -> Self {
        IgnorePattern::Pattern(regex)
    }
}

/// Insertion-ordered set of ignore rules.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<IgnorePattern>,
}

impl IgnorePatterns {
    pub fn new() -> IgnorePatterns {
        IgnorePatterns::default()
    }

    /// Adds every pattern not already present.
    pub fn add<I>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = IgnorePattern>,
    {
        for pattern in patterns {
            if !self.patterns.contains(&pattern) {
                self.patterns.push(pattern);
            }
        }
    }

    /// True if any registered rule matches `content`.
    pub fn is_message_ignored(&self, content: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(content))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IgnorePattern> {
        self.patterns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let mut set = IgnorePatterns::new();
        set.add(["a".into(), "b".into(), IgnorePattern::regex("a").unwrap()]);
        set.add(["a".into(), IgnorePattern::regex("a").unwrap()]);
        assert_eq!(set.len(), 3);
        let order: Vec<_> = set
            .iter()
            .map(|p| match p {
                IgnorePattern::Exact(s) => format!("exact:{s}"),
                IgnorePattern::Pattern(r) => format!("re:{}", r.as_str()),
            })
            .collect();
        assert_eq!(order, ["exact:a", "exact:b", "re:a"]);
    }

    #[test]
    fn exact_text_is_not_a_regex() {
        let mut set = IgnorePatterns::new();
        set.add(["a.c".into()]);
        assert!(set.is_message_ignored("a.c"));
        assert!(!set.is_message_ignored("abc"));
    }

    #[test]
    fn any_rule_suffices() {
        let mut set = IgnorePatterns::new();
        assert!(!set.is_message_ignored("anything"));
        set.add(["nope".into(), IgnorePattern::regex(r"\d{3}").unwrap()]);
        assert!(set.is_message_ignored("code 404"));
        assert!(!set.is_message_ignored("code 4"));
        // still ignored after re-adding
        set.add([IgnorePattern::regex(r"\d{3}").unwrap()]);
        assert!(set.is_message_ignored("code 404"));
    }
}
