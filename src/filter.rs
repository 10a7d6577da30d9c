//! Known-warnings table consulted for framework warnings routed through the error channel.

use std::collections::HashMap;

use crate::record::FilterResult;

/// Decides how a warning format string is treated.
///
/// Implementations must be cheap; the filter runs once per wrapped warning.
pub trait WarningFilter: Send + Sync {
    fn check(&self, format: &str) -> FilterResult;
}

impl<F> WarningFilter for F
where
    F: Fn(&str) -> FilterResult + Send + Sync,
{
    fn check(&self, format: &str) -> FilterResult {
        self(format)
    }
}

/// Treatment of one known warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningRule {
    pub suppress_completely: bool,
    pub suppress_dialog_legacy: bool,
    pub force_dialog_immediately: bool,
    /// Replacement text; `None` keeps the original format.
    pub rewrite: Option<String>,
}

/// A table of rules keyed by exact format string.
///
/// Formats with no entry pass through untouched.
///
/// # Examples
///
/// ```
/// use console_sieve::{KnownWarnings, LogLevel, WarningFilter, WarningRule};
///
/// let mut table = KnownWarnings::new();
/// table.insert(
///     "X overflow",
///     WarningRule {
///         suppress_dialog_legacy: true,
///         ..Default::default()
///     },
/// );
///
/// assert_eq!(table.check("X overflow").level(), LogLevel::Warn);
/// assert_eq!(table.check("unknown %s").final_format, "unknown %s");
/// assert_eq!(table.check("unknown %s").level(), LogLevel::Error);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KnownWarnings {
    rules: HashMap<String, WarningRule>,
}

impl KnownWarnings {
    pub fn new() -> KnownWarnings {
        KnownWarnings::default()
    }

    pub fn insert(&mut self, format: impl Into<String>, rule: WarningRule) -> &mut Self {
        self.rules.insert(format.into(), rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl WarningFilter for KnownWarnings {
    fn check(&self, format: &str) -> FilterResult {
        match self.rules.get(format) {
            None => FilterResult::passthrough(format),
            Some(rule) => FilterResult {
                suppress_completely: rule.suppress_completely,
                suppress_dialog_legacy: rule.suppress_dialog_legacy,
                force_dialog_immediately: rule.force_dialog_immediately,
                final_format: rule.rewrite.clone().unwrap_or_else(|| format.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogLevel;

    #[test]
    fn rewrite_and_flags() {
        let mut table = KnownWarnings::new();
        table
            .insert(
                "old %s",
                WarningRule {
                    rewrite: Some("new %s".into()),
                    ..Default::default()
                },
            )
            .insert(
                "both",
                WarningRule {
                    suppress_dialog_legacy: true,
                    force_dialog_immediately: true,
                    ..Default::default()
                },
            );
        assert_eq!(table.check("old %s").final_format, "new %s");
        assert_eq!(table.check("both").level(), LogLevel::Fatal);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn closures_are_filters() {
        let filter = |format: &str| FilterResult {
            suppress_completely: format.contains("noise"),
            ..FilterResult::passthrough(format)
        };
        assert!(filter.check("noise here").suppress_completely);
        assert!(!filter.check("signal").suppress_completely);
    }
}
