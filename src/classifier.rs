//! Deciding what happens to a single diagnostic call.
//!
//! Classification is pure: it reads the store's ignore and filter state but
//! performs no side effects. The caller (the sieve layer) applies the returned
//! [`Disposition`], forwarding to the original channel and recording as told.
//!
//! Warning channel:
//! 1. self-reports and `(ADVICE)` hints pass through untouched;
//! 2. everything else is parsed; ignored content is dropped entirely;
//! 3. otherwise the call passes through *and* a `warn` record is produced.
//!
//! Error channel:
//! 1. self-reports pass through;
//! 2. anything that is not a `"Warning: "` wrapped warning is a genuine error
//!    and passes through without a record;
//! 3. wrapped warnings are looked up in the known-warnings table, which may
//!    suppress them, rewrite their format, or change their severity. Surviving
//!    warnings are printed as interpolated plain text and recorded.

use crate::call::{CallKind, DiagnosticCall, WARNING_PREFIX};
use crate::error::ParseError;
use crate::parser::DiagnosticParser;
use crate::record::{LogLevel, LogRecord};
use crate::store::LogStore;

/// What to do with a classified call.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Forward the call unchanged to the original channel; record nothing.
    PassThrough,
    /// Neither forward nor record.
    Drop,
    /// Forward `console` to the original channel and hand `record` to the store.
    Record {
        console: DiagnosticCall,
        record: LogRecord,
    },
}

impl Disposition {
    /// The record this disposition produces, if any.
    pub fn record(&self) -> Option<&LogRecord> {
        match self {
            Disposition::Record { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Classifies a call made on the warning channel.
pub fn classify_warning(
    call: &DiagnosticCall,
    store: &dyn LogStore,
    parser: &dyn DiagnosticParser,
) -> Result<Disposition, ParseError> {
    match CallKind::of(call, store) {
        CallKind::SelfReport | CallKind::Advisory => return Ok(Disposition::PassThrough),
        CallKind::WrappedWarning | CallKind::Plain => {}
    }
    let parsed = parser.parse(call)?;
    if store.is_message_ignored(&parsed.message.content) {
        return Ok(Disposition::Drop);
    }
    Ok(Disposition::Record {
        console: call.clone(),
        record: LogRecord {
            level: LogLevel::Warn,
            category: parsed.category,
            message: parsed.message,
            component_stack: parsed.component_stack,
        },
    })
}

/// Classifies a call made on the error channel.
///
/// # Examples
///
/// ```
/// use console_sieve::{classify_error, DefaultParser, DiagnosticCall, Disposition, LogLevel, MemoryStore};
///
/// let store = MemoryStore::new();
/// let genuine = DiagnosticCall::text("TypeError: x is undefined");
/// assert_eq!(classify_error(&genuine, &store, &DefaultParser).unwrap(), Disposition::PassThrough);
///
/// let wrapped = DiagnosticCall::text("Warning: componentWillMount is deprecated");
/// let disposition = classify_error(&wrapped, &store, &DefaultParser).unwrap();
/// assert_eq!(disposition.record().unwrap().level, LogLevel::Error);
/// ```
pub fn classify_error(
    call: &DiagnosticCall,
    store: &dyn LogStore,
    parser: &dyn DiagnosticParser,
) -> Result<Disposition, ParseError> {
    match CallKind::of(call, store) {
        CallKind::WrappedWarning => {}
        CallKind::SelfReport | CallKind::Advisory | CallKind::Plain => {
            return Ok(Disposition::PassThrough);
        }
    }
    let Some(format) = call.first_text().and_then(|t| t.strip_prefix(WARNING_PREFIX)) else {
        return Ok(Disposition::PassThrough);
    };

    let filter = store.check_warning_filter(format);
    if filter.suppress_completely {
        return Ok(Disposition::Drop);
    }
    let level = filter.level();

    let rewritten = call.with_first(format!("{WARNING_PREFIX}{}", filter.final_format));
    let parsed = parser.parse(&rewritten)?;
    if store.is_message_ignored(&parsed.message.content) {
        return Ok(Disposition::Drop);
    }
    // plain text for terminals, component stack included
    let interpolated = parser.parse_with_interpolation(&rewritten)?;

    Ok(Disposition::Record {
        console: DiagnosticCall::text(interpolated.content),
        record: LogRecord {
            level,
            category: parsed.category,
            message: parsed.message,
            component_stack: parsed.component_stack,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{KnownWarnings, WarningRule};
    use crate::parser::DefaultParser;
    use crate::store::{MemoryStore, SELF_REPORT_MARKER};
    use serde_json::json;

    fn store_with(format: &str, rule: WarningRule) -> MemoryStore {
        let mut table = KnownWarnings::new();
        table.insert(format, rule);
        MemoryStore::with_warning_filter(Box::new(table))
    }

    fn warn(call: &DiagnosticCall, store: &MemoryStore) -> Disposition {
        classify_warning(call, store, &DefaultParser).unwrap()
    }

    fn error(call: &DiagnosticCall, store: &MemoryStore) -> Disposition {
        classify_error(call, store, &DefaultParser).unwrap()
    }

    #[test]
    fn advice_passes_through() {
        let store = MemoryStore::new();
        let call = DiagnosticCall::new(vec![json!("(ADVICE) prefer keys"), json!(1)]);
        assert_eq!(warn(&call, &store), Disposition::PassThrough);
    }

    #[test]
    fn self_reports_pass_through_on_both_channels() {
        let store = MemoryStore::new();
        let call = DiagnosticCall::text(format!("{SELF_REPORT_MARKER}\n\nWarning: x"));
        assert_eq!(warn(&call, &store), Disposition::PassThrough);
        assert_eq!(error(&call, &store), Disposition::PassThrough);
    }

    #[test]
    fn plain_warning_is_recorded_and_forwarded() {
        let store = MemoryStore::new();
        let call = DiagnosticCall::new(vec![json!("Slow %s"), json!("render")]);
        match warn(&call, &store) {
            Disposition::Record { console, record } => {
                assert_eq!(console, call);
                assert_eq!(record.level, LogLevel::Warn);
                assert_eq!(record.message.content, "Slow render");
                assert_eq!(record.category, "Slow \u{feff}%s");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ignored_warning_is_dropped() {
        let store = MemoryStore::new();
        store.add_ignore_patterns(vec!["Slow render".into()]);
        let call = DiagnosticCall::new(vec![json!("Slow %s"), json!("render")]);
        assert_eq!(warn(&call, &store), Disposition::Drop);
    }

    #[test]
    fn genuine_errors_pass_through() {
        let store = MemoryStore::new();
        for call in [
            DiagnosticCall::text("boom"),
            DiagnosticCall::text("(ADVICE) x"),
            DiagnosticCall::new(vec![json!({"Warning: ": 1})]),
            DiagnosticCall::text("warning: lowercase"),
        ] {
            assert_eq!(error(&call, &store), Disposition::PassThrough);
        }
    }

    #[test]
    fn legacy_suppression_downgrades_to_warn() {
        let store = store_with(
            "X overflow",
            WarningRule {
                suppress_dialog_legacy: true,
                ..Default::default()
            },
        );
        let call = DiagnosticCall::new(vec![json!("Warning: X overflow"), json!("stack")]);
        assert_eq!(error(&call, &store).record().unwrap().level, LogLevel::Warn);
    }

    #[test]
    fn fatal_wins_over_legacy_suppression() {
        let store = store_with(
            "X overflow",
            WarningRule {
                suppress_dialog_legacy: true,
                force_dialog_immediately: true,
                ..Default::default()
            },
        );
        let call = DiagnosticCall::text("Warning: X overflow");
        assert_eq!(error(&call, &store).record().unwrap().level, LogLevel::Fatal);
    }

    #[test]
    fn unknown_wrapped_warning_defaults_to_error() {
        let store = MemoryStore::new();
        let call = DiagnosticCall::text("Warning: componentWillMount is deprecated");
        match error(&call, &store) {
            Disposition::Record { console, record } => {
                assert_eq!(record.level, LogLevel::Error);
                assert_eq!(record.message.content, "Warning: componentWillMount is deprecated");
                assert_eq!(console.first_text(), Some("Warning: componentWillMount is deprecated"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn suppressed_completely_is_dropped() {
        let store = store_with(
            "noisy %s",
            WarningRule {
                suppress_completely: true,
                ..Default::default()
            },
        );
        let call = DiagnosticCall::new(vec![json!("Warning: noisy %s"), json!("thing")]);
        assert_eq!(error(&call, &store), Disposition::Drop);
    }

    #[test]
    fn rewritten_format_is_used_and_stack_printed() {
        let store = store_with(
            "old name %s",
            WarningRule {
                rewrite: Some("new name%s".into()),
                ..Default::default()
            },
        );
        let call = DiagnosticCall::new(vec![
            json!("Warning: old name %s"),
            json!("\n    in Panel (at Panel.js:3)"),
        ]);
        match error(&call, &store) {
            Disposition::Record { console, record } => {
                assert_eq!(record.message.content, "Warning: new name");
                assert_eq!(record.component_stack.len(), 1);
                assert_eq!(
                    console.first_text(),
                    Some("Warning: new name\n    in Panel (at Panel.js:3)")
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ignored_wrapped_warning_is_dropped() {
        let store = MemoryStore::new();
        store.add_ignore_patterns(vec![crate::IgnorePattern::regex("deprecated$").unwrap()]);
        let call = DiagnosticCall::text("Warning: componentWillMount is deprecated");
        assert_eq!(error(&call, &store), Disposition::Drop);
    }

    #[test]
    fn parse_failures_are_returned() {
        let store = MemoryStore::new();
        let empty = DiagnosticCall::default();
        assert_eq!(classify_warning(&empty, &store, &DefaultParser), Err(ParseError::EmptyCall));
        // an empty error call is plain, so it never reaches the parser
        assert_eq!(error(&empty, &store), Disposition::PassThrough);
    }
}
