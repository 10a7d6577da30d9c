//! The downstream log store.
//!
//! The sieve never keeps logs itself. Every normalized record, every injected
//! exception and all suppression state live behind the [`LogStore`] trait, which
//! the host may implement on top of whatever log viewer it renders.
//!
//! [`MemoryStore`] is the in-process implementation shipped with the crate. It
//! keeps records in a `Vec`, rolls consecutive logs of the same category into a
//! single entry with a count, and can export its contents as JSON.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use wasm_safe_mutex::Mutex;

use crate::error::Error;
use crate::filter::{KnownWarnings, WarningFilter};
use crate::matcher::{IgnorePattern, IgnorePatterns};
use crate::record::{ExceptionRecord, FilterResult, LogRecord};

/// Text carried by every diagnostic the sieve raises about its own failures.
///
/// Calls containing it are passed through untouched so that reporting a
/// failure can never loop back into classification.
pub const SELF_REPORT_MARKER: &str =
    "An error was thrown while attempting to capture console logs.";

/// Where normalized records go, and where suppression state lives.
pub trait LogStore: Send + Sync {
    fn add_log(&self, record: LogRecord);
    fn add_exception(&self, record: ExceptionRecord);
    fn set_disabled(&self, disabled: bool);
    fn is_disabled(&self) -> bool;
    /// Drops all captured logs and exceptions. Ignore rules are kept.
    fn clear(&self);
    fn add_ignore_patterns(&self, patterns: Vec<IgnorePattern>);
    fn is_message_ignored(&self, content: &str) -> bool;
    /// True for diagnostics produced by the sieve's own error reporting.
    fn is_log_box_error_message(&self, message: &str) -> bool;
    fn check_warning_filter(&self, format: &str) -> FilterResult;
    /// Records a failure of the capture pipeline itself.
    fn report_log_box_error(&self, error: &Error);
}

/// A captured log and how many consecutive times it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredLog {
    pub record: LogRecord,
    pub count: u32,
}

#[derive(Debug, Default)]
struct StoreState {
    logs: Vec<StoredLog>,
    exceptions: Vec<ExceptionRecord>,
    ignore: IgnorePatterns,
    disabled: bool,
}

#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    logs: &'a [StoredLog],
    exceptions: &'a [ExceptionRecord],
    disabled: bool,
}

/// In-memory [`LogStore`].
///
/// # Examples
///
/// ```
/// use console_sieve::{LogLevel, LogRecord, LogStore, MemoryStore, Message};
///
/// let store = MemoryStore::new();
/// store.add_log(LogRecord::new(LogLevel::Warn, "slow", Message::new("slow render")));
/// store.add_log(LogRecord::new(LogLevel::Warn, "slow", Message::new("slow render")));
///
/// let logs = store.logs();
/// assert_eq!(logs.len(), 1);
/// assert_eq!(logs[0].count, 2);
/// ```
pub struct MemoryStore {
    state: Mutex<StoreState>,
    filter: Box<dyn WarningFilter>,
    next_error_id: AtomicU64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    /// A store with an empty known-warnings table.
    pub fn new() -> MemoryStore {
        MemoryStore::with_warning_filter(Box::new(KnownWarnings::new()))
    }

    pub fn with_warning_filter(filter: Box<dyn WarningFilter>) -> MemoryStore {
        MemoryStore {
            state: Mutex::new(StoreState::default()),
            filter,
            next_error_id: AtomicU64::new(0),
        }
    }

    pub fn logs(&self) -> Vec<StoredLog> {
        self.state.with_sync(|s| s.logs.clone())
    }

    pub fn exceptions(&self) -> Vec<ExceptionRecord> {
        self.state.with_sync(|s| s.exceptions.clone())
    }

    /// Number of ignore rules currently registered.
    pub fn ignore_pattern_count(&self) -> usize {
        self.state.with_sync(|s| s.ignore.len())
    }

    /// Serializes the captured logs and exceptions.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.state.with_sync(|s| {
            serde_json::to_string(&Snapshot {
                logs: &s.logs,
                exceptions: &s.exceptions,
                disabled: s.disabled,
            })
        })
    }
}

impl LogStore for MemoryStore {
    fn add_log(&self, record: LogRecord) {
        self.state.with_mut_sync(|s| {
            if s.disabled {
                return;
            }
            if let Some(last) = s.logs.last_mut() {
                if last.record.category == record.category && last.record.level == record.level {
                    last.count += 1;
                    return;
                }
            }
            s.logs.push(StoredLog { record, count: 1 });
        });
    }

    fn add_exception(&self, record: ExceptionRecord) {
        self.state.with_mut_sync(|s| s.exceptions.push(record));
    }

    fn set_disabled(&self, disabled: bool) {
        self.state.with_mut_sync(|s| s.disabled = disabled);
    }

    fn is_disabled(&self) -> bool {
        self.state.with_sync(|s| s.disabled)
    }

    fn clear(&self) {
        self.state.with_mut_sync(|s| {
            s.logs.clear();
            s.exceptions.clear();
        });
    }

    fn add_ignore_patterns(&self, patterns: Vec<IgnorePattern>) {
        self.state.with_mut_sync(|s| s.ignore.add(patterns));
    }

    fn is_message_ignored(&self, content: &str) -> bool {
        self.state.with_sync(|s| s.ignore.is_message_ignored(content))
    }

    fn is_log_box_error_message(&self, message: &str) -> bool {
        message.contains(SELF_REPORT_MARKER)
    }

    fn check_warning_filter(&self, format: &str) -> FilterResult {
        self.filter.check(format)
    }

    fn report_log_box_error(&self, error: &Error) {
        let id = self.next_error_id.fetch_add(1, Ordering::Relaxed);
        let mut record =
            ExceptionRecord::new(id, format!("{SELF_REPORT_MARKER}\n\n{error}"), false);
        record.original_message = Some(error.to_string());
        record.name = Some("CaptureError".to_string());
        self.add_exception(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::filter::WarningRule;
    use crate::record::{LogLevel, Message};

    fn warn(category: &str) -> LogRecord {
        LogRecord::new(LogLevel::Warn, category, Message::new(category))
    }

    #[test]
    fn consecutive_categories_roll_up() {
        let store = MemoryStore::new();
        store.add_log(warn("a"));
        store.add_log(warn("a"));
        store.add_log(warn("b"));
        store.add_log(warn("a"));
        let counts: Vec<_> = store
            .logs()
            .iter()
            .map(|l| (l.record.category.clone(), l.count))
            .collect();
        assert_eq!(counts, [("a".to_string(), 2), ("b".to_string(), 1), ("a".to_string(), 1)]);
    }

    #[test]
    fn disabled_store_drops_logs() {
        let store = MemoryStore::new();
        store.set_disabled(true);
        store.add_log(warn("a"));
        assert!(store.logs().is_empty());
        store.set_disabled(false);
        store.add_log(warn("a"));
        assert_eq!(store.logs().len(), 1);
    }

    #[test]
    fn clear_keeps_ignore_rules() {
        let store = MemoryStore::new();
        store.add_ignore_patterns(vec!["noise".into()]);
        store.add_log(warn("a"));
        store.add_exception(ExceptionRecord::new(1, "boom", true));
        store.clear();
        assert!(store.logs().is_empty());
        assert!(store.exceptions().is_empty());
        assert!(store.is_message_ignored("some noise"));
    }

    #[test]
    fn self_reports_carry_the_marker() {
        let store = MemoryStore::new();
        store.report_log_box_error(&Error::Parse(ParseError::EmptyCall));
        let exceptions = store.exceptions();
        assert_eq!(exceptions.len(), 1);
        assert!(store.is_log_box_error_message(&exceptions[0].message));
        assert_eq!(
            exceptions[0].original_message.as_deref(),
            Some("Failed to parse diagnostic call: diagnostic call has no arguments")
        );
    }

    #[test]
    fn custom_filter_is_consulted() {
        let mut table = KnownWarnings::new();
        table.insert(
            "loud",
            WarningRule {
                suppress_completely: true,
                ..Default::default()
            },
        );
        let store = MemoryStore::with_warning_filter(Box::new(table));
        assert!(store.check_warning_filter("loud").suppress_completely);
        assert!(!store.check_warning_filter("quiet").suppress_completely);
    }

    #[test]
    fn json_export() {
        let store = MemoryStore::new();
        store.add_log(warn("a"));
        let json: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(json["logs"][0]["count"], 1);
        assert_eq!(json["logs"][0]["record"]["level"], "warn");
        assert_eq!(json["disabled"], false);
    }
}
