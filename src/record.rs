//! Normalized records handed to the log store.

use serde::{Deserialize, Serialize};

/// Severity assigned to a captured log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Warn,
    Error,
    Fatal,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Location of one interpolated value inside [`Message::content`], in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub offset: usize,
    pub length: usize,
}

/// The rendered text of a log plus where its substitutions landed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

impl Message {
    /// A message with no substitutions.
    pub fn new(content: impl Into<String>) -> Message {
        Message {
            content: content.into(),
            substitutions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub row: u32,
    pub column: Option<u32>,
}

/// One frame of a component stack, e.g. `in Button (at Button.js:12)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFrame {
    pub content: String,
    pub file_name: Option<String>,
    pub location: Option<Location>,
}

/// Structured trace of the component hierarchy a diagnostic came from. Empty when absent.
pub type ComponentStack = Vec<CodeFrame>;

/// A classified, sanitized log.
///
/// Created by the classifier or by manual injection and moved into the store.
///
/// # Examples
///
/// ```
/// use console_sieve::{LogLevel, LogRecord, Message};
///
/// let record = LogRecord::new(LogLevel::Warn, "c", Message::new("m"));
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["level"], "warn");
/// assert_eq!(json["message"]["content"], "m");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub category: String,
    pub message: Message,
    #[serde(default)]
    pub component_stack: ComponentStack,
}

impl LogRecord {
    pub fn new(level: LogLevel, category: impl Into<String>, message: Message) -> LogRecord {
        LogRecord {
            level,
            category: category.into(),
            message,
            component_stack: Vec::new(),
        }
    }

    pub fn with_component_stack(mut self, component_stack: ComponentStack) -> LogRecord {
        self.component_stack = component_stack;
        self
    }
}

/// An exception injected by the host, or raised by the sieve about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    pub message: String,
    pub original_message: Option<String>,
    pub name: Option<String>,
    pub is_fatal: bool,
    #[serde(default)]
    pub component_stack: ComponentStack,
    #[serde(default)]
    pub stack: Vec<String>,
    pub id: u64,
}

impl ExceptionRecord {
    pub fn new(id: u64, message: impl Into<String>, is_fatal: bool) -> ExceptionRecord {
        ExceptionRecord {
            message: message.into(),
            original_message: None,
            name: None,
            is_fatal,
            component_stack: Vec::new(),
            stack: Vec::new(),
            id,
        }
    }
}

/// Outcome of looking a warning format up in the known-warnings table.
///
/// `final_format` is the text the warning should be displayed with; the flags
/// steer suppression and severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    pub suppress_completely: bool,
    pub suppress_dialog_legacy: bool,
    pub force_dialog_immediately: bool,
    pub final_format: String,
}

impl FilterResult {
    /// The result for a format no rule knows about: shown unchanged, no flags set.
    pub fn passthrough(format: &str) -> FilterResult {
        FilterResult {
            suppress_completely: false,
            suppress_dialog_legacy: false,
            force_dialog_immediately: false,
            final_format: format.to_string(),
        }
    }

    /// Severity implied by the flags. `force_dialog_immediately` wins over the legacy downgrade.
    pub fn level(&self) -> LogLevel {
        if self.force_dialog_immediately {
            LogLevel::Fatal
        } else if self.suppress_dialog_legacy {
            LogLevel::Warn
        } else {
            LogLevel::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_levels() {
        let mut r = FilterResult::passthrough("x");
        assert_eq!(r.level(), LogLevel::Error);
        r.suppress_dialog_legacy = true;
        assert_eq!(r.level(), LogLevel::Warn);
        r.force_dialog_immediately = true;
        assert_eq!(r.level(), LogLevel::Fatal);
    }

    #[test]
    fn record_deserializes_without_stack() {
        let record: LogRecord = serde_json::from_str(
            r#"{"level":"error","category":"c","message":{"content":"m"}}"#,
        )
        .unwrap();
        assert_eq!(record, LogRecord::new(LogLevel::Error, "c", Message::new("m")));
    }
}
