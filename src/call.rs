//! Raw diagnostic calls and their routing classification.
//!
//! A [`DiagnosticCall`] is the untyped argument list handed to a console
//! channel, exactly as the caller passed it. Routing decisions depend only on
//! the first argument, so they are made once, up front, by [`CallKind::of`].

use serde_json::Value;

use crate::store::LogStore;

/// Prefix carried by native-originated hints that are not meant for structured display.
pub const ADVICE_PREFIX: &str = "(ADVICE)";

/// Prefix carried by framework warnings that were reported on the error channel.
pub const WARNING_PREFIX: &str = "Warning: ";

/// The arguments of a single `warn`/`error` invocation.
///
/// # Examples
///
/// ```
/// use console_sieve::DiagnosticCall;
/// use serde_json::json;
///
/// let call = DiagnosticCall::new(vec![json!("Loaded %s items"), json!(3)]);
/// assert_eq!(call.first_text(), Some("Loaded %s items"));
/// assert_eq!(call.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiagnosticCall {
    args: Vec<Value>,
}

impl DiagnosticCall {
    pub fn new(args: Vec<Value>) -> DiagnosticCall {
        DiagnosticCall { args }
    }

    /// Builds a call with a single text argument.
    pub fn text(message: impl Into<String>) -> DiagnosticCall {
        DiagnosticCall {
            args: vec![Value::String(message.into())],
        }
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The first argument, if it is a string.
    pub fn first_text(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }

    /// The first argument rendered as text, whatever its type.
    ///
    /// Used for marker checks that must not care whether the caller passed a string.
    pub fn first_as_string(&self) -> String {
        match self.args.first() {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Returns a copy of this call with the first argument replaced by `first`.
    pub fn with_first(&self, first: String) -> DiagnosticCall {
        let mut args = self.args.clone();
        match args.first_mut() {
            Some(slot) => *slot = Value::String(first),
            None => args.push(Value::String(first)),
        }
        DiagnosticCall { args }
    }
}

impl From<Vec<Value>> for DiagnosticCall {
    fn from(args: Vec<Value>) -> Self {
        DiagnosticCall::new(args)
    }
}

impl From<&str> for DiagnosticCall {
    fn from(message: &str) -> Self {
        DiagnosticCall::text(message)
    }
}

/// How a call must be routed, decided once from its first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Produced by the sieve's own error reporting; never classified.
    SelfReport,
    /// Starts with [`ADVICE_PREFIX`].
    Advisory,
    /// Starts with [`WARNING_PREFIX`].
    WrappedWarning,
    Plain,
}

impl CallKind {
    /// Classifies `call` against the routing markers.
    ///
    /// The self-report check comes first and consults the store, which owns the marker text.
    pub fn of(call: &DiagnosticCall, store: &dyn LogStore) -> CallKind {
        if store.is_log_box_error_message(&call.first_as_string()) {
            return CallKind::SelfReport;
        }
        match call.first_text() {
            Some(text) if text.starts_with(ADVICE_PREFIX) => CallKind::Advisory,
            Some(text) if text.starts_with(WARNING_PREFIX) => CallKind::WrappedWarning,
            _ => CallKind::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SELF_REPORT_MARKER};
    use serde_json::json;

    #[test]
    fn kinds_follow_first_argument() {
        let store = MemoryStore::new();
        let kind = |args: Vec<Value>| CallKind::of(&DiagnosticCall::new(args), &store);

        assert_eq!(kind(vec![json!("(ADVICE) use a key")]), CallKind::Advisory);
        assert_eq!(kind(vec![json!("Warning: %s"), json!("x")]), CallKind::WrappedWarning);
        assert_eq!(kind(vec![json!("plain")]), CallKind::Plain);
        assert_eq!(kind(vec![json!(42)]), CallKind::Plain);
        assert_eq!(kind(vec![]), CallKind::Plain);
        assert_eq!(
            kind(vec![json!(format!("{SELF_REPORT_MARKER}\n\nboom"))]),
            CallKind::SelfReport
        );
    }

    #[test]
    fn marker_must_be_a_prefix() {
        let store = MemoryStore::new();
        let call = DiagnosticCall::text("Something. Warning: later");
        assert_eq!(CallKind::of(&call, &store), CallKind::Plain);
    }

    #[test]
    fn with_first_replaces_or_inserts() {
        let call = DiagnosticCall::new(vec![json!("a"), json!(1)]);
        assert_eq!(call.with_first("b".into()).args(), &[json!("b"), json!(1)]);
        assert_eq!(DiagnosticCall::default().with_first("c".into()).args(), &[json!("c")]);
    }
}
