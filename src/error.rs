//! Error types for the console sieve.
//!
//! Two layers of errors exist. [`ParseError`] describes a diagnostic call that
//! could not be turned into a structured log; it is caught inside the sieve and
//! reported to the store, never surfaced to whoever called `warn`/`error`.
//! [`Error`] is the crate-level error returned from the few fallible public
//! constructors (for example compiling an ignore pattern).

/// A diagnostic call could not be parsed into a structured log.
///
/// # Examples
///
/// ```
/// use console_sieve::ParseError;
///
/// let e = ParseError::EmptyCall;
/// assert_eq!(e.to_string(), "diagnostic call has no arguments");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The call carried no arguments at all.
    #[error("diagnostic call has no arguments")]
    EmptyCall,
    /// A trailing argument looked like a component stack but a frame could not be read.
    #[error("malformed component stack frame: {line:?}")]
    MalformedComponentStack {
        /// The offending stack line, trimmed.
        line: String,
    },
}

/// Errors returned by the public API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parsing a diagnostic call failed.
    #[error("Failed to parse diagnostic call: {0}")]
    Parse(#[from] ParseError),
    /// An ignore pattern was not a valid regular expression.
    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
