//! Turning raw diagnostic calls into structured logs.
//!
//! The [`DiagnosticParser`] trait is the boundary the classifier depends on. The
//! crate ships [`DefaultParser`], which understands the conventions used by
//! component frameworks that report through the console:
//!
//! - a leading format string whose `%s` placeholders consume the following
//!   arguments, and
//! - a trailing component stack made of `"\n    in Name (at File.js:12)"` lines.
//!
//! Categories are built from the format string with every substituted value
//! replaced by [`SUBSTITUTION_PLACEHOLDER`], so that repeated warnings that only
//! differ in their arguments share a category and can be rolled up by the store.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::call::DiagnosticCall;
use crate::error::ParseError;
use crate::record::{CodeFrame, ComponentStack, Location, Message, Substitution};

/// Marks a substituted value inside a category.
pub const SUBSTITUTION_PLACEHOLDER: &str = "\u{feff}%s";

static STACK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n {4}(in|at) ").expect("valid regex"));
static FRAME_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n {4}in ").expect("valid regex"));
static FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?) \(at (.+?):(\d+)(?::(\d+))?\)$").expect("valid regex")
});

/// Result of [`DiagnosticParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLog {
    pub category: String,
    pub message: Message,
    pub component_stack: ComponentStack,
}

/// Converts a diagnostic call into its structured parts.
pub trait DiagnosticParser: Send + Sync {
    /// Splits off the component stack and interpolates the remaining arguments.
    fn parse(&self, call: &DiagnosticCall) -> Result<ParsedLog, ParseError>;

    /// Interpolates every argument, component stack included, into plain text
    /// suitable for a non-interactive console.
    fn parse_with_interpolation(&self, call: &DiagnosticCall) -> Result<Message, ParseError>;
}

/// The built-in parser.
///
/// # Examples
///
/// ```
/// use console_sieve::{DefaultParser, DiagnosticCall, DiagnosticParser};
/// use serde_json::json;
///
/// let call = DiagnosticCall::new(vec![
///     json!("Each child needs a unique key.%s"),
///     json!("\n    in Row (at List.js:40)\n    in List (at App.js:7)"),
/// ]);
/// let parsed = DefaultParser.parse(&call).unwrap();
/// assert_eq!(parsed.message.content, "Each child needs a unique key.");
/// assert_eq!(parsed.component_stack.len(), 2);
/// assert_eq!(parsed.component_stack[0].content, "Row");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl DiagnosticParser for DefaultParser {
    fn parse(&self, call: &DiagnosticCall) -> Result<ParsedLog, ParseError> {
        if call.is_empty() {
            return Err(ParseError::EmptyCall);
        }
        let args = call.args();
        let mut remaining: Vec<Value> = Vec::with_capacity(args.len());
        let mut component_stack = Vec::new();

        // "Some warning%s" with the stack as the final substitution
        if let (Some(format), Some(Value::String(last))) = (call.first_text(), args.last()) {
            if args.len() > 1 && format.ends_with("%s") && is_component_stack(last) {
                component_stack = parse_component_stack(last)?;
                remaining.push(Value::String(format[..format.len() - 2].to_string()));
                remaining.extend(args[1..args.len() - 1].iter().cloned());
            }
        }

        if component_stack.is_empty() {
            remaining.clear();
            for arg in args {
                match arg {
                    Value::String(text) if is_component_stack(text) => {
                        let end = STACK_START
                            .find(text)
                            .map(|m| m.start())
                            .or_else(|| text.find('\n'))
                            .unwrap_or(0);
                        if end > 0 {
                            remaining.push(Value::String(text[..end].to_string()));
                        }
                        component_stack = parse_component_stack(text)?;
                    }
                    other => remaining.push(other.clone()),
                }
            }
        }

        let (category, message) = interpolate(&remaining);
        Ok(ParsedLog {
            category,
            message,
            component_stack,
        })
    }

    fn parse_with_interpolation(&self, call: &DiagnosticCall) -> Result<Message, ParseError> {
        if call.is_empty() {
            return Err(ParseError::EmptyCall);
        }
        Ok(interpolate(call.args()).1)
    }
}

/// True if `text` contains at least one `"\n    in "` frame.
pub fn is_component_stack(text: &str) -> bool {
    FRAME_SPLIT.is_match(text)
}

/// Reads the frames of a component stack string.
///
/// Text before the first frame is ignored. A frame without an `(at ...)` suffix
/// keeps its name and has no location.
pub fn parse_component_stack(text: &str) -> Result<ComponentStack, ParseError> {
    let mut frames = Vec::new();
    // the first chunk is whatever preceded the first frame
    for chunk in FRAME_SPLIT.split(text).skip(1) {
        let line = chunk.lines().next().unwrap_or("").trim_end();
        if line.is_empty() {
            continue;
        }
        match FRAME.captures(line) {
            Some(caps) => {
                let malformed = || ParseError::MalformedComponentStack {
                    line: line.trim().to_string(),
                };
                let row = caps[3].parse::<u32>().map_err(|_| malformed())?;
                let column = match caps.get(4) {
                    Some(c) => Some(c.as_str().parse::<u32>().map_err(|_| malformed())?),
                    None => None,
                };
                frames.push(CodeFrame {
                    content: caps[1].to_string(),
                    file_name: Some(caps[2].to_string()),
                    location: Some(Location { row, column }),
                });
            }
            None if line.contains(" (at ") => {
                return Err(ParseError::MalformedComponentStack {
                    line: line.trim().to_string(),
                });
            }
            None => frames.push(CodeFrame {
                content: line.trim().to_string(),
                file_name: None,
                location: None,
            }),
        }
    }
    Ok(frames)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Expands `%s` placeholders of a leading format string. Returns `(category, message)`.
fn interpolate(args: &[Value]) -> (String, Message) {
    let mut category_parts: Vec<String> = Vec::new();
    let mut content_parts: Vec<String> = Vec::new();
    let mut substitutions = Vec::new();
    let mut rest = args;

    if let Some(Value::String(format)) = args.first() {
        let pieces: Vec<&str> = format.split("%s").collect();
        let wanted = pieces.len() - 1;
        let available = (args.len() - 1).min(wanted);
        let values = &args[1..1 + available];
        rest = &args[1 + available..];

        let mut category = String::new();
        let mut content = String::new();
        for (index, piece) in pieces.iter().enumerate() {
            category.push_str(piece);
            content.push_str(piece);
            if index == wanted {
                break;
            }
            // the format is always the first part, so offsets hold for the joined content
            match values.get(index) {
                Some(value) => {
                    let text = stringify(value);
                    substitutions.push(Substitution {
                        offset: content.len(),
                        length: text.len(),
                    });
                    category.push_str(SUBSTITUTION_PLACEHOLDER);
                    content.push_str(&text);
                }
                None => {
                    substitutions.push(Substitution {
                        offset: content.len(),
                        length: 2,
                    });
                    category.push_str("%s");
                    content.push_str("%s");
                }
            }
        }
        category_parts.push(category);
        content_parts.push(content);
    }

    for arg in rest {
        let text = stringify(arg);
        category_parts.push(text.clone());
        content_parts.push(text);
    }

    (
        category_parts.join(" "),
        Message {
            content: content_parts.join(" "),
            substitutions,
        },
    )
}
