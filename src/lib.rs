/*!
Capture, classify and de-noise developer console diagnostics.

console_sieve sits in front of an application's `warn` and `error` console
channels and turns the raw calls made on them into normalized, severity-tagged
records for an in-app log viewer. It is the plumbing behind a "yellow box"
style developer overlay: it decides which diagnostics are noise, which are
warnings, which are errors, and which must be shown immediately.

# Overview

Data flows one way:

```text
Console::warn / Console::error
        │
        ▼
  interceptor chain ──> SieveLayer ──> classifier ──> LogStore
        │                    │
        ▼                    ▼
      Sink  <──── pass-through to the original channel
```

- [`Console`] is an explicit middleware chain in front of a [`Sink`] (stderr, or
  the browser console on wasm32). Interceptors wrap each other instead of
  patching a global function.
- [`LogSieve`] is the context object the application owns. Installing it adds
  a single permanent layer to the chain; uninstalling turns that layer into a
  pass-through.
- The classifier ([`classify_warning`], [`classify_error`]) decides for every
  call whether it passes through, is dropped, or becomes a [`LogRecord`].
- A [`LogStore`] receives records and owns ignore rules, the disabled switch
  and the known-warnings table. [`MemoryStore`] is provided.

# Quick start

```
use std::sync::Arc;
use console_sieve::{Config, Console, LogLevel, LogSieve, MemoryStore, StderrSink};
use serde_json::json;

let console = Arc::new(Console::new(Arc::new(StderrSink)));
let store = Arc::new(MemoryStore::new());
let sieve = LogSieve::new(console.clone(), store.clone()).with_config(Config::development());
sieve.install();

// Warnings are printed and recorded.
console.warn(vec![json!("Image %s failed to load"), json!("logo.png")]);

// Framework warnings reported on the error channel are recorded as errors.
console.error("Warning: componentWillMount is deprecated");

// Genuine errors are only printed.
console.error("TypeError: undefined is not a function");

let logs = store.logs();
assert_eq!(logs.len(), 2);
assert_eq!(logs[0].record.level, LogLevel::Warn);
assert_eq!(logs[0].record.message.content, "Image logo.png failed to load");
assert_eq!(logs[1].record.level, LogLevel::Error);
```

# Routing markers

| First argument | Warning channel | Error channel |
|---|---|---|
| contains [`SELF_REPORT_MARKER`] | pass through | pass through |
| starts with `"(ADVICE)"` | pass through | pass through (genuine error) |
| starts with `"Warning: "` | record as `warn` | filter table, record as `warn`/`error`/`fatal` |
| anything else | record as `warn` | pass through (genuine error) |

Ignored messages (see [`LogSieve::ignore_logs`]) are dropped on both channels.

# Failure handling

A call that cannot be parsed never breaks the host: it is still printed on its
original channel, logged through `logwise`, and recorded in the store as an
exception carrying [`SELF_REPORT_MARKER`] so that any later echo of it is not
classified again.

# Build modes

Capture is meant for development builds. With [`Config::production`] (the
default when `debug_assertions` are off) every [`LogSieve`] operation is a
no-op and [`LogSieve::is_installed`] is always `false`.
*/

mod call;
mod classifier;
mod config;
mod console;
mod environment;
mod error;
mod filter;
mod matcher;
mod once_nonlock;
mod parser;
mod record;
mod sieve;
mod store;

pub use call::{ADVICE_PREFIX, CallKind, DiagnosticCall, WARNING_PREFIX};
pub use classifier::{Disposition, classify_error, classify_warning};
pub use config::{Config, DEVELOPMENT_VAR, TESTING_VAR};
pub use console::{Channel, Console, Interceptor, InterceptorId, Next, Sink, StderrSink, render};
pub use environment::{Environment, FixedEnvironment, ProcessEnvironment};
pub use error::{Error, ParseError};
pub use filter::{KnownWarnings, WarningFilter, WarningRule};
pub use matcher::{IgnorePattern, IgnorePatterns};
pub use parser::{
    DefaultParser, DiagnosticParser, ParsedLog, SUBSTITUTION_PLACEHOLDER, is_component_stack,
    parse_component_stack,
};
pub use record::{
    CodeFrame, ComponentStack, ExceptionRecord, FilterResult, Location, LogLevel, LogRecord,
    Message, Substitution,
};
pub use sieve::{LogSieve, SieveLayer};
pub use store::{LogStore, MemoryStore, SELF_REPORT_MARKER, StoredLog};
