//! Console channels as an explicit middleware chain.
//!
//! Instead of patching a global `warn`/`error` function, every diagnostic call
//! travels down a chain of [`Interceptor`]s and finally reaches a [`Sink`], the
//! original emission point (stderr natively, the browser console on wasm32).
//!
//! ```text
//!  Console::warn(args)
//!        │
//!        ▼
//!  ┌──────────────┐   next   ┌──────────────┐   next   ┌──────────┐
//!  │ interceptor 2│ ───────> │ interceptor 1│ ───────> │   Sink   │
//!  │ (newest)     │          │ (oldest)     │          │          │
//!  └──────────────┘          └──────────────┘          └──────────┘
//! ```
//!
//! The most recently added interceptor sees a call first, so anything added
//! after another interceptor wraps it. Interceptors are registered and
//! removed by [`InterceptorId`].
//!
//! The chain is snapshotted before each dispatch and no lock is held while
//! interceptors run, so an interceptor may itself write to the console.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use serde_json::Value;
use wasm_safe_mutex::Mutex;
use wasm_safe_mutex::rwlock::RwLock;

use crate::call::DiagnosticCall;

/// The console channel a call was made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Warn,
    Error,
}

/// The bottom of the chain: where a call is actually printed.
pub trait Sink: Send + Sync {
    fn emit(&self, channel: Channel, call: &DiagnosticCall);
}

/// One link of the chain.
///
/// An implementation either forwards the call (possibly rewritten) with
/// [`Next::forward`] or swallows it by dropping `next`.
pub trait Interceptor: Send + Sync {
    fn intercept(&self, channel: Channel, call: DiagnosticCall, next: Next<'_>);
}

/// The remainder of the chain below the current interceptor.
pub struct Next<'a> {
    below: &'a [Arc<dyn Interceptor>],
    sink: &'a dyn Sink,
}

impl<'a> Next<'a> {
    /// Hands `call` to the next interceptor, or to the sink at the bottom.
    pub fn forward(self, channel: Channel, call: DiagnosticCall) {
        match self.below.split_last() {
            Some((interceptor, rest)) => interceptor.intercept(
                channel,
                call,
                Next {
                    below: rest,
                    sink: self.sink,
                },
            ),
            None => self.sink.emit(channel, &call),
        }
    }
}

/// Handle identifying a registered interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

static CURRENT_CONSOLE: LazyLock<Arc<Console>> =
    LazyLock::new(|| Arc::new(Console::new(Arc::new(StderrSink))));

/// A pair of console channels with an interceptor chain in front of them.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use console_sieve::{Channel, Console, DiagnosticCall, Interceptor, Next, Sink};
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
/// impl Sink for Recorder {
///     fn emit(&self, _channel: Channel, call: &DiagnosticCall) {
///         self.0.lock().unwrap().push(call.first_as_string());
///     }
/// }
///
/// struct Shout;
/// impl Interceptor for Shout {
///     fn intercept(&self, channel: Channel, call: DiagnosticCall, next: Next<'_>) {
///         let loud = call.first_as_string().to_uppercase();
///         next.forward(channel, call.with_first(loud));
///     }
/// }
///
/// let sink = Arc::new(Recorder::default());
/// let console = Console::new(sink.clone());
/// let id = console.add_interceptor(Arc::new(Shout));
/// console.warn("hello");
/// console.remove_interceptor(id);
/// console.warn("quiet");
/// assert_eq!(*sink.0.lock().unwrap(), ["HELLO", "quiet"]);
/// ```
pub struct Console {
    interceptors: RwLock<Vec<(InterceptorId, Arc<dyn Interceptor>)>>,
    sink: Arc<dyn Sink>,
    next_id: AtomicU64,
    native_route: Mutex<Option<InterceptorId>>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("interceptors", &self.interceptors.lock_sync_read().len())
            .finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(sink: Arc<dyn Sink>) -> Console {
        Console {
            interceptors: RwLock::new(Vec::new()),
            sink,
            next_id: AtomicU64::new(0),
            native_route: Mutex::new(None),
        }
    }

    /// The process-wide console, printing through [`StderrSink`].
    ///
    /// ```
    /// use std::sync::Arc;
    /// use console_sieve::{Console, LogSieve, MemoryStore};
    ///
    /// let sieve = LogSieve::new(Console::current().clone(), Arc::new(MemoryStore::new()));
    /// assert!(Arc::ptr_eq(sieve.console(), Console::current()));
    /// ```
    pub fn current() -> &'static Arc<Console> {
        &CURRENT_CONSOLE
    }

    pub fn warn(&self, call: impl Into<DiagnosticCall>) {
        self.emit(Channel::Warn, call.into());
    }

    pub fn error(&self, call: impl Into<DiagnosticCall>) {
        self.emit(Channel::Error, call.into());
    }

    /// Sends `call` down the whole chain.
    pub fn emit(&self, channel: Channel, call: DiagnosticCall) {
        let chain = self.snapshot();
        Next {
            below: &chain,
            sink: self.sink.as_ref(),
        }
        .forward(channel, call);
    }

    /// Adds `interceptor` on top of the chain.
    pub fn add_interceptor(&self, interceptor: Arc<dyn Interceptor>) -> InterceptorId {
        let id = InterceptorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.interceptors.lock_sync_write().push((id, interceptor));
        id
    }

    /// Unlinks an interceptor. Returns false if it was not registered.
    pub fn remove_interceptor(&self, id: InterceptorId) -> bool {
        let mut interceptors = self.interceptors.lock_sync_write();
        match interceptors.iter().position(|(i, _)| *i == id) {
            Some(index) => {
                interceptors.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn interceptor_count(&self) -> usize {
        self.interceptors.lock_sync_read().len()
    }

    /// Routes warnings raised by native code to the given interceptor instead of the top of the chain.
    pub fn set_native_warning_route(&self, id: Option<InterceptorId>) {
        self.native_route.with_mut_sync(|route| *route = id);
    }

    /// Entry point for warnings that originate outside the console API.
    ///
    /// With a route set, the call starts at that interceptor; interceptors above
    /// it never see it. Otherwise it behaves like [`Console::warn`].
    pub fn native_warning(&self, call: impl Into<DiagnosticCall>) {
        let call = call.into();
        let route = self.native_route.with_sync(|route| *route);
        let Some(route) = route else {
            self.emit(Channel::Warn, call);
            return;
        };
        let (chain, position) = {
            let interceptors = self.interceptors.lock_sync_read();
            let position = interceptors.iter().position(|(i, _)| *i == route);
            let chain: Vec<_> = interceptors.iter().map(|(_, i)| i.clone()).collect();
            (chain, position)
        };
        match position {
            Some(position) => Next {
                below: &chain[..=position],
                sink: self.sink.as_ref(),
            }
            .forward(Channel::Warn, call),
            None => self.emit(Channel::Warn, call),
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn Interceptor>> {
        self.interceptors
            .lock_sync_read()
            .iter()
            .map(|(_, i)| i.clone())
            .collect()
    }
}

/// Renders a call the way a console prints it: strings verbatim, everything else as JSON.
pub fn render(call: &DiagnosticCall) -> String {
    call.args()
        .iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prints to stderr, or to the browser console on WebAssembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn emit(&self, channel: Channel, call: &DiagnosticCall) {
        let text = render(call);
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = channel;
            eprintln!("{}", text);
        }
        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsValue;
            use web_sys::console;
            let text = JsValue::from(text);
            match channel {
                Channel::Warn => console::warn_1(&text),
                Channel::Error => console::error_1(&text),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder(StdMutex<Vec<(Channel, String)>>);

    impl Sink for Recorder {
        fn emit(&self, channel: Channel, call: &DiagnosticCall) {
            self.0.lock().unwrap().push((channel, render(call)));
        }
    }

    struct Tag(&'static str);

    impl Interceptor for Tag {
        fn intercept(&self, channel: Channel, call: DiagnosticCall, next: Next<'_>) {
            let tagged = format!("{}{}", self.0, call.first_as_string());
            next.forward(channel, call.with_first(tagged));
        }
    }

    struct Swallow;

    impl Interceptor for Swallow {
        fn intercept(&self, _channel: Channel, _call: DiagnosticCall, _next: Next<'_>) {}
    }

    #[test]
    fn newest_interceptor_runs_first() {
        let sink = Arc::new(Recorder::default());
        let console = Console::new(sink.clone());
        console.add_interceptor(Arc::new(Tag("a")));
        console.add_interceptor(Arc::new(Tag("b")));
        console.error("x");
        // b runs first, so a's tag ends up outermost in the text
        assert_eq!(*sink.0.lock().unwrap(), [(Channel::Error, "abx".to_string())]);
    }

    #[test]
    fn removal_by_id() {
        let sink = Arc::new(Recorder::default());
        let console = Console::new(sink.clone());
        let swallow = console.add_interceptor(Arc::new(Swallow));
        console.warn("gone");
        assert!(sink.0.lock().unwrap().is_empty());
        assert!(console.remove_interceptor(swallow));
        assert!(!console.remove_interceptor(swallow));
        console.warn("back");
        assert_eq!(*sink.0.lock().unwrap(), [(Channel::Warn, "back".to_string())]);
        assert_eq!(console.interceptor_count(), 0);
    }

    #[test]
    fn native_warnings_skip_interceptors_above_the_route() {
        let sink = Arc::new(Recorder::default());
        let console = Console::new(sink.clone());
        let a = console.add_interceptor(Arc::new(Tag("a")));
        console.add_interceptor(Arc::new(Tag("b")));
        console.native_warning("n");
        console.set_native_warning_route(Some(a));
        console.native_warning("n");
        console.remove_interceptor(a);
        console.native_warning("n");
        assert_eq!(
            *sink.0.lock().unwrap(),
            [
                (Channel::Warn, "abn".to_string()),
                (Channel::Warn, "an".to_string()),
                (Channel::Warn, "bn".to_string()),
            ]
        );
    }

    #[test]
    fn render_mixes_text_and_json() {
        let call = DiagnosticCall::new(vec![
            Value::String("n =".into()),
            serde_json::json!(3),
            serde_json::json!([1, 2]),
        ]);
        assert_eq!(render(&call), "n = 3 [1,2]");
    }
}
