//! Installing the sieve and the public control surface.
//!
//! [`LogSieve`] is the context object an application creates once, at its
//! root, and hands to whoever needs to control log capture. It owns the
//! installation state; there are no module-level globals.
//!
//! # Installation
//!
//! The first [`install`](LogSieve::install) registers a [`SieveLayer`] in the
//! console chain. That registration happens exactly once for the lifetime of
//! the `LogSieve`: the layer stays in the chain forever and everything below it
//! is what the sieve treats as the *original* channels. Install and uninstall
//! only flip the layer between classifying and passing through, so interceptors
//! added on top of the sieve keep working across any number of cycles.
//!
//! # Legacy disable flag
//!
//! Older hosts disabled capture through a boolean flag rather than
//! [`ignore_all_logs`](LogSieve::ignore_all_logs). While uninstalled the flag is
//! a plain stored value. Installing migrates a `true` value into the store and
//! turns the flag into an accessor proxying the store's disabled state; writes
//! through the accessor log a deprecation notice. Uninstalling removes the
//! accessor again, leaving the flag unset.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logwise::privacy::LogIt;
use wasm_safe_mutex::Mutex;

use crate::call::DiagnosticCall;
use crate::classifier::{Disposition, classify_error, classify_warning};
use crate::config::Config;
use crate::console::{Channel, Console, Interceptor, InterceptorId, Next};
use crate::environment::{Environment, ProcessEnvironment};
use crate::error::Error;
use crate::matcher::IgnorePattern;
use crate::once_nonlock::OnceNonLock;
use crate::parser::{DefaultParser, DiagnosticParser};
use crate::record::{ExceptionRecord, LogRecord};
use crate::store::LogStore;

const LEGACY_FLAG_DEPRECATION: &str = "The legacy disable flag is deprecated and will be removed in a future release. Use LogSieve::ignore_all_logs(value) instead.";

/// The sieve's permanent link in the console chain.
///
/// While active it classifies every call; while inactive it forwards calls
/// untouched to the channels captured below it.
pub struct SieveLayer {
    active: AtomicBool,
    store: Arc<dyn LogStore>,
    parser: Arc<dyn DiagnosticParser>,
}

impl SieveLayer {
    fn new(store: Arc<dyn LogStore>, parser: Arc<dyn DiagnosticParser>) -> SieveLayer {
        SieveLayer {
            active: AtomicBool::new(false),
            store,
            parser,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}

impl Interceptor for SieveLayer {
    fn intercept(&self, channel: Channel, call: DiagnosticCall, next: Next<'_>) {
        if !self.is_active() {
            next.forward(channel, call);
            return;
        }
        let classified = match channel {
            Channel::Warn => classify_warning(&call, self.store.as_ref(), self.parser.as_ref()),
            Channel::Error => classify_error(&call, self.store.as_ref(), self.parser.as_ref()),
        };
        match classified {
            Ok(Disposition::PassThrough) => next.forward(channel, call),
            Ok(Disposition::Drop) => {}
            Ok(Disposition::Record { console, record }) => {
                next.forward(channel, console);
                self.store.add_log(record);
            }
            Err(e) => {
                logwise::error_sync!(
                    "console_sieve: could not classify a {channel} call: {e}",
                    channel = LogIt(&channel),
                    e = LogIt(&e)
                );
                // the caller's diagnostic is never lost
                next.forward(channel, call);
                self.store.report_log_box_error(&Error::Parse(e));
            }
        }
    }
}

#[derive(Debug, Default)]
struct InstallState {
    installed: bool,
    /// Plain value of the legacy flag; only meaningful while uninstalled.
    legacy_flag: Option<bool>,
}

/// Controls capture of console diagnostics into a [`LogStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use console_sieve::{Config, Console, LogSieve, MemoryStore, StderrSink};
///
/// let console = Arc::new(Console::new(Arc::new(StderrSink)));
/// let store = Arc::new(MemoryStore::new());
/// let sieve = LogSieve::new(console.clone(), store.clone()).with_config(Config::development());
///
/// sieve.install();
/// console.warn("Slow network");
/// assert_eq!(store.logs()[0].record.message.content, "Slow network");
///
/// sieve.ignore_logs(["Slow"]);
/// console.warn("Slow disk");
/// assert_eq!(store.logs().len(), 1);
/// ```
pub struct LogSieve {
    console: Arc<Console>,
    store: Arc<dyn LogStore>,
    parser: Arc<dyn DiagnosticParser>,
    environment: Arc<dyn Environment>,
    config: Config,
    layer: OnceNonLock<(InterceptorId, Arc<SieveLayer>)>,
    state: Mutex<InstallState>,
}

impl std::fmt::Debug for LogSieve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSieve")
            .field("config", &self.config)
            .field("installed", &self.is_installed())
            .finish_non_exhaustive()
    }
}

impl LogSieve {
    /// A sieve over `console` feeding `store`, using the built-in parser,
    /// the process environment, and [`Config::from_env`].
    pub fn new(console: Arc<Console>, store: Arc<dyn LogStore>) -> LogSieve {
        LogSieve {
            console,
            store,
            parser: Arc::new(DefaultParser),
            environment: Arc::new(ProcessEnvironment),
            config: Config::from_env(),
            layer: OnceNonLock::new(),
            state: Mutex::new(InstallState::default()),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn DiagnosticParser>) -> LogSieve {
        self.parser = parser;
        self
    }

    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> LogSieve {
        self.environment = environment;
        self
    }

    pub fn with_config(mut self, config: Config) -> LogSieve {
        self.config = config;
        self
    }

    pub fn console(&self) -> &Arc<Console> {
        &self.console
    }

    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts classifying console calls. Does nothing if already installed.
    pub fn install(&self) {
        if !self.config.development {
            return;
        }
        // the installed flag and the layer's activity change under one lock
        let installed = self.state.with_mut_sync(|s| {
            if s.installed {
                return None;
            }
            let (id, layer) = self.layer.try_get_or_init(|| {
                let layer = Arc::new(SieveLayer::new(self.store.clone(), self.parser.clone()));
                let id = self.console.add_interceptor(layer.clone());
                Some((id, layer))
            })?;
            layer.set_active(true);
            s.installed = true;
            Some((*id, s.legacy_flag.take()))
        });
        let Some((id, legacy)) = installed else {
            return;
        };

        if legacy == Some(true) {
            self.store.set_disabled(true);
            logwise::warn_sync!(
                "console_sieve: {notice}",
                notice = LogIt(&LEGACY_FLAG_DEPRECATION)
            );
        }

        if self.environment.is_testing_environment() {
            self.store.set_disabled(true);
        }

        self.console.set_native_warning_route(Some(id));
        logwise::info_sync!("console_sieve: installed");
    }

    /// Stops classifying; calls flow to the original channels again. Does nothing if not installed.
    pub fn uninstall(&self) {
        if !self.config.development {
            return;
        }
        let was_installed = self.state.with_mut_sync(|s| {
            if !s.installed {
                return false;
            }
            if let Some((_, layer)) = self.layer.get() {
                layer.set_active(false);
            }
            s.installed = false;
            s.legacy_flag = None;
            true
        });
        if was_installed {
            logwise::info_sync!("console_sieve: uninstalled");
        }
    }

    pub fn is_installed(&self) -> bool {
        self.config.development && self.state.with_sync(|s| s.installed)
    }

    /// Adds ignore rules. Works whether or not the sieve is installed.
    pub fn ignore_logs<I, P>(&self, patterns: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<IgnorePattern>,
    {
        if !self.config.development {
            return;
        }
        self.store
            .add_ignore_patterns(patterns.into_iter().map(Into::into).collect());
    }

    /// Disables (`None` or `Some(true)`) or re-enables (`Some(false)`) all capture.
    pub fn ignore_all_logs(&self, value: Option<bool>) {
        if !self.config.development {
            return;
        }
        self.store.set_disabled(value.unwrap_or(true));
    }

    pub fn clear_all_logs(&self) {
        if !self.config.development {
            return;
        }
        self.store.clear();
    }

    /// Hands `record` straight to the store, but only while installed.
    pub fn add_log(&self, record: LogRecord) {
        if self.is_installed() {
            self.store.add_log(record);
        }
    }

    /// Hands `record` straight to the store, but only while installed.
    pub fn add_exception(&self, record: ExceptionRecord) {
        if self.is_installed() {
            self.store.add_exception(record);
        }
    }

    /// Reads the legacy disable flag.
    ///
    /// While installed this is the store's disabled state; otherwise the plain stored value.
    pub fn legacy_disable_flag(&self) -> Option<bool> {
        if self.is_installed() {
            Some(self.store.is_disabled())
        } else {
            self.state.with_sync(|s| s.legacy_flag)
        }
    }

    /// Writes the legacy disable flag.
    pub fn set_legacy_disable_flag(&self, value: bool) {
        if self.is_installed() {
            self.store.set_disabled(value);
            logwise::warn_sync!(
                "console_sieve: {notice}",
                notice = LogIt(&LEGACY_FLAG_DEPRECATION)
            );
        } else {
            self.state.with_mut_sync(|s| s.legacy_flag = Some(value));
        }
    }
}
