//! Build-mode configuration.
//!
//! Capture is a development aid. In a non-development build every control
//! operation of [`LogSieve`](crate::LogSieve) becomes a no-op and the sieve
//! reports itself as not installed. By default the mode follows
//! `debug_assertions`; `CONSOLE_SIEVE_DEVELOPMENT` overrides it at runtime.

/// Environment variable overriding [`Config::development`].
pub const DEVELOPMENT_VAR: &str = "CONSOLE_SIEVE_DEVELOPMENT";

/// Environment variable read by [`ProcessEnvironment`](crate::ProcessEnvironment).
pub const TESTING_VAR: &str = "CONSOLE_SIEVE_TESTING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether capture is available at all.
    pub development: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            development: cfg!(debug_assertions),
        }
    }
}

impl Config {
    /// The default configuration, with overrides from the process environment applied.
    pub fn from_env() -> Config {
        let mut config = Config::default();
        if let Some(development) = read_flag(DEVELOPMENT_VAR) {
            config.development = development;
        }
        config
    }

    pub fn development() -> Config {
        Config { development: true }
    }

    pub fn production() -> Config {
        Config { development: false }
    }
}

/// Reads a boolean environment variable. Unset or unrecognised values yield `None`.
pub(crate) fn read_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_flag(&v))
}

/// Accepts `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, case-insensitively.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
