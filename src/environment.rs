//! Probing whether the process runs in a non-interactive testing context.
//!
//! When it does, installing the sieve immediately disables the store so that
//! test runs are not interrupted by captured logs.

use crate::config::{TESTING_VAR, read_flag};

pub trait Environment: Send + Sync {
    fn is_testing_environment(&self) -> bool;
}

/// Reads [`TESTING_VAR`] each time it is asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn is_testing_environment(&self) -> bool {
        read_flag(TESTING_VAR).unwrap_or(false)
    }
}

/// An environment with a fixed answer.
///
/// # Examples
///
/// ```
/// use console_sieve::{Environment, FixedEnvironment};
///
/// assert!(FixedEnvironment(true).is_testing_environment());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedEnvironment(pub bool);

impl Environment for FixedEnvironment {
    fn is_testing_environment(&self) -> bool {
        self.0
    }
}
