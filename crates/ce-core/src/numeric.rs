//! Process-wide policy for floating-point anomalies in metric code.
//!
//! Degenerate tasks (a single class, zero-variance scores) legitimately
//! produce NaN or infinite metric values. Metric code reports each anomaly
//! through [`check_numeric`], and the active [`NumericErrorPolicy`] decides
//! whether it is ignored, logged as a warning, or turned into an error.
//!
//! The policy is a single global value. [`NumericErrorScope`] changes it for
//! the lifetime of a guard and restores the previous value on every exit path
//! (normal return, `?` early return, panic unwinding):
//!
//! ```
//! use ce_core::numeric::{numeric_error_policy, NumericErrorPolicy, NumericErrorScope};
//!
//! {
//!     let _quiet = NumericErrorScope::ignore();
//!     assert_eq!(numeric_error_policy(), NumericErrorPolicy::Ignore);
//! }
//! ```
//!
//! # Thread safety
//!
//! The outermost scope on a thread holds a global lock until it is dropped, so
//! scopes opened from different threads run one after another. Nested scopes
//! on the same thread stack without re-locking. Calling
//! [`set_numeric_error_policy`] directly bypasses that lock and is not safe to
//! mix with scopes on other threads.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// How floating-point anomalies in metric code are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericErrorPolicy {
    /// Return the NaN/inf value silently.
    Ignore,
    /// Return the value and emit a warning event (default).
    #[default]
    Warn,
    /// Fail with [`Error::FloatingPoint`].
    Raise,
}

impl NumericErrorPolicy {
    fn to_u8(self) -> u8 {
        match self {
            NumericErrorPolicy::Ignore => 0,
            NumericErrorPolicy::Warn => 1,
            NumericErrorPolicy::Raise => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => NumericErrorPolicy::Ignore,
            2 => NumericErrorPolicy::Raise,
            _ => NumericErrorPolicy::Warn,
        }
    }
}

impl std::str::FromStr for NumericErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" | "off" => Ok(NumericErrorPolicy::Ignore),
            "warn" | "warning" => Ok(NumericErrorPolicy::Warn),
            "raise" | "error" => Ok(NumericErrorPolicy::Raise),
            _ => Err(format!("unknown numeric error policy: {}", s)),
        }
    }
}

impl std::fmt::Display for NumericErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericErrorPolicy::Ignore => write!(f, "ignore"),
            NumericErrorPolicy::Warn => write!(f, "warn"),
            NumericErrorPolicy::Raise => write!(f, "raise"),
        }
    }
}

/// Kind of floating-point anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericIssue {
    /// Result is NaN (e.g. mean over an empty selection).
    InvalidValue,
}

impl std::fmt::Display for NumericIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericIssue::InvalidValue => write!(f, "invalid value"),
        }
    }
}

static POLICY: AtomicU8 = AtomicU8::new(1);
static SCOPE_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Current process-wide policy.
pub fn numeric_error_policy() -> NumericErrorPolicy {
    NumericErrorPolicy::from_u8(POLICY.load(Ordering::SeqCst))
}

/// Replace the process-wide policy, returning the previous one.
pub fn set_numeric_error_policy(policy: NumericErrorPolicy) -> NumericErrorPolicy {
    NumericErrorPolicy::from_u8(POLICY.swap(policy.to_u8(), Ordering::SeqCst))
}

/// Report a floating-point anomaly in `operation` under the active policy.
pub fn check_numeric(issue: NumericIssue, operation: &'static str) -> Result<()> {
    match numeric_error_policy() {
        NumericErrorPolicy::Ignore => Ok(()),
        NumericErrorPolicy::Warn => {
            tracing::warn!(issue = %issue, operation, "floating point anomaly");
            Ok(())
        }
        NumericErrorPolicy::Raise => Err(Error::FloatingPoint { issue, operation }),
    }
}

/// Guard that holds a numeric error policy until dropped.
///
/// Not `Send`: it must be dropped on the thread that created it. Nested scopes
/// must be dropped in reverse order of creation; dropping an outer scope while
/// an inner one is alive releases the global lock early and restores the
/// wrong policy. Debug builds panic on out-of-order drops.
#[must_use = "the policy is restored as soon as the scope is dropped"]
pub struct NumericErrorScope {
    previous: NumericErrorPolicy,
    depth: usize,
    _lock: Option<MutexGuard<'static, ()>>,
}

impl NumericErrorScope {
    /// Apply `policy` until the returned guard is dropped.
    pub fn enter(policy: NumericErrorPolicy) -> Self {
        let (depth, lock) = SCOPE_DEPTH.with(|depth| {
            let outermost = depth.get() == 0;
            depth.set(depth.get() + 1);
            // The lock guards no data, so a poisoned lock is still usable.
            let lock =
                outermost.then(|| SCOPE_LOCK.lock().unwrap_or_else(PoisonError::into_inner));
            (depth.get(), lock)
        });
        let previous = set_numeric_error_policy(policy);
        NumericErrorScope {
            previous,
            depth,
            _lock: lock,
        }
    }

    /// Silence NaN/inf reporting until the returned guard is dropped.
    pub fn ignore() -> Self {
        Self::enter(NumericErrorPolicy::Ignore)
    }

    /// Policy that will be restored on drop.
    pub fn previous(&self) -> NumericErrorPolicy {
        self.previous
    }
}

impl Drop for NumericErrorScope {
    fn drop(&mut self) {
        set_numeric_error_policy(self.previous);
        let current = SCOPE_DEPTH.with(|depth| {
            let current = depth.get();
            depth.set(current.saturating_sub(1));
            current
        });
        debug_assert!(
            current == self.depth || std::thread::panicking(),
            "numeric error scope dropped out of order (depth {} while {} scopes are open)",
            self.depth,
            current
        );
    }
}

/// Run `f` with numeric anomalies ignored.
pub fn with_numeric_errors_ignored<T>(f: impl FnOnce() -> T) -> T {
    let _scope = NumericErrorScope::ignore();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parse_and_display() {
        assert_eq!(
            "ignore".parse::<NumericErrorPolicy>().unwrap(),
            NumericErrorPolicy::Ignore
        );
        assert_eq!(
            "WARN".parse::<NumericErrorPolicy>().unwrap(),
            NumericErrorPolicy::Warn
        );
        assert_eq!(
            "error".parse::<NumericErrorPolicy>().unwrap(),
            NumericErrorPolicy::Raise
        );
        assert!("loud".parse::<NumericErrorPolicy>().is_err());
        assert_eq!(NumericErrorPolicy::Raise.to_string(), "raise");
    }

    #[test]
    fn policy_round_trips_through_storage() {
        for policy in [
            NumericErrorPolicy::Ignore,
            NumericErrorPolicy::Warn,
            NumericErrorPolicy::Raise,
        ] {
            assert_eq!(NumericErrorPolicy::from_u8(policy.to_u8()), policy);
        }
    }

    #[test]
    fn nested_scopes_restore_in_stack_order() {
        let _outer = NumericErrorScope::enter(NumericErrorPolicy::Warn);
        assert_eq!(numeric_error_policy(), NumericErrorPolicy::Warn);
        {
            let inner = NumericErrorScope::ignore();
            assert_eq!(inner.previous(), NumericErrorPolicy::Warn);
            assert_eq!(numeric_error_policy(), NumericErrorPolicy::Ignore);
            {
                let _innermost = NumericErrorScope::enter(NumericErrorPolicy::Warn);
                assert_eq!(numeric_error_policy(), NumericErrorPolicy::Warn);
            }
            assert_eq!(numeric_error_policy(), NumericErrorPolicy::Ignore);
        }
        assert_eq!(numeric_error_policy(), NumericErrorPolicy::Warn);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dropped out of order")]
    fn out_of_order_drop_panics_in_debug() {
        let outer = NumericErrorScope::enter(NumericErrorPolicy::Warn);
        let _inner = NumericErrorScope::ignore();
        drop(outer);
    }

    #[test]
    fn scope_restores_on_early_return() {
        fn failing() -> Result<()> {
            let _scope = NumericErrorScope::ignore();
            Err(Error::InvalidThreshold(f64::NAN))
        }

        let _outer = NumericErrorScope::enter(NumericErrorPolicy::Warn);
        assert!(failing().is_err());
        assert_eq!(numeric_error_policy(), NumericErrorPolicy::Warn);
    }

    #[test]
    fn ignored_check_is_ok() {
        let value = with_numeric_errors_ignored(|| {
            check_numeric(NumericIssue::InvalidValue, "test").map(|_| f64::NAN)
        });
        assert!(value.unwrap().is_nan());
    }
}
