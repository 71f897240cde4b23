//! Error taxonomy for the timer-and-poll core

use core::fmt;

/// Result type for core operations
pub type CortResult<T> = Result<T, CortError>;

/// Errors surfaced by the timer heap, poll driver, and waiter state machine.
///
/// `InvariantViolation` is the only variant that callers are not expected
/// to handle: it indicates a programming defect (e.g. adding a waiter that
/// is already armed) and the core aborts rather than returning it from a
/// fallible path — see the `invariant!` macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CortError {
    /// The OS multiplexer or clock failed to initialize; the thread cannot
    /// run its loop.
    InitFailed(String),

    /// `epoll_ctl` (add/mod) rejected a file descriptor.
    RegistrationFailed(i32),

    /// A waiter was not found where the caller expected it (heap or
    /// multiplexer). This is surfaced only where the benign-race reading
    /// (already removed) does not apply.
    NotFound,
}

impl fmt::Display for CortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CortError::InitFailed(msg) => write!(f, "timer core init failed: {msg}"),
            CortError::RegistrationFailed(errno) => {
                write!(f, "poll driver registration failed (errno {errno})")
            }
            CortError::NotFound => write!(f, "waiter not found"),
        }
    }
}

impl std::error::Error for CortError {}

/// Abort with a message describing an invariant violation.
///
/// A waiter already armed on `add`, or similar: a program defect, not a
/// recoverable condition, so this aborts rather than returning an `Err`.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            panic!("timerloop invariant violated: {}", format!($($msg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = CortError::RegistrationFailed(9);
        assert_eq!(format!("{e}"), "poll driver registration failed (errno 9)");
    }

    #[test]
    #[should_panic(expected = "timerloop invariant violated")]
    fn test_invariant_panics() {
        invariant!(1 == 2, "one should equal two");
    }

    #[test]
    fn test_invariant_passes() {
        invariant!(1 == 1, "fine");
    }
}
