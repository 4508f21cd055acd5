//! Error types
//!
//! `ConfigurationError` is raised while tests and hooks are being registered.
//! `TestError` is the value a test body or hook raises at run time; it is
//! classified into a `State` when the outcome is built.

use crate::artifact::HookKind;
use crate::state::State;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::time::Duration;
use thiserror::Error;

/// Result of a test body or hook invocation
pub type TestResult = Result<(), TestError>;

/// Invalid registration, detected before anything runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Test name must be supplied.")]
    MissingName,

    #[error("File identifier must be supplied.")]
    MissingFile,

    #[error("Test with name \"{name}\" already exists in \"{file}\".")]
    DuplicateTest { name: String, file: String },

    #[error("{kind} for file {file} already exists.")]
    DuplicateHook { kind: HookKind, file: String },
}

/// Structured failure raised by the assertion capability
///
/// Carries its own state: `Failure` for a failed predicate, or an explicit
/// `Success` / `Inconclusive` marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
    state: State,
    stack: Option<String>,
}

impl AssertionFailure {
    pub(crate) fn new(message: impl Into<String>, state: State) -> Self {
        Self {
            message: message.into(),
            state,
            stack: capture_stack(),
        }
    }

    /// Human readable failure description
    pub fn message(&self) -> &str {
        &self.message
    }

    /// State this failure asks the outcome to carry
    pub fn state(&self) -> State {
        self.state
    }

    /// Stack trace captured where the assertion failed, when backtraces are enabled
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

/// Value raised by a test body or hook
#[derive(Debug, Error)]
pub enum TestError {
    /// A predicate of the assertion capability failed
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// A plain message, classified as a failure
    #[error("{0}")]
    Message(String),

    /// Any other error value, classified as an error
    #[error("{error}")]
    Thrown {
        error: Box<dyn std::error::Error + Send + Sync>,
        stack: Option<String>,
    },

    /// The body or hook panicked
    #[error("panicked: {0}")]
    Panicked(String),

    /// No completion signal arrived within the configured timeout
    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The completion signal was dropped without being invoked
    #[error("completion signal was dropped without being invoked")]
    Abandoned,
}

impl TestError {
    /// Wrap an arbitrary error, capturing the current stack
    pub fn thrown<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TestError::Thrown {
            error: Box::new(error),
            stack: capture_stack(),
        }
    }

    /// True when raised by the assertion capability
    pub fn is_assertion(&self) -> bool {
        matches!(self, TestError::Assertion(_))
    }

    /// Stack trace attached to the error, if any
    pub fn stack(&self) -> Option<&str> {
        match self {
            TestError::Assertion(failure) => failure.stack(),
            TestError::Thrown { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }
}

impl From<String> for TestError {
    fn from(message: String) -> Self {
        TestError::Message(message)
    }
}

impl From<&str> for TestError {
    fn from(message: &str) -> Self {
        TestError::Message(message.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for TestError {
    fn from(error: Box<dyn std::error::Error + Send + Sync>) -> Self {
        TestError::Thrown {
            error,
            stack: capture_stack(),
        }
    }
}

impl From<std::io::Error> for TestError {
    fn from(error: std::io::Error) -> Self {
        TestError::thrown(error)
    }
}

impl From<serde_json::Error> for TestError {
    fn from(error: serde_json::Error) -> Self {
        TestError::thrown(error)
    }
}

/// Capture a backtrace, honoring `RUST_BACKTRACE`
fn capture_stack() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_messages() {
        let err = ConfigurationError::DuplicateTest {
            name: "adds".to_string(),
            file: "math".to_string(),
        };
        assert_eq!(err.to_string(), "Test with name \"adds\" already exists in \"math\".");

        let err = ConfigurationError::DuplicateHook {
            kind: HookKind::SetupEach,
            file: "math".to_string(),
        };
        assert_eq!(err.to_string(), "SetupEach for file math already exists.");
    }

    #[test]
    fn test_conversions() {
        assert!(matches!(TestError::from("boom"), TestError::Message(ref m) if m == "boom"));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = TestError::from(io);
        assert!(matches!(err, TestError::Thrown { .. }));
        assert_eq!(err.to_string(), "disk gone");

        let failure = AssertionFailure::new("nope", State::Failure);
        let err = TestError::from(failure);
        assert!(err.is_assertion());
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn test_timeout_message() {
        let err = TestError::TimedOut(Duration::from_millis(250));
        assert_eq!(err.to_string(), "timed out after 250ms");
    }
}
