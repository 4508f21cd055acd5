//! Outcome records
//!
//! An `Outcome` is built exactly once per executed test instance from the
//! raised error (or its absence) and the stage it came from.

use crate::artifact::TestArtifact;
use crate::error::TestError;
use crate::state::{Stage, State};
use chrono::Local;
use serde::Serialize;
use std::time::Duration;

const FALLBACK_MESSAGE: &str = "Test assertion has failed";

/// Immutable result of one executed test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    name: String,
    test: String,
    error: Option<String>,
    stack: Option<String>,
    state: State,
    absolute_state: State,
    file: String,
    date: String,
    duration_ms: u64,
}

/// Raised value reduced to what an outcome records
#[derive(Debug, Clone, PartialEq)]
struct ErrorDetail {
    message: String,
    stack: Option<String>,
    state: State,
}

impl ErrorDetail {
    /// Classify a raised value. `None` means the test counts as a success.
    fn from_raised(raised: Option<&TestError>) -> Option<ErrorDetail> {
        let raised = raised?;

        let (message, state) = match raised {
            TestError::Assertion(failure) => {
                if failure.state() == State::Success {
                    return None;
                }
                (failure.message().to_string(), failure.state())
            }
            TestError::Message(message) => (message.trim().to_string(), State::Failure),
            other => (other.to_string(), State::Error),
        };

        let message = if message.is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        };

        Some(ErrorDetail {
            message,
            stack: raised.stack().map(str::to_string),
            state,
        })
    }
}

impl Outcome {
    /// Build the outcome of `test` for a raised value originating in `stage`
    pub fn create(test: &TestArtifact, raised: Option<&TestError>, stage: Stage, file: &str) -> Self {
        let detail = ErrorDetail::from_raised(raised);

        let base = detail.as_ref().map_or(State::Success, |d| d.state);
        let state = base.in_stage(stage);

        let (error, stack) = match detail {
            Some(detail) => (Some(detail.message), detail.stack),
            None => (None, None),
        };

        Outcome {
            name: display_name(test),
            test: test.name().to_string(),
            error,
            stack,
            state,
            absolute_state: state.absolute(),
            file: file.to_string(),
            date: Local::now().to_rfc3339(),
            duration_ms: 0,
        }
    }

    /// Attach the elapsed time; the only change an outcome ever receives
    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Test name followed by the serialized case parameters
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective test name (`name_0`, `name_1`, ... for cases)
    pub fn test(&self) -> &str {
        &self.test
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Stage-qualified state
    pub fn state(&self) -> State {
        self.state
    }

    /// Coarse severity
    pub fn absolute_state(&self) -> State {
        self.absolute_state
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Creation time, RFC 3339
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn is_success(&self) -> bool {
        self.absolute_state == State::Success
    }
}

fn display_name(test: &TestArtifact) -> String {
    let parameters = test
        .case_value()
        .filter(|value| !is_blank(value))
        .and_then(|value| serde_json::to_string(value).ok())
        .unwrap_or_default();
    format!("{}({})", test.name(), parameters)
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
