//! Registered test and hook artifacts
//!
//! Artifacts are data only until the runner executes them.

use crate::assert::Assert;
use crate::error::{TestError, TestResult};
use crate::outcome::Outcome;
use crate::signal::Done;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Test logic: receives a fresh `Assert`, a completion signal and, for
/// case-expanded tests, the case value
pub type TestBody = Arc<dyn Fn(Assert, Done, Option<&Value>) -> TestResult + Send + Sync>;

/// `setup` and `setup_each` logic
pub type SetupHook = Box<dyn Fn(Assert, Done) -> TestResult + Send + Sync>;

/// `teardown_each` logic; also receives the outcome of the test so far
pub type TeardownEachHook = Box<dyn Fn(Assert, &Outcome, Done) -> TestResult + Send + Sync>;

/// `teardown` logic
pub type TeardownHook = Box<dyn Fn(Done) -> TestResult + Send + Sync>;

/// Kind of lifecycle hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Setup,
    SetupEach,
    Teardown,
    TeardownEach,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Setup => write!(f, "Setup"),
            HookKind::SetupEach => write!(f, "SetupEach"),
            HookKind::Teardown => write!(f, "Teardown"),
            HookKind::TeardownEach => write!(f, "TeardownEach"),
        }
    }
}

type TypeCheck = fn(&(dyn Error + Send + Sync + 'static)) -> bool;

/// Error a test is expected to raise
///
/// A raised value matching the descriptor turns the test into a pass.
/// Assertion failures never match.
#[derive(Clone)]
pub enum Throws {
    /// Matches when the pattern finds the raised value's message
    Pattern(Regex),
    /// Matches when the raised error is of the given type
    Type { name: &'static str, check: TypeCheck },
}

impl Throws {
    /// Expect a raised value whose message matches `pattern`
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Throws::Pattern(Regex::new(pattern)?))
    }

    /// Expect a raised error of type `E`
    pub fn of<E: Error + 'static>() -> Self {
        Throws::Type {
            name: std::any::type_name::<E>(),
            check: is_type::<E>,
        }
    }

    /// Check a raised value against this descriptor
    pub fn matches(&self, raised: &TestError) -> bool {
        if raised.is_assertion() {
            return false;
        }

        match self {
            Throws::Pattern(regex) => regex.is_match(&raised.to_string()),
            Throws::Type { check, .. } => match raised {
                TestError::Thrown { error, .. } => check(error.as_ref()),
                _ => false,
            },
        }
    }
}

fn is_type<E: Error + 'static>(error: &(dyn Error + Send + Sync + 'static)) -> bool {
    error.is::<E>()
}

impl fmt::Debug for Throws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throws::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Throws::Type { name, .. } => f.debug_tuple("Type").field(name).finish(),
        }
    }
}

/// Per-test registration options
#[derive(Debug, Clone, Default)]
pub struct TestOptions {
    /// Run in the file's async group (default execution mode only)
    pub is_async: bool,
    /// Discard the registration
    pub skip: bool,
    /// Discard the registration
    pub ignore: bool,
    /// Parameter sets; one test instance per entry
    pub cases: Vec<Value>,
    /// Expected raised value
    pub throws: Option<Throws>,
}

impl TestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_async(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn with_cases<I>(mut self, cases: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.cases = cases.into_iter().collect();
        self
    }

    pub fn with_throws(mut self, throws: Throws) -> Self {
        self.throws = Some(throws);
        self
    }

    pub(crate) fn is_discarded(&self) -> bool {
        self.skip || self.ignore
    }
}

/// One registered test instance
#[derive(Clone)]
pub struct TestArtifact {
    pub(crate) name: String,
    pub(crate) file: String,
    pub(crate) options: Arc<TestOptions>,
    pub(crate) body: TestBody,
    pub(crate) case: Option<(usize, Value)>,
}

impl TestArtifact {
    /// Effective name, suffixed with the case index for case-expanded tests
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical file the test was registered under
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn options(&self) -> &TestOptions {
        &self.options
    }

    pub fn case_index(&self) -> Option<usize> {
        self.case.as_ref().map(|(index, _)| *index)
    }

    pub fn case_value(&self) -> Option<&Value> {
        self.case.as_ref().map(|(_, value)| value)
    }

    pub(crate) fn is_async(&self) -> bool {
        self.options.is_async
    }
}

impl fmt::Debug for TestArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestArtifact")
            .field("name", &self.name)
            .field("file", &self.file)
            .field("options", &self.options)
            .field("case", &self.case)
            .finish_non_exhaustive()
    }
}
