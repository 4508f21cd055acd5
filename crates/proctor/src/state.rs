//! Outcome state taxonomy
//!
//! A `State` is what happened; a `Stage` is where in the lifecycle it
//! happened. Composing the two yields a stage-qualified state, and the
//! absolute state collapses that qualification back into a coarse severity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase in which an outcome originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// The file-level `setup` hook
    TestFixtureSetup,
    /// The per-test `setup_each` hook
    Setup,
    /// The test body itself
    Test,
    /// The per-test `teardown_each` hook
    Teardown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::TestFixtureSetup => write!(f, "TestFixtureSetup"),
            Stage::Setup => write!(f, "Setup"),
            Stage::Test => write!(f, "Test"),
            Stage::Teardown => write!(f, "Teardown"),
        }
    }
}

/// Outcome state, either stage-relative or absolute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Success,
    Failure,
    Error,
    Inconclusive,
    Ignored,

    SetupError,
    SetupFailure,

    TeardownError,
    TeardownFailure,

    TestFixtureSetupError,
    TestFixtureSetupFailure,

    Unknown,
}

impl State {
    /// Every state, in declaration order
    pub const ALL: [State; 12] = [
        State::Success,
        State::Failure,
        State::Error,
        State::Inconclusive,
        State::Ignored,
        State::SetupError,
        State::SetupFailure,
        State::TeardownError,
        State::TeardownFailure,
        State::TestFixtureSetupError,
        State::TestFixtureSetupFailure,
        State::Unknown,
    ];

    /// True for states that read the same in every stage
    pub fn is_stage_invariant(self) -> bool {
        matches!(
            self,
            State::Success | State::Inconclusive | State::Ignored | State::Unknown
        )
    }

    /// Qualify this state with the stage it happened in.
    ///
    /// Only the plain `Failure` and `Error` states have stage-qualified
    /// forms; qualifying an already qualified state has no taxonomy entry
    /// and yields `Unknown`.
    pub fn in_stage(self, stage: Stage) -> State {
        if self.is_stage_invariant() || stage == Stage::Test {
            return self;
        }

        match (stage, self) {
            (Stage::Setup, State::Error) => State::SetupError,
            (Stage::Setup, State::Failure) => State::SetupFailure,
            (Stage::Teardown, State::Error) => State::TeardownError,
            (Stage::Teardown, State::Failure) => State::TeardownFailure,
            (Stage::TestFixtureSetup, State::Error) => State::TestFixtureSetupError,
            (Stage::TestFixtureSetup, State::Failure) => State::TestFixtureSetupFailure,
            _ => State::Unknown,
        }
    }

    /// Collapse a stage-qualified state into its coarse severity
    pub fn absolute(self) -> State {
        match self {
            State::SetupError | State::TeardownError | State::TestFixtureSetupError => {
                State::Error
            }
            State::SetupFailure | State::TeardownFailure | State::TestFixtureSetupFailure => {
                State::Failure
            }
            other => other,
        }
    }

    /// Symbol written per outcome in dot output
    pub fn dot_symbol(self) -> char {
        match self.absolute() {
            State::Success => '.',
            State::Inconclusive => 'I',
            State::Ignored => 'S',
            State::Error => 'E',
            _ => 'F',
        }
    }

    /// Name as written in reports
    pub fn as_str(self) -> &'static str {
        match self {
            State::Success => "Success",
            State::Failure => "Failure",
            State::Error => "Error",
            State::Inconclusive => "Inconclusive",
            State::Ignored => "Ignored",
            State::SetupError => "SetupError",
            State::SetupFailure => "SetupFailure",
            State::TeardownError => "TeardownError",
            State::TeardownFailure => "TeardownFailure",
            State::TestFixtureSetupError => "TestFixtureSetupError",
            State::TestFixtureSetupFailure => "TestFixtureSetupFailure",
            State::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
