//! Proctor - a small test orchestration engine
//!
//! Tests and lifecycle hooks are registered per logical file, then run
//! file by file: `setup`, the async group, the sync group, `teardown`.
//! Every test instance yields one [`Outcome`] classified into the
//! stage-aware [`State`] taxonomy, and the [`Reporter`] turns the
//! collected outcomes into a summary and a process exit code.
//!
//! ```no_run
//! use proctor::Proctor;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut proctor = Proctor::from_env()?;
//!
//!     proctor.file("math")?.test("adds", |assert, done, _| {
//!         assert.are_equal(2 + 2, 4)?;
//!         done.pass();
//!         Ok(())
//!     })?;
//!
//!     proctor.run_and_exit()?;
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod assert;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod signal;
pub mod state;

pub use artifact::{HookKind, TestArtifact, TestOptions, Throws};
pub use assert::{Assert, AssertResult, Emptiness};
pub use engine::{Proctor, RunReport};
pub use error::{AssertionFailure, ConfigurationError, TestError, TestResult};
pub use outcome::Outcome;
pub use registry::{FileRegistry, FileScope};
pub use reporter::{Reporter, Summary};
pub use signal::Done;
pub use state::{Stage, State};

pub use proctor_config::{ConfigError, ExecutionMode, OutputStyle, ProctorConfig};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debug output.
///
/// Call this once at the start of a test binary to enable tracing.
/// Does nothing unless `RUST_LOG` is set.
///
/// Example: `RUST_LOG=proctor=debug cargo test`
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
