//! File-level and per-test hooks
//!
//! Run with `cargo run -p proctor --example setup_teardown`.

use proctor::{OutputStyle, Proctor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    proctor::init_tracing();

    let mut proctor = Proctor::from_env()?.with_output(OutputStyle::Plain);

    proctor
        .file("setup_teardown")?
        // Once, before any test of the file
        .setup(|a, done| {
            a.is_not_empty("fixture")?;
            done.pass();
            Ok(())
        })?
        // Before every test
        .setup_each(|_, done| {
            done.pass();
            Ok(())
        })?
        .test("test-name", |_, done, _| {
            done.pass();
            Ok(())
        })?
        // After every test, with its outcome
        .teardown_each(|_, outcome, done| {
            tracing::debug!(test = outcome.name(), state = %outcome.state(), "finished");
            done.pass();
            Ok(())
        })?
        // Once, after all tests of the file
        .teardown(|done| {
            done.pass();
            Ok(())
        })?;

    proctor.run_and_exit()?;
    Ok(())
}
