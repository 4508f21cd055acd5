//! Basic registration: plain tests, an ignored test, cases and expected errors
//!
//! Run with `cargo run -p proctor --example quick_start`.

use proctor::{Proctor, TestError, TestOptions, Throws};
use serde_json::json;
use std::time::Duration;

#[derive(Debug)]
struct ParseFailure(String);

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse failure: {}", self.0)
    }
}

impl std::error::Error for ParseFailure {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    proctor::init_tracing();

    let mut proctor = Proctor::from_env()?;
    let mut file = proctor.file("quick_start")?;

    file.test("test-name", |a, done, _| {
        let x = 3;
        a.are_equal(3, x)?;
        done.pass();
        Ok(())
    })?;

    // Completion may be signalled later, from another task
    file.test_with("test-name-2", TestOptions::new().with_async(), |_, done, _| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            done.pass();
        });
        Ok(())
    })?;

    file.test_with("ignore-test", TestOptions::new().ignored(), |a, done, _| {
        a.contains_item(&[1, 2, 3], &2)?;
        done.pass();
        Ok(())
    })?;

    file.test_with(
        "test-cases",
        TestOptions::new().with_cases(vec![json!({"x": 1}), json!({"x": 2})]),
        |a, done, case| {
            let x = case.and_then(|c| c["x"].as_i64()).unwrap_or_default();
            a.is_between(1 + x, 1, 5)?;
            done.pass();
            Ok(())
        },
    )?;

    file.test_with(
        "expect-error",
        TestOptions::new().with_throws(Throws::of::<ParseFailure>()),
        |_, _done, _| Err(TestError::thrown(ParseFailure("example".to_string()))),
    )?;

    file.test_with(
        "expect-error-msg",
        TestOptions::new().with_throws(Throws::pattern("example")?),
        |_, _done, _| Err("example".into()),
    )?;

    proctor.run_and_exit()?;
    Ok(())
}
