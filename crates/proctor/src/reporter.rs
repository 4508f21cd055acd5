//! Test reporter - collect outcomes and display results

use crate::error::TestError;
use crate::outcome::Outcome;
use crate::state::State;
use colored::*;
use parking_lot::Mutex;
use proctor_config::OutputStyle;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;

const RULE: &str = "= = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = =";

/// Counts per absolute state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub inconclusive: usize,
    pub skipped: usize,
}

impl Summary {
    fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let count = |state: State| {
            outcomes
                .iter()
                .filter(|o| o.absolute_state() == state)
                .count()
        };

        Summary {
            total: outcomes.len(),
            passed: count(State::Success),
            failed: count(State::Failure),
            errored: count(State::Error),
            inconclusive: count(State::Inconclusive),
            skipped: count(State::Ignored),
        }
    }

    pub fn success_rate(&self) -> String {
        ratio(self.passed, self.total)
    }

    /// Failures and errors over the total
    pub fn failure_rate(&self) -> String {
        ratio(self.failed + self.errored, self.total)
    }

    /// 0 when every outcome passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.passed == self.total {
            0
        } else {
            1
        }
    }
}

struct ReporterState {
    outcomes: Vec<Outcome>,
    out: Box<dyn Write + Send>,
}

/// Collects outcomes and writes them in the configured style
///
/// Appends and writes happen under one lock, so outcomes logged by
/// concurrently running tests never interleave.
pub struct Reporter {
    style: OutputStyle,
    no_color: bool,
    state: Mutex<ReporterState>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputStyle::Dot)
    }
}

impl Reporter {
    /// Create a reporter writing to stdout
    pub fn new(style: OutputStyle) -> Self {
        Self {
            style,
            no_color: false,
            state: Mutex::new(ReporterState {
                outcomes: Vec::new(),
                out: Box::new(io::stdout()),
            }),
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Write the report somewhere other than stdout
    pub fn with_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.state.get_mut().out = Box::new(writer);
        self
    }

    /// Record an outcome and write its immediate output
    pub fn log(&self, outcome: Outcome) {
        let mut state = self.state.lock();

        match self.style {
            OutputStyle::Dot => {
                let symbol = self.dot(outcome.absolute_state());
                let _ = write!(state.out, "{}", symbol);
                let _ = state.out.flush();
            }
            OutputStyle::Plain => {
                if !outcome.is_success() {
                    let detail = self.detail(&outcome);
                    let _ = write!(state.out, "{}", detail);
                }
            }
            OutputStyle::Json => {}
        }

        state.outcomes.push(outcome);
    }

    /// Report a failed file teardown; it never becomes an outcome
    pub fn log_teardown_failure(&self, file: &str, error: &TestError) {
        if self.style == OutputStyle::Json {
            return;
        }

        let mut state = self.state.lock();
        let header = self.paint("Teardown failed", Color::Red);
        let _ = writeln!(state.out, "\n{} for {}: {}", header, file, error);
        if let Some(stack) = error.stack() {
            let _ = writeln!(state.out, "{}", stack);
        }
    }

    /// Copy of every recorded outcome, in logging order
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.state.lock().outcomes.clone()
    }

    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.state.lock().outcomes)
    }

    /// Write failure details and statistics, returning the exit code
    pub fn finalize(&self, total_duration: Duration) -> i32 {
        let mut state = self.state.lock();
        let summary = Summary::from_outcomes(&state.outcomes);

        match self.style {
            OutputStyle::Json => {
                let document = serde_json::json!({
                    "tests": summary.total,
                    "passed": summary.passed,
                    "failed": summary.failed,
                    "errored": summary.errored,
                    "inconclusive": summary.inconclusive,
                    "skipped": summary.skipped,
                    "duration_ms": duration_millis(total_duration),
                    "results": &state.outcomes,
                });
                let _ = writeln!(state.out, "{}", document);
            }
            style => {
                let mut text = String::new();

                if style == OutputStyle::Dot {
                    let failures: Vec<&Outcome> = state
                        .outcomes
                        .iter()
                        .filter(|o| {
                            !matches!(o.absolute_state(), State::Success | State::Ignored)
                        })
                        .collect();

                    if !failures.is_empty() {
                        text.push_str(&format!("\n\n{}\n\n", RULE));
                        for outcome in failures {
                            text.push_str(&self.detail(outcome));
                        }
                    }
                }

                text.push_str(&format!("\n\n{}\n", RULE));
                text.push_str(&format!(
                    "Total: {}, Passed: {}, Failed: {}, Errored: {}, Inconclusive: {}, Skipped: {}\n",
                    summary.total,
                    summary.passed,
                    summary.failed,
                    summary.errored,
                    summary.inconclusive,
                    summary.skipped
                ));
                text.push_str(&format!(
                    "Success Rate: {}\nFailure Rate: {}\n",
                    summary.success_rate(),
                    summary.failure_rate()
                ));
                text.push_str(&format!("Duration: {}", format_duration(total_duration)));
                text.push_str(&format!("\n{}\n", RULE));

                let _ = write!(state.out, "{}", text);
            }
        }

        let _ = state.out.flush();
        summary.exit_code()
    }

    /// Full description of one outcome
    fn detail(&self, outcome: &Outcome) -> String {
        let mut text = format!(
            "File: {}\nTest: {}\nState: {}\nDuration: {}ms",
            outcome.file(),
            outcome.name(),
            self.paint_state(outcome.state()),
            outcome.duration_ms()
        );

        if outcome.state() != State::Success {
            text.push_str(&format!(
                "\n\nError Message: {}\n\nStackTrace:\n{}",
                outcome.error().unwrap_or_default(),
                outcome.stack().unwrap_or_default()
            ));
        }

        text.push_str(&format!("\n\n{}\n\n", RULE));
        text
    }

    fn dot(&self, state: State) -> String {
        let symbol = state.dot_symbol().to_string();
        match state.absolute() {
            State::Success => self.paint(&symbol, Color::Green),
            State::Inconclusive | State::Ignored => self.paint(&symbol, Color::Yellow),
            _ => self.paint(&symbol, Color::Red),
        }
    }

    fn paint_state(&self, state: State) -> String {
        match state.absolute() {
            State::Success => self.paint(state.as_str(), Color::Green),
            State::Inconclusive | State::Ignored => self.paint(state.as_str(), Color::Yellow),
            _ => self.paint(state.as_str(), Color::Red),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.color(color).bold().to_string()
        }
    }
}

/// `value / total` as written in the summary
fn ratio(value: usize, total: usize) -> String {
    if value == 0 {
        return "0.0".to_string();
    }
    if value == total {
        return "1.0".to_string();
    }

    // A partial rate never prints as 0.00 or 1.00
    let rate = (value as f64 / total as f64).clamp(0.01, 0.99);
    format!("{:.2}", rate)
}

/// Duration as `{d}d {h}h {m}m {s}s {ms}ms`
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration_millis(duration);
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = (total_secs / 3600) % 24;
    let days = total_secs / 86_400;
    format!("{}d {}h {}m {}s {}ms", days, hours, mins, secs, ms)
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{TestArtifact, TestOptions};
    use crate::assert::Assert;
    use crate::signal::Done;
    use crate::state::Stage;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::Value;
    use std::sync::Arc;

    /// In-memory report sink shared with the test
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn artifact(name: &str) -> TestArtifact {
        TestArtifact {
            name: name.to_string(),
            file: "report.rs".to_string(),
            options: Arc::new(TestOptions::default()),
            body: Arc::new(|_: Assert, done: Done, _: Option<&Value>| {
                done.pass();
                Ok(())
            }),
            case: None,
        }
    }

    fn make_pass(name: &str) -> Outcome {
        Outcome::create(&artifact(name), None, Stage::Test, "report.rs")
    }

    fn make_fail(name: &str, error: &str) -> Outcome {
        let raised = TestError::from(error);
        Outcome::create(&artifact(name), Some(&raised), Stage::Test, "report.rs")
    }

    fn make_error(name: &str, stage: Stage) -> Outcome {
        let raised = TestError::thrown(io::Error::new(io::ErrorKind::Other, "boom"));
        Outcome::create(&artifact(name), Some(&raised), stage, "report.rs")
    }

    fn reporter(style: OutputStyle) -> (Reporter, Buffer) {
        let buffer = Buffer::default();
        let reporter = Reporter::new(style)
            .with_no_color(true)
            .with_writer(buffer.clone());
        (reporter, buffer)
    }

    #[test]
    fn test_reporter_all_pass() {
        let (reporter, buffer) = reporter(OutputStyle::Dot);
        reporter.log(make_pass("test_one"));
        reporter.log(make_pass("test_two"));

        assert_eq!(reporter.finalize(Duration::from_millis(12)), 0);
        let output = buffer.contents();
        assert!(output.starts_with(".."));
        assert!(output.contains("Total: 2, Passed: 2, Failed: 0, Errored: 0, Inconclusive: 0, Skipped: 0"));
        assert!(output.contains("Success Rate: 1.0\nFailure Rate: 0.0"));
        assert!(output.contains("Duration: 0d 0h 0m 0s 12ms"));
    }

    #[test]
    fn test_reporter_with_failures() {
        let (reporter, buffer) = reporter(OutputStyle::Dot);
        reporter.log(make_pass("test_pass"));
        reporter.log(make_fail("test_fail", "assertion failed"));

        assert_eq!(reporter.finalize(Duration::ZERO), 1);
        let output = buffer.contents();
        assert!(output.starts_with(".F"));
        assert!(output.contains("Total: 2, Passed: 1, Failed: 1"));
        assert!(output.contains("Test: test_fail()\nState: Failure"));
        assert!(output.contains("Error Message: assertion failed"));
        assert!(output.contains("Success Rate: 0.50\nFailure Rate: 0.50"));
    }

    #[test]
    fn test_dot_symbols_per_state() {
        let (reporter, buffer) = reporter(OutputStyle::Dot);
        reporter.log(make_pass("a"));
        reporter.log(make_error("b", Stage::Setup));
        reporter.log(make_fail("c", "nope"));
        assert_eq!(buffer.contents(), ".EF");
        assert_eq!(reporter.summary().errored, 1);
    }

    #[test]
    fn test_plain_mode_reports_only_failures() {
        let (reporter, buffer) = reporter(OutputStyle::Plain);
        reporter.log(make_pass("quiet"));
        assert_eq!(buffer.contents(), "");

        reporter.log(make_error("loud", Stage::Teardown));
        let output = buffer.contents();
        assert!(output.contains("File: report.rs\nTest: loud()\nState: TeardownError\nDuration: 0ms"));
        assert!(output.contains("Error Message: boom"));
    }

    #[test]
    fn test_plain_finalize_skips_failure_recap() {
        let (reporter, buffer) = reporter(OutputStyle::Plain);
        reporter.log(make_fail("once", "nope"));
        let before = buffer.contents().matches("Test: once()").count();

        reporter.finalize(Duration::ZERO);
        let after = buffer.contents().matches("Test: once()").count();
        assert_eq!(before, after);
    }

    #[test]
    fn test_json_mode() {
        let (reporter, buffer) = reporter(OutputStyle::Json);
        reporter.log(make_pass("a"));
        reporter.log(make_fail("b", "nope"));
        assert_eq!(buffer.contents(), "");

        assert_eq!(reporter.finalize(Duration::from_millis(5)), 1);
        let document: serde_json::Value = serde_json::from_str(buffer.contents().trim()).unwrap();
        assert_eq!(document["tests"], 2);
        assert_eq!(document["failed"], 1);
        assert_eq!(document["duration_ms"], 5);
        assert_eq!(document["results"][1]["name"], "b()");
        assert_eq!(document["results"][1]["state"], "Failure");
    }

    #[test]
    fn test_reporter_empty() {
        let (reporter, buffer) = reporter(OutputStyle::Dot);
        assert_eq!(reporter.finalize(Duration::ZERO), 0);
        assert!(buffer.contents().contains("Total: 0, Passed: 0"));
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(0, 0), "0.0");
        assert_eq!(ratio(0, 3), "0.0");
        assert_eq!(ratio(3, 3), "1.0");
        assert_eq!(ratio(1, 3), "0.33");
        assert_eq!(ratio(2, 3), "0.67");
        assert_eq!(ratio(1, 4), "0.25");
        assert_eq!(ratio(1, 2), "0.50");
        assert_eq!(ratio(200, 201), "0.99");
        assert_eq!(ratio(1, 201), "0.01");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0d 0h 0m 0s 0ms");
        assert_eq!(
            format_duration(Duration::from_millis(90_061_001)),
            "1d 1h 1m 1s 1ms"
        );
    }

    #[test]
    fn test_summary_exit_code() {
        let outcomes = vec![make_pass("a"), make_error("b", Stage::TestFixtureSetup)];
        let summary = Summary::from_outcomes(&outcomes);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(Summary::from_outcomes(&outcomes[..1]).exit_code(), 0);
    }

    proptest! {
        #[test]
        fn prop_ratio_stays_in_unit_interval(total in 1usize..10_000, value in 0usize..10_000) {
            prop_assume!(value <= total);
            let rate: f64 = ratio(value, total).parse().unwrap();
            prop_assert!((0.0..=1.0).contains(&rate));
        }

        #[test]
        fn prop_format_duration_keeps_every_millisecond(ms in 0u64..1_000_000_000) {
            let text = format_duration(Duration::from_millis(ms));
            let parts: Vec<u64> = text
                .split_whitespace()
                .map(|part| part.trim_end_matches(char::is_alphabetic).parse().unwrap())
                .collect();
            let total = (((parts[0] * 24 + parts[1]) * 60 + parts[2]) * 60 + parts[3]) * 1000 + parts[4];
            prop_assert_eq!(total, ms);
        }
    }
}
