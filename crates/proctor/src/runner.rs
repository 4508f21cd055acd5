//! Test runner - execute one file's hooks and tests

use crate::artifact::TestArtifact;
use crate::assert::Assert;
use crate::error::{TestError, TestResult};
use crate::outcome::Outcome;
use crate::registry::FileRegistry;
use crate::reporter::Reporter;
use crate::signal::Done;
use crate::state::Stage;
use futures_util::future::join_all;
use proctor_config::ExecutionMode;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// How a body or hook invocation ended
#[derive(Debug)]
enum Settled {
    /// Returned `Ok` and signalled a pass
    Completed,
    /// Returned `Ok` but signalled a failure, was abandoned or timed out
    Signalled(TestError),
    /// Returned `Err` or panicked; the signal is ignored
    Raised(TestError),
}

impl Settled {
    fn into_error(self) -> Option<TestError> {
        match self {
            Settled::Completed => None,
            Settled::Signalled(error) | Settled::Raised(error) => Some(error),
        }
    }
}

/// Invoke a body or hook and wait for it to finish
async fn settle<F>(invoke: F, timeout: Option<Duration>) -> Settled
where
    F: FnOnce(Done) -> TestResult,
{
    let (done, completion) = Done::channel();

    match panic::catch_unwind(AssertUnwindSafe(|| invoke(done))) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => return Settled::Raised(error),
        Err(payload) => return Settled::Raised(TestError::Panicked(panic_message(payload))),
    }

    let signal = match timeout {
        Some(limit) => match tokio::time::timeout(limit, completion).await {
            Ok(signal) => signal,
            Err(_) => return Settled::Signalled(TestError::TimedOut(limit)),
        },
        None => completion.await,
    };

    match signal {
        Ok(Ok(())) => Settled::Completed,
        Ok(Err(error)) => Settled::Signalled(error),
        Err(_) => Settled::Signalled(TestError::Abandoned),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Test panicked".to_string()
    }
}

/// Executes files against a reporter
pub struct TestRunner<'r> {
    reporter: &'r Reporter,
    /// Applies to every hook and body invocation
    timeout: Option<Duration>,
    /// Replaces each file's own execution mode
    mode: Option<ExecutionMode>,
}

impl<'r> TestRunner<'r> {
    pub fn new(reporter: &'r Reporter) -> Self {
        Self {
            reporter,
            timeout: None,
            mode: None,
        }
    }

    /// Set the timeout for every hook and body
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the execution mode of every file
    pub fn with_mode(mut self, mode: Option<ExecutionMode>) -> Self {
        self.mode = mode;
        self
    }

    /// Run setup, the async group, the sync group and teardown of one file
    #[tracing::instrument(skip_all, fields(file = %registry.file()))]
    pub async fn run_file(&self, registry: &FileRegistry) {
        let mode = self.mode.unwrap_or(registry.mode());
        let (async_group, sync_group) = registry.partition(mode);
        tracing::debug!(
            %mode,
            async_tests = async_group.len(),
            sync_tests = sync_group.len(),
            "running file"
        );

        let setup_error = match &registry.setup {
            Some(hook) => settle(|done| hook(Assert::new(), done), self.timeout)
                .await
                .into_error(),
            None => None,
        };
        if let Some(error) = &setup_error {
            tracing::debug!(%error, "setup failed, failing every test of the file");
        }

        join_all(
            async_group
                .iter()
                .map(|test| self.run_test(registry, test, setup_error.as_ref())),
        )
        .await;

        for test in sync_group {
            self.run_test(registry, test, setup_error.as_ref()).await;
        }

        if let Some(hook) = &registry.teardown {
            if let Some(error) = settle(|done| hook(done), self.timeout).await.into_error() {
                tracing::warn!(file = registry.file(), %error, "teardown failed");
                self.reporter.log_teardown_failure(registry.file(), &error);
            }
        }
    }

    /// Run one test instance and log its outcome
    async fn run_test(
        &self,
        registry: &FileRegistry,
        test: &TestArtifact,
        setup_error: Option<&TestError>,
    ) {
        if let Some(error) = setup_error {
            let outcome = Outcome::create(test, Some(error), Stage::TestFixtureSetup, registry.file());
            self.reporter.log(outcome);
            return;
        }

        let start = Instant::now();

        let setup_each_error = match &registry.setup_each {
            Some(hook) => settle(|done| hook(Assert::new(), done), self.timeout)
                .await
                .into_error(),
            None => None,
        };

        let (raised, stage) = match setup_each_error {
            Some(error) => (Some(error), Stage::Setup),
            None => (self.run_body(test).await, Stage::Test),
        };

        let mut outcome = Outcome::create(test, raised.as_ref(), stage, registry.file());

        if let Some(hook) = &registry.teardown_each {
            let teardown_error = settle(|done| hook(Assert::new(), &outcome, done), self.timeout)
                .await
                .into_error();
            if let Some(error) = teardown_error {
                outcome = Outcome::create(test, Some(&error), Stage::Teardown, registry.file());
            }
        }

        let outcome = outcome.with_duration(start.elapsed());
        tracing::trace!(test = test.name(), state = %outcome.state(), "test finished");
        self.reporter.log(outcome);
    }

    /// Invoke the body, applying the expected-throw descriptor to raised values
    async fn run_body(&self, test: &TestArtifact) -> Option<TestError> {
        let settled = settle(
            |done| (test.body)(Assert::new(), done, test.case_value()),
            self.timeout,
        )
        .await;

        match settled {
            Settled::Completed => None,
            Settled::Signalled(error) => Some(error),
            Settled::Raised(error) => match &test.options.throws {
                Some(throws) if throws.matches(&error) => {
                    tracing::trace!(test = test.name(), ?throws, "expected error raised");
                    None
                }
                _ => Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_settle_completed() {
        let settled = settle(
            |done| {
                done.pass();
                Ok(())
            },
            None,
        )
        .await;
        assert!(matches!(settled, Settled::Completed));
    }

    #[tokio::test]
    async fn test_settle_signalled_failure() {
        let settled = settle(
            |done| {
                done.fail("late failure");
                Ok(())
            },
            None,
        )
        .await;
        assert!(matches!(settled, Settled::Signalled(TestError::Message(ref m)) if m == "late failure"));
    }

    #[tokio::test]
    async fn test_settle_raise_wins_over_signal() {
        let settled = settle(
            |done| {
                done.pass();
                Err(TestError::from("raised anyway"))
            },
            None,
        )
        .await;
        assert!(matches!(settled, Settled::Raised(TestError::Message(_))));
    }

    #[tokio::test]
    async fn test_settle_panic() {
        let settled = settle(|_done| panic!("kaboom"), None).await;
        match settled {
            Settled::Raised(TestError::Panicked(message)) => assert_eq!(message, "kaboom"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_settle_abandoned() {
        let settled = settle(|_done| Ok(()), None).await;
        assert!(matches!(settled, Settled::Signalled(TestError::Abandoned)));
    }

    #[tokio::test]
    async fn test_settle_timeout() {
        let mut parked = None;
        let settled = settle(
            |done| {
                parked = Some(done);
                Ok(())
            },
            Some(Duration::from_millis(20)),
        )
        .await;
        assert!(matches!(settled, Settled::Signalled(TestError::TimedOut(_))));
        drop(parked);
    }

    #[tokio::test]
    async fn test_settle_signal_from_spawned_task() {
        let settled = settle(
            |done| {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    done.pass();
                });
                Ok(())
            },
            None,
        )
        .await;
        assert!(matches!(settled, Settled::Completed));
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "Test panicked");
    }
}
