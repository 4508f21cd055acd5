//! Completion signal handed to every test body and hook

use crate::error::{TestError, TestResult};
use tokio::sync::oneshot;

/// One-shot completion signal
///
/// A body or hook reports completion by consuming its `Done`. Dropping it
/// without a call is reported as [`TestError::Abandoned`]. The signal is
/// `Send`, so completion can be reported from a spawned task or thread.
#[derive(Debug)]
pub struct Done {
    tx: oneshot::Sender<TestResult>,
}

/// Receiving half held by the runner
pub(crate) type Completion = oneshot::Receiver<TestResult>;

impl Done {
    pub(crate) fn channel() -> (Done, Completion) {
        let (tx, rx) = oneshot::channel();
        (Done { tx }, rx)
    }

    /// Signal successful completion
    pub fn pass(self) {
        self.complete(Ok(()));
    }

    /// Signal completion with an error
    pub fn fail(self, error: impl Into<TestError>) {
        self.complete(Err(error.into()));
    }

    /// Signal completion with a ready-made result
    pub fn complete(self, result: TestResult) {
        // The runner may have stopped listening after a timeout
        let _ = self.tx.send(result);
    }
}
