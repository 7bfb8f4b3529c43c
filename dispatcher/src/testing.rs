//! Test doubles shared by the unit tests.

use alloc::{collections::VecDeque, sync::Arc};
use std::sync::Mutex;

use futures::future::BoxFuture;
use tele_rpi_bot_common::{CommandRunner, Invocation, ProcessError};

/// Records invocations and answers them from a queue of scripted outcomes.
///
/// Once the queue is empty every invocation succeeds with empty output.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    outcomes: Mutex<VecDeque<Result<String, ProcessError>>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_ok(&self, stdout: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(stdout.to_owned()));
    }

    pub(crate) fn push_failure(&self, stdout: &str, stderr: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(ProcessError::Failed {
                code: Some(1),
                stdout: stdout.to_owned(),
                stderr: stderr.to_owned(),
            }));
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'run>(
        &'run self,
        invocation: &'run Invocation,
    ) -> BoxFuture<'run, Result<String, ProcessError>> {
        self.calls.lock().unwrap().push(invocation.clone());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()));
        Box::pin(async move { outcome })
    }
}
