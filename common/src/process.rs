//! Subprocess invocation for the bot's host actions.
//!
//! Every action that touches the host goes through a [`CommandRunner`].
//! [`SystemRunner`] is the production implementation on top of `tokio::process`;
//! the calling task waits for the child to exit and gets the fully buffered output.

use core::{fmt, time::Duration};
use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use futures::future::BoxFuture;
use thiserror::Error as ThisError;
use tokio::{process, time};
use tracing::debug;

/// Program used to run elevated invocations.
const SUDO: &str = "sudo";
/// Makes sudo fail instead of prompting when a password would be needed.
const SUDO_NON_INTERACTIVE: &str = "-n";

/// A fully described external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl Invocation {
    /// Creates an invocation of `program` without arguments in the current directory.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Appends a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the program in `dir` instead of the bot's working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Wraps the invocation in `sudo` when `use_sudo` is set.
    ///
    /// sudo runs non-interactively and the wrapped program follows its flag, so
    /// `shutdown -h now` turns into `sudo -n shutdown -h now`.
    #[must_use]
    pub fn elevated(self, use_sudo: bool) -> Self {
        if !use_sudo {
            return self;
        }
        let mut args = Vec::with_capacity(self.args.len() + 2);
        args.push(SUDO_NON_INTERACTIVE.to_owned());
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: SUDO.to_owned(),
            args,
            working_dir: self.working_dir,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Ways an invocation can fail.
///
/// The `Display` output of [`ProcessError::Failed`] is the captured stderr, verbatim.
#[derive(Debug, ThisError)]
pub enum ProcessError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to collect output of `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{stderr}")]
    Failed {
        /// Exit code, `None` if the process was killed by a signal.
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("`{program}` did not finish within {after:?}")]
    TimedOut { program: String, after: Duration },
}

/// Executes invocations and resolves them to their standard output.
///
/// Implementations must be shareable between concurrently running handlers.
pub trait CommandRunner: Send + Sync {
    /// Runs `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Failed`] for a non-zero exit status, and the other
    /// variants when the process could not be started, awaited or finished in time.
    fn run<'run>(
        &'run self,
        invocation: &'run Invocation,
    ) -> BoxFuture<'run, Result<String, ProcessError>>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Creates a runner. With a `timeout`, children still running after it are killed.
    #[must_use]
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    async fn execute(&self, invocation: &Invocation) -> Result<String, ProcessError> {
        let mut command = process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // dropping the wait future on timeout must not leave the child behind
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        debug!(%invocation, working_dir = ?invocation.working_dir, "Spawning process");
        let child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let waited = match self.timeout {
            Some(after) => time::timeout(after, child.wait_with_output())
                .await
                .map_err(|_elapsed| ProcessError::TimedOut {
                    program: invocation.program.clone(),
                    after,
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|source| ProcessError::Wait {
            program: invocation.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            debug!(%invocation, "Process finished successfully");
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!(%invocation, status = %output.status, "Process exited unsuccessfully");
        Err(ProcessError::Failed {
            code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

impl CommandRunner for SystemRunner {
    fn run<'run>(
        &'run self,
        invocation: &'run Invocation,
    ) -> BoxFuture<'run, Result<String, ProcessError>> {
        Box::pin(self.execute(invocation))
    }
}
