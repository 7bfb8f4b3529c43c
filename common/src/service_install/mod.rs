//! Utilities to detect the host's service manager and register the bot with it.

#[cfg(target_os = "linux")]
pub mod systemd;

use std::{io, path::Path};

use thiserror::Error as ThisError;

/// Errors raised while installing or starting the bot's service.
#[derive(Debug, ThisError)]
pub enum InstallError {
    #[error("You must run this command as root or with sudo.")]
    NotSuperuser,
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },
}

impl InstallError {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}

/// Returns `true` if the current process is running as superuser (root).
#[cfg(unix)]
#[must_use]
pub fn is_superuser() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Returns `true` if the system uses systemd (detects `/run/systemd/system`).
#[must_use]
pub fn is_systemd() -> bool {
    Path::new("/run/systemd/system").exists()
}
