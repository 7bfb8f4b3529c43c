//! The Immich service stack, driven through `docker compose`.

use std::path::{Path, PathBuf};

use tele_rpi_bot_common::Invocation;

/// Go template passed to `docker compose ps`; the separator is a literal tab.
pub const STATUS_FORMAT: &str = "table {{.Name}}\t{{.Status}}";

/// Location of the compose project and the invocations that operate on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStack {
    dir: PathBuf,
}

impl ServiceStack {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the compose descriptor.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Container names and states.
    #[must_use]
    pub fn status(&self) -> Invocation {
        self.compose(["ps", "--format", STATUS_FORMAT])
    }

    /// Starts all services detached.
    #[must_use]
    pub fn up(&self) -> Invocation {
        self.compose(["up", "-d"])
    }

    /// Stops and removes all services.
    #[must_use]
    pub fn down(&self) -> Invocation {
        self.compose(["down"])
    }

    fn compose<const N: usize>(&self, args: [&str; N]) -> Invocation {
        Invocation::new("docker")
            .arg("compose")
            .args(args)
            .current_dir(&self.dir)
    }
}
