//! Host power primitives.

use tele_rpi_bot_common::Invocation;

/// Builds the shutdown and reboot invocations for this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPower {
    use_sudo: bool,
}

impl HostPower {
    /// With `use_sudo`, both primitives run through `sudo`.
    #[must_use]
    pub const fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    /// `shutdown -h now`
    #[must_use]
    pub fn shutdown(self) -> Invocation {
        Invocation::new("shutdown")
            .args(["-h", "now"])
            .elevated(self.use_sudo)
    }

    /// `reboot`
    #[must_use]
    pub fn reboot(self) -> Invocation {
        Invocation::new("reboot").elevated(self.use_sudo)
    }
}
