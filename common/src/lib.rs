//! Common utilities for running host commands and managing the bot's system service.
//!
//! This crate provides:
//! - A subprocess runner with buffered output, optional timeout and privilege elevation
//! - Linux service installation helpers
#![cfg_attr(
    test,
    expect(clippy::unwrap_used, reason = "Panicking is how tests fail")
)]

extern crate alloc;
extern crate core;

pub mod process;
mod service_install;

pub use process::{CommandRunner, Invocation, ProcessError, SystemRunner};
pub use service_install::*;
