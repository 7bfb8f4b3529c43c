//! Library entry for the `tele_rpi_bot` binary.
//!
//! Exposes `inner_main` so the workspace-level shim binary can call into the bot.
//!
//! Provides commands to run the Telegram bot or install it as a service.
#![cfg_attr(
    test,
    expect(
        clippy::indexing_slicing,
        clippy::unwrap_used,
        reason = "This is not problematic in tests",
    )
)]

extern crate alloc;
extern crate core;

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod host;
#[cfg(target_os = "linux")]
pub mod install;
pub mod logging;
pub mod run;
pub mod stack;
pub mod telegram;
#[cfg(test)]
mod testing;

use std::sync::Once;

use eyre::Result;

use cli::{Cli, Command};

static INIT_RUSTLS: Once = Once::new();

/// The bot's main function; can be called from a shim binary.
///
/// # Errors
///
/// Returns an error if installation fails or the bot cannot start.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    match invocation.command {
        Command::Run(args) => run::start(args).await,
        #[cfg(target_os = "linux")]
        Command::Install(args) => install::setup(&args),
    }
}

/// Installs the OpenSSL-backed rustls provider used by reqwest.
pub(crate) fn install_crypto_provider() {
    INIT_RUSTLS.call_once(|| {
        // an already installed provider serves equally well
        drop(rustls_openssl::default_provider().install_default());
    });
}
