//! Startup of the bot and process signal handling.

use alloc::sync::Arc;
use std::process;

use tele_rpi_bot_common::{CommandRunner, SystemRunner};
use tokio::signal;
use tracing::{Instrument as _, info, info_span, warn};

use crate::{cli::RunArgs, config::BotConfig, logging, telegram};

/// Resolves on SIGTERM or Ctrl-C.
pub(crate) async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    result = signal::ctrl_c() => drop(result),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, only Ctrl-C stops the bot");
                drop(signal::ctrl_c().await);
            }
        }
    }
    #[cfg(not(unix))]
    {
        drop(signal::ctrl_c().await);
    }
}

/// Resolves the configuration, sets up logging and serves Telegram until shutdown.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, the log file cannot be
/// opened, or the bot cannot connect at startup.
pub async fn start(args: RunArgs) -> eyre::Result<()> {
    #[cfg(unix)]
    let running_as_root = tele_rpi_bot_common::is_superuser();
    #[cfg(not(unix))]
    let running_as_root = false;

    let config = BotConfig::from_args(args, running_as_root)?;
    let _log_guard = logging::init(&config.log.file, config.log.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        immich_dir = %config.stack.dir().display(),
        allowed_users = config.allow_list.len(),
        log_file = %config.log.file.display(),
        "Starting bot"
    );
    if config.allow_list.is_empty() {
        warn!("No valid users configured, privileged commands are refused for everyone");
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(config.command_timeout));
    telegram::run(&config, runner, shutdown_signal())
        .instrument(info_span!("bot"))
        .await?;

    info!("Bot stopped");
    Ok(())
}
