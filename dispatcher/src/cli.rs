//! Command-line interface definitions for the bot.
//!
//! Every option of the `run` subcommand can also be supplied through the
//! environment, which is how the systemd unit configures the service.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[cfg(target_os = "linux")]
use crate::install;
use crate::logging::LogFormat;

/// Name of the installed binary and of its systemd unit.
pub const BINARY_NAME: &str = "tele_rpi_bot";

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = BINARY_NAME)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to Telegram and answer commands until terminated.
    Run(RunArgs),

    #[cfg(target_os = "linux")]
    /// Install the bot as a systemd service that starts on boot.
    Install(install::Args),
}

/// Arguments for the `run` subcommand.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Telegram bot token as issued by @BotFather.
    #[arg(long, env = "BOT_TELEGRAM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Comma-separated Telegram usernames allowed to run privileged commands.
    #[arg(long, env = "BOT_VALID_USERS", value_delimiter = ',')]
    pub valid_users: Vec<String>,

    /// Directory containing the Immich `docker compose` project.
    #[arg(long, env = "IMMICH_DIR_PATH", default_value = ".")]
    pub immich_dir: PathBuf,

    /// File that log output is appended to, in addition to the console.
    #[arg(long, env = "BOT_LOG_FILE", default_value = "tele_rpi_bot.log")]
    pub log_file: PathBuf,

    /// Console log format.
    #[arg(long, value_enum, default_value_t)]
    pub log_format: LogFormat,

    /// Seconds after which a host command is killed. 0, the default, waits
    /// indefinitely, since `docker compose up` may pull images for a long time.
    #[arg(long, env = "BOT_COMMAND_TIMEOUT", default_value_t = 0)]
    pub command_timeout: u64,

    /// Seconds a single `getUpdates` long poll may wait for new messages.
    #[arg(long, default_value_t = 30)]
    pub poll_timeout: u64,

    /// Never prefix shutdown/reboot with sudo, even when not running as root.
    #[arg(long)]
    pub no_sudo: bool,

    /// Base URL of the Bot API, for self-hosted API servers and tests.
    #[arg(
        long,
        env = "BOT_API_URL",
        default_value = "https://api.telegram.org",
        hide = true
    )]
    pub api_url: String,
}
