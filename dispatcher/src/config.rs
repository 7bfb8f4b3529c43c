//! Runtime configuration, resolved once at start and shared read-only afterwards.

use core::time::Duration;
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error as ThisError;

use crate::{
    auth::AllowList, cli::RunArgs, host::HostPower, logging::LogFormat, stack::ServiceStack,
};

/// Everything the bot needs after startup.
#[derive(Debug)]
pub struct BotConfig {
    /// Bot API token, only exposed when building request URLs.
    pub token: SecretString,
    pub allow_list: AllowList,
    pub stack: ServiceStack,
    pub host: HostPower,
    /// `None` lets host commands run indefinitely.
    pub command_timeout: Option<Duration>,
    pub poll_timeout: Duration,
    pub api_url: String,
    pub log: LogSettings,
}

/// Where and how log output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub file: PathBuf,
    pub format: LogFormat,
}

/// Configuration problems that prevent the bot from starting.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No bot token configured: set BOT_TELEGRAM_TOKEN or pass --token")]
    MissingToken,
}

impl BotConfig {
    /// Resolves parsed arguments into the runtime configuration.
    ///
    /// Host primitives go through sudo unless `running_as_root` or `--no-sudo`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] if the token is unset or empty.
    pub fn from_args(args: RunArgs, running_as_root: bool) -> Result<Self, ConfigError> {
        let token = args
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            token: SecretString::from(token),
            allow_list: args.valid_users.into_iter().collect(),
            stack: ServiceStack::new(args.immich_dir),
            host: HostPower::new(!args.no_sudo && !running_as_root),
            command_timeout: (args.command_timeout > 0)
                .then(|| Duration::from_secs(args.command_timeout)),
            poll_timeout: Duration::from_secs(args.poll_timeout),
            api_url: args.api_url,
            log: LogSettings {
                file: args.log_file,
                format: args.log_format,
            },
        })
    }
}
