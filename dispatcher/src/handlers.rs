//! One handler per bot command.
//!
//! Privileged commands pass the allow-list gate before anything runs. Handlers
//! that wait on a host process suspend only the calling chat's task.

use alloc::sync::Arc;

use tele_rpi_bot_common::{CommandRunner, Invocation, ProcessError};
use tracing::{info, warn};

use crate::{
    auth::{AllowList, is_authorized},
    commands::{Command, help_text},
    config::BotConfig,
    dispatcher::{InboundMessage, Reply},
    host::HostPower,
    stack::ServiceStack,
};

pub const DENIED: &str = "You are not authorized to perform this action.";
pub const SHUTDOWN_ACK: &str = "Shutting down Raspberry Pi...";
pub const RESTART_ACK: &str = "Restarting Raspberry Pi...";
pub const STACK_STARTED: &str = "Successfully started Immich services.";
pub const STACK_STOPPED: &str = "Successfully stopped Immich services.";

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct HandlerContext {
    pub allow_list: AllowList,
    pub host: HostPower,
    pub stack: ServiceStack,
    pub runner: Arc<dyn CommandRunner>,
}

impl HandlerContext {
    #[must_use]
    pub fn from_config(config: &BotConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            allow_list: config.allow_list.clone(),
            host: config.host,
            stack: config.stack.clone(),
            runner,
        }
    }
}

/// Runs the handler for `command` on behalf of `message.sender`.
pub async fn handle(command: Command, ctx: &HandlerContext, message: &InboundMessage) -> Reply {
    if command.is_privileged() && !is_authorized(&message.sender, &ctx.allow_list) {
        info!(sender = %message.sender, %command, "Denied privileged command");
        return Reply::text(DENIED);
    }

    match command {
        Command::Start => start(&message.sender),
        Command::Help => Reply::text(help_text()),
        Command::Shutdown => Reply::text(SHUTDOWN_ACK).then(ctx.host.shutdown()),
        Command::Restart => Reply::text(RESTART_ACK).then(ctx.host.reboot()),
        Command::ImmichStatus => {
            let status = ctx.stack.status();
            match ctx.runner.run(&status).await {
                Ok(stdout) => Reply::text(stdout),
                Err(e) => Reply::text(report_failure(&status, &e)),
            }
        }
        Command::ImmichUp => change_stack(ctx, ctx.stack.up(), STACK_STARTED).await,
        Command::ImmichDown => change_stack(ctx, ctx.stack.down(), STACK_STOPPED).await,
    }
}

/// Greets the sender and lists the commands, prompting for a reply.
#[must_use]
pub fn start(sender: &str) -> Reply {
    Reply::prompting(format!(
        "Hi {sender}!\nWelcome to Telegram RPi Bot!\n{}",
        help_text()
    ))
}

/// Replies with the received text unchanged.
#[must_use]
pub fn echo(message: &InboundMessage) -> Reply {
    Reply::text(message.text.clone())
}

async fn change_stack(ctx: &HandlerContext, invocation: Invocation, success: &str) -> Reply {
    match ctx.runner.run(&invocation).await {
        Ok(_) => Reply::text(success),
        Err(e) => Reply::text(report_failure(&invocation, &e)),
    }
}

/// Runs an invocation that was deferred until after its acknowledgement.
///
/// # Errors
///
/// Returns the failure text to send as a follow-up message.
pub async fn run_deferred(ctx: &HandlerContext, invocation: &Invocation) -> Result<(), String> {
    info!(%invocation, "Running deferred host command");
    ctx.runner
        .run(invocation)
        .await
        .map(drop)
        .map_err(|e| report_failure(invocation, &e))
}

fn report_failure(invocation: &Invocation, error: &ProcessError) -> String {
    warn!(%invocation, error = %error, "Host command failed");
    failure_reply(error)
}

/// Text sent to the user for a failed invocation.
///
/// A non-zero exit yields `Error: <stderr>`, whatever the program wrote to stdout.
#[must_use]
pub fn failure_reply(error: &ProcessError) -> String {
    match *error {
        ProcessError::Failed { ref stderr, .. } => format!("Error: {stderr}"),
        _ => format!("Error: {error}"),
    }
}
