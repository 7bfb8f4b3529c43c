//! Telegram transport: long-polls for updates and relays dispatcher replies.
//!
//! Messages are processed by one worker task per chat, so a slow host command
//! delays only later messages of the same chat.

pub mod api;
pub mod outbound;
pub mod types;
mod workers;

use alloc::sync::Arc;
use core::{pin::pin, time::Duration};

use eyre::WrapErr as _;
use tele_rpi_bot_common::CommandRunner;
use tokio::time;
use tracing::{debug, info, warn};

pub use api::{TelegramApi, TelegramError};
use types::Update;
pub use workers::{IDLE_TIMEOUT, Outbox};
use workers::ChatWorkers;

use crate::{
    config::BotConfig,
    dispatcher::{Dispatcher, InboundMessage},
};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Connects to the Bot API and serves updates until `shutdown` resolves.
///
/// On shutdown, messages already received are still answered before returning.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or `getMe` fails.
pub async fn run(
    config: &BotConfig,
    runner: Arc<dyn CommandRunner>,
    shutdown: impl Future<Output = ()>,
) -> eyre::Result<()> {
    let api = Arc::new(
        TelegramApi::new(&config.token, &config.api_url)
            .wrap_err("Failed to create the HTTP client")?,
    );
    let me = api
        .get_me()
        .await
        .wrap_err("Failed to reach the Telegram Bot API, check the token")?;
    info!(bot_id = me.id, username = ?me.username, "Connected to Telegram");

    let dispatcher = Arc::new(Dispatcher::from_config(config, runner, me.username));
    let mut workers = ChatWorkers::new(
        Arc::clone(&api) as Arc<dyn Outbox>,
        dispatcher,
        IDLE_TIMEOUT,
    );

    poll(&api, &mut workers, config.poll_timeout, shutdown).await;

    info!("Waiting for in-flight messages");
    workers.drain().await;
    Ok(())
}

async fn poll(
    api: &TelegramApi,
    workers: &mut ChatWorkers,
    poll_timeout: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut shutdown = pin!(shutdown);
    let mut offset = None;
    let mut backoff = INITIAL_BACKOFF;

    info!("Polling for updates");
    loop {
        let polled = tokio::select! {
            polled = api.get_updates(offset, poll_timeout) => polled,
            () = &mut shutdown => {
                info!("Received shutdown, stopping poller");
                return;
            }
        };

        match polled {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                for update in updates {
                    offset = Some(update.update_id + 1);
                    if let Some((chat_id, message)) = inbound(update) {
                        workers.submit(chat_id, message);
                    }
                }
                workers.reap();
            }
            Err(e) => {
                warn!(error = %e, ?backoff, "getUpdates failed, retrying");
                tokio::select! {
                    () = time::sleep(backoff) => {}
                    () = &mut shutdown => {
                        info!("Received shutdown, stopping poller");
                        return;
                    }
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

/// Extracts the chat and text of a message update; other updates are skipped.
fn inbound(update: Update) -> Option<(i64, InboundMessage)> {
    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "Skipping update without message");
        return None;
    };
    let Some(text) = message.text else {
        debug!(update_id = update.update_id, "Skipping message without text");
        return None;
    };
    let sender = message
        .from
        .and_then(|user| user.username)
        .unwrap_or_default();
    Some((message.chat.id, InboundMessage { sender, text }))
}
