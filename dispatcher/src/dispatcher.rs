//! Routing of inbound text to command handlers.

use alloc::sync::Arc;
use std::collections::HashMap;

use tele_rpi_bot_common::{CommandRunner, Invocation};
use tracing::{debug, info};

use crate::{
    commands::Command,
    config::BotConfig,
    handlers::{self, HandlerContext},
};

/// A text message as seen by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender's username; empty when the account has none.
    pub sender: String,
    pub text: String,
}

/// What to send back, and what to run once it has been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Ask the client to open a reply field.
    pub force_reply: bool,
    /// Runs only after `text` was handed to the transport.
    pub deferred: Option<Invocation>,
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            force_reply: false,
            deferred: None,
        }
    }

    #[must_use]
    pub fn prompting(text: impl Into<String>) -> Self {
        Self {
            force_reply: true,
            ..Self::text(text)
        }
    }

    /// Schedules `invocation` to run after this reply is delivered.
    #[must_use]
    pub fn then(mut self, invocation: Invocation) -> Self {
        self.deferred = Some(invocation);
        self
    }
}

/// Where a message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    Echo,
}

/// Exact-match table from command token to [`Command`].
#[derive(Debug, Clone)]
pub struct Router {
    routes: HashMap<&'static str, Command>,
    bot_username: Option<String>,
}

impl Router {
    /// `bot_username` enables the `/command@bot_username` form used in groups.
    #[must_use]
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            routes: Command::ALL
                .iter()
                .map(|&command| (command.token(), command))
                .collect(),
            bot_username,
        }
    }

    /// Matches the whole text against the command tokens.
    ///
    /// Matching is case-sensitive and nothing is trimmed; anything else,
    /// including unknown `/words`, is echoed.
    #[must_use]
    pub fn resolve(&self, text: &str) -> Route {
        self.routes
            .get(self.strip_mention(text))
            .copied()
            .map_or(Route::Echo, Route::Command)
    }

    fn strip_mention<'text>(&self, text: &'text str) -> &'text str {
        if let Some(bot) = self.bot_username.as_deref()
            && let Some((command, mention)) = text.split_once('@')
            && mention.eq_ignore_ascii_case(bot)
        {
            command
        } else {
            text
        }
    }
}

/// Routes inbound messages and runs the matching handler.
pub struct Dispatcher {
    router: Router,
    context: HandlerContext,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(router: Router, context: HandlerContext) -> Self {
        Self { router, context }
    }

    #[must_use]
    pub fn from_config(
        config: &BotConfig,
        runner: Arc<dyn CommandRunner>,
        bot_username: Option<String>,
    ) -> Self {
        Self::new(
            Router::new(bot_username),
            HandlerContext::from_config(config, runner),
        )
    }

    /// Produces the reply for one message. Never fails: errors become reply text.
    #[tracing::instrument(skip_all, fields(sender = %message.sender))]
    pub async fn dispatch(&self, message: &InboundMessage) -> Reply {
        match self.router.resolve(&message.text) {
            Route::Command(command) => {
                info!(%command, "Handling command");
                handlers::handle(command, &self.context, message).await
            }
            Route::Echo => {
                debug!("Echoing free text");
                handlers::echo(message)
            }
        }
    }

    /// Runs the deferred part of a reply.
    ///
    /// # Errors
    ///
    /// Returns the text to report back if the invocation failed.
    pub async fn run_deferred(&self, invocation: &Invocation) -> Result<(), String> {
        handlers::run_deferred(&self.context, invocation).await
    }
}
