//! Raw HTTP calls to the Telegram Bot API.
//!
//! Wraps reqwest for `getMe`, `getUpdates` and `sendMessage`. All methods return
//! typed results; `ok: false` responses become [`TelegramError::Api`].

use core::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error as ThisError;
use tracing::debug;

use super::types::{
    ApiResponse, BotUser, ForceReply, GetUpdates, SendMessage, SentMessage, Update,
};

/// Deadline for calls that do not long-poll.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Extra time granted to `getUpdates` on top of the long-poll timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Failures talking to the Bot API.
#[derive(Debug, ThisError)]
pub enum TelegramError {
    /// Transport or decoding failure. The URL is stripped since it contains the token.
    #[error("request to the Bot API failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("`{method}` was rejected: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
}

impl From<reqwest::Error> for TelegramError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.without_url())
    }
}

/// Low-level Bot API client for a single bot token.
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    /// Creates a client talking to `api_url`, normally `https://api.telegram.org`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(token: &SecretString, api_url: &str) -> Result<Self, TelegramError> {
        crate::install_crypto_provider();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                api_url.trim_end_matches('/'),
                token.expose_secret()
            ),
        })
    }

    async fn call<B, T>(
        &self,
        method: &'static str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .timeout(timeout)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Api {
                method,
                description: response.description.unwrap_or_default(),
            });
        }
        response.result.ok_or_else(|| TelegramError::Api {
            method,
            description: "response carried no result".to_owned(),
        })
    }

    /// Identifies the bot; doubles as a token check at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    pub async fn get_me(&self) -> Result<BotUser, TelegramError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Long-polls for new updates.
    ///
    /// `offset` should be `last_update_id + 1` to acknowledge everything seen so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &body, poll_timeout + POLL_GRACE)
            .await
    }

    /// Sends `text` to `chat_id` and returns the new message's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<ForceReply>,
    ) -> Result<i64, TelegramError> {
        debug!(chat_id, chars = text.chars().count(), "sendMessage");
        let body = SendMessage {
            chat_id,
            text,
            reply_markup,
        };
        let sent: SentMessage = self.call("sendMessage", &body, REQUEST_TIMEOUT).await?;
        Ok(sent.message_id)
    }
}
