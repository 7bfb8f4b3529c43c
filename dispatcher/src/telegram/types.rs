//! Serde types for the subset of the Telegram Bot API the bot uses.
//!
//! Unknown fields are ignored; everything the bot does not strictly need is optional.

use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub description: Option<String>,
    pub result: Option<T>,
}

/// An entry of the `getUpdates` result.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Result of `getMe`.
#[derive(Debug, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub username: Option<String>,
}

/// Result of `sendMessage`; only the id is of interest.
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Asks the client to open a reply field for the addressed user.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ForceReply {
    pub force_reply: bool,
    pub selective: bool,
}

impl ForceReply {
    /// Forced reply shown only to the mentioned or replied-to user.
    #[must_use]
    pub const fn selective() -> Self {
        Self {
            force_reply: true,
            selective: true,
        }
    }
}

/// Body of a `sendMessage` request.
#[derive(Debug, Serialize)]
pub struct SendMessage<'text> {
    pub chat_id: i64,
    pub text: &'text str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ForceReply>,
}

/// Body of a `getUpdates` request.
#[derive(Debug, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}
