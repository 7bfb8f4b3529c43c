//! Shaping replies into messages Telegram accepts.

/// Longest text a single `sendMessage` may carry.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Sent instead of an empty reply, which Telegram would reject.
pub const EMPTY_REPLY: &str = "(no output)";

/// Splits `text` into sendable chunks.
///
/// Chunks break after the last newline that fits, or hard at the limit when a
/// single line is longer than that. Concatenating the chunks yields `text`.
#[must_use]
pub fn split_message(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![EMPTY_REPLY.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while let Some((limit, _)) = rest.char_indices().nth(MAX_MESSAGE_CHARS) {
        let (window, _) = rest.split_at(limit);
        let cut = window.rfind('\n').map_or(limit, |newline| newline + 1);
        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk.to_owned());
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest.to_owned());
    }
    chunks
}
