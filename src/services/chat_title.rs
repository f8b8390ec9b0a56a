//! Best-effort chat auto-titling.
//!
//! Once an assistant reply lands in a chat that still carries the
//! placeholder title, a background task asks the LLM for a short title.
//! Failures are logged and the placeholder stays.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::chat::{Chat, ChatMessage, MessageRole, PLACEHOLDER_TITLE};
use crate::services::llm::CompletionProvider;

/// Messages from the start of the transcript used as title context.
pub const TITLE_CONTEXT_MESSAGES: usize = 4;
const MAX_TITLE_CHARS: usize = 60;

/// Whether appending produced a chat that should be auto-titled.
pub fn needs_title(chat: &Chat) -> bool {
    chat.title == PLACEHOLDER_TITLE
        && chat
            .messages
            .last()
            .is_some_and(|m| m.role == MessageRole::Assistant)
}

pub fn title_prompt(messages: &[ChatMessage]) -> String {
    let transcript: Vec<String> = messages
        .iter()
        .take(TITLE_CONTEXT_MESSAGES)
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect();

    format!(
        "Write a short title (at most 6 words) for the following conversation. \
         Reply with the title only, no quotes or punctuation at the end.\n\n{}",
        transcript.join("\n\n")
    )
}

/// Normalize a model reply into a title: first non-empty line, without
/// quotes or markdown, capped in length.
pub fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_start_matches('#')
        .trim()
        .trim_start_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`'))
        .trim_end_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '.' | ':'))
        .trim();

    if line.is_empty() {
        return None;
    }

    Some(line.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string())
}

async fn derive_title(
    pool: &DbPool,
    llm: &dyn CompletionProvider,
    chat_id: Uuid,
    messages: &[ChatMessage],
) -> AppResult<bool> {
    let reply = llm.prompt(&title_prompt(messages)).await?;
    let Some(title) = clean_title(&reply) else {
        debug!(%chat_id, "LLM produced no usable title");
        return Ok(false);
    };

    crate::db::chats::set_title_if_placeholder(pool.connection(), chat_id, &title).await
}

/// Spawn the auto-title task for `chat` if it qualifies.
pub fn spawn_auto_title(pool: DbPool, llm: Arc<dyn CompletionProvider>, chat: &Chat) {
    if !needs_title(chat) {
        return;
    }

    let chat_id = chat.id;
    let messages: Vec<ChatMessage> = chat
        .messages
        .iter()
        .take(TITLE_CONTEXT_MESSAGES)
        .cloned()
        .collect();

    actix_web::rt::spawn(async move {
        match derive_title(&pool, llm.as_ref(), chat_id, &messages).await {
            Ok(true) => debug!(%chat_id, "Chat auto-titled"),
            Ok(false) => {}
            Err(e) => warn!(%chat_id, "Chat auto-title failed: {}", e),
        }
    });
}
