//! Chat transcript models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{chat, chat_message};

/// Title every new chat starts with until it is renamed or auto-titled.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a transcript.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<chat_message::Model> for ChatMessage {
    fn from(m: chat_message::Model) -> Self {
        Self {
            id: m.id,
            // Rows are only ever written through `MessageRole`
            role: MessageRole::parse(&m.role).unwrap_or(MessageRole::User),
            content: m.content,
            timestamp: m.timestamp,
        }
    }
}

/// Chat with its full transcript in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn from_parts(m: chat::Model, messages: Vec<ChatMessage>) -> Self {
        Self {
            id: m.id,
            title: m.title,
            messages,
            last_updated: m.last_updated,
            created_at: m.created_at,
        }
    }
}

/// Create chat request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateChatRequest {
    pub title: Option<String>,
}

/// Append message request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AppendMessageRequest {
    pub role: Option<String>,
    pub content: Option<String>,
}

/// Rename chat request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameChatRequest {
    pub title: Option<String>,
}

/// Ask the assistant to reply to a new user message.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub content: Option<String>,
}

/// Delete confirmation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteChatResponse {
    pub message: String,
}
