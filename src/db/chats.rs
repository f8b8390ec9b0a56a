//! Database operations for chats and their transcripts.
//!
//! Every lookup is scoped by owner; a chat owned by someone else is
//! indistinguishable from a missing one.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{chat, chat_message};
use crate::error::{AppError, AppResult};
use crate::models::chat::{Chat, ChatMessage, MessageRole, PLACEHOLDER_TITLE};

fn chat_not_found() -> AppError {
    AppError::NotFound("Chat".to_string())
}

async fn find_owned<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    chat_id: Uuid,
) -> AppResult<chat::Model> {
    chat::Entity::find_by_id(chat_id)
        .filter(chat::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(chat_not_found)
}

async fn transcript<C: ConnectionTrait>(db: &C, chat_id: Uuid) -> AppResult<Vec<ChatMessage>> {
    let rows = chat_message::Entity::find()
        .filter(chat_message::Column::ChatId.eq(chat_id))
        .order_by_asc(chat_message::Column::Timestamp)
        .order_by_asc(chat_message::Column::Id)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(ChatMessage::from).collect())
}

/// List the user's chats, most recently updated first, with transcripts.
pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Vec<Chat>> {
    let chats = chat::Entity::find()
        .filter(chat::Column::UserId.eq(user_id))
        .order_by_desc(chat::Column::LastUpdated)
        .all(db)
        .await?;

    if chats.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = chats.iter().map(|c| c.id).collect();
    let messages = chat_message::Entity::find()
        .filter(chat_message::Column::ChatId.is_in(ids))
        .order_by_asc(chat_message::Column::Timestamp)
        .order_by_asc(chat_message::Column::Id)
        .all(db)
        .await?;

    let mut by_chat: HashMap<Uuid, Vec<ChatMessage>> = HashMap::new();
    for m in messages {
        by_chat.entry(m.chat_id).or_default().push(m.into());
    }

    Ok(chats
        .into_iter()
        .map(|c| {
            let messages = by_chat.remove(&c.id).unwrap_or_default();
            Chat::from_parts(c, messages)
        })
        .collect())
}

/// Create an empty chat.
pub async fn create(db: &DatabaseConnection, user_id: Uuid, title: &str) -> AppResult<Chat> {
    let now = Utc::now();
    let model = chat::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set(title.to_string()),
        last_updated: Set(now),
        created_at: Set(now),
    };

    let inserted = model.insert(db).await?;
    Ok(Chat::from_parts(inserted, Vec::new()))
}

/// Fetch one chat with its transcript.
pub async fn get_owned(db: &DatabaseConnection, user_id: Uuid, chat_id: Uuid) -> AppResult<Chat> {
    let chat = find_owned(db, user_id, chat_id).await?;
    let messages = transcript(db, chat.id).await?;
    Ok(Chat::from_parts(chat, messages))
}

/// Append a message and refresh `last_updated`. Returns the full transcript.
pub async fn append_message(
    db: &DatabaseConnection,
    user_id: Uuid,
    chat_id: Uuid,
    role: MessageRole,
    content: &str,
) -> AppResult<Chat> {
    let txn = db.begin().await?;

    let chat = find_owned(&txn, user_id, chat_id).await?;
    let now = Utc::now();

    chat_message::ActiveModel {
        id: Set(Uuid::now_v7()),
        chat_id: Set(chat.id),
        role: Set(role.as_str().to_string()),
        content: Set(content.to_string()),
        timestamp: Set(now),
    }
    .insert(&txn)
    .await?;

    let mut active: chat::ActiveModel = chat.into();
    active.last_updated = Set(now);
    let chat = active.update(&txn).await?;

    let messages = transcript(&txn, chat.id).await?;
    txn.commit().await?;

    Ok(Chat::from_parts(chat, messages))
}

/// Rename a chat.
pub async fn rename(
    db: &DatabaseConnection,
    user_id: Uuid,
    chat_id: Uuid,
    title: &str,
) -> AppResult<Chat> {
    let chat = find_owned(db, user_id, chat_id).await?;

    let mut active: chat::ActiveModel = chat.into();
    active.title = Set(title.to_string());
    let chat = active.update(db).await?;

    let messages = transcript(db, chat.id).await?;
    Ok(Chat::from_parts(chat, messages))
}

/// Delete a chat and its messages.
pub async fn delete(db: &DatabaseConnection, user_id: Uuid, chat_id: Uuid) -> AppResult<()> {
    let txn = db.begin().await?;

    let chat = find_owned(&txn, user_id, chat_id).await?;
    chat_message::Entity::delete_many()
        .filter(chat_message::Column::ChatId.eq(chat.id))
        .exec(&txn)
        .await?;
    chat::Entity::delete_by_id(chat.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Overwrite the title only while it is still the placeholder.
///
/// Returns whether the title was changed.
pub async fn set_title_if_placeholder(
    db: &DatabaseConnection,
    chat_id: Uuid,
    title: &str,
) -> AppResult<bool> {
    let result = chat::Entity::update_many()
        .col_expr(chat::Column::Title, Expr::value(title))
        .filter(chat::Column::Id.eq(chat_id))
        .filter(chat::Column::Title.eq(PLACEHOLDER_TITLE))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}
