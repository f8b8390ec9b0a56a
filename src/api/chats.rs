//! Chat transcript API handlers.
//!
//! All routes require a bearer token and only ever touch the caller's chats.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::BearerAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::chat::{
    AppendMessageRequest, Chat, CreateChatRequest, DeleteChatResponse, MessageRole,
    PLACEHOLDER_TITLE, RenameChatRequest, ReplyRequest,
};
use crate::services::chat_title;
use crate::services::llm::{ChatTurn, CompletionProvider};

/// Kick off auto-titling when the transcript just received an assistant reply.
fn maybe_auto_title(pool: &web::Data<DbPool>, llm: &web::Data<dyn CompletionProvider>, chat: &Chat) {
    chat_title::spawn_auto_title(pool.get_ref().clone(), llm.clone().into_inner(), chat);
}

/// List the caller's chats, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/chats",
    tag = "Chats",
    responses(
        (status = 200, description = "Chats with transcripts", body = [Chat]),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_chats(auth: BearerAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let chats = crate::db::chats::list_for_user(pool.connection(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(chats))
}

/// Create an empty chat.
#[utoipa::path(
    post,
    path = "/api/chats",
    tag = "Chats",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat created", body = Chat),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_chat(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    body: Option<web::Json<CreateChatRequest>>,
) -> AppResult<HttpResponse> {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(PLACEHOLDER_TITLE);

    let chat = crate::db::chats::create(pool.connection(), auth.user_id, title).await?;
    Ok(HttpResponse::Created().json(chat))
}

/// Fetch one chat with its transcript.
#[utoipa::path(
    get,
    path = "/api/chats/{chat_id}",
    tag = "Chats",
    params(("chat_id" = Uuid, Path, description = "Chat UUID")),
    responses(
        (status = 200, description = "Chat with transcript", body = Chat),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_chat(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let chat = crate::db::chats::get_owned(pool.connection(), auth.user_id, *path).await?;
    Ok(HttpResponse::Ok().json(chat))
}

/// Append a message to a chat.
#[utoipa::path(
    put,
    path = "/api/chats/{chat_id}",
    tag = "Chats",
    params(("chat_id" = Uuid, Path, description = "Chat UUID")),
    request_body = AppendMessageRequest,
    responses(
        (status = 200, description = "Updated chat", body = Chat),
        (status = 400, description = "Missing or invalid role/content", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn append_message(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    llm: web::Data<dyn CompletionProvider>,
    path: web::Path<Uuid>,
    body: web::Json<AppendMessageRequest>,
) -> AppResult<HttpResponse> {
    let (Some(role), Some(content)) = (body.role.as_deref(), body.content.as_deref()) else {
        return Err(AppError::InvalidInput(
            "Role and content are required".to_string(),
        ));
    };
    if role.is_empty() || content.is_empty() {
        return Err(AppError::InvalidInput(
            "Role and content are required".to_string(),
        ));
    }
    let role = MessageRole::parse(role).ok_or_else(|| {
        AppError::InvalidInput("Role must be 'user' or 'assistant'".to_string())
    })?;

    let chat =
        crate::db::chats::append_message(pool.connection(), auth.user_id, *path, role, content)
            .await?;
    maybe_auto_title(&pool, &llm, &chat);

    Ok(HttpResponse::Ok().json(chat))
}

/// Send a user message and append the assistant's reply.
#[utoipa::path(
    post,
    path = "/api/chats/{chat_id}/reply",
    tag = "Chats",
    params(("chat_id" = Uuid, Path, description = "Chat UUID")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Chat with the user message and the reply", body = Chat),
        (status = 400, description = "Missing content", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Assistant unavailable", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn reply(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    llm: web::Data<dyn CompletionProvider>,
    path: web::Path<Uuid>,
    body: web::Json<ReplyRequest>,
) -> AppResult<HttpResponse> {
    let content = body
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Content is required".to_string()))?;
    let chat_id = path.into_inner();

    let chat = crate::db::chats::append_message(
        pool.connection(),
        auth.user_id,
        chat_id,
        MessageRole::User,
        content,
    )
    .await?;

    let turns: Vec<ChatTurn> = chat.messages.iter().map(ChatTurn::from).collect();
    let answer = llm.complete(&turns).await?;

    let chat = crate::db::chats::append_message(
        pool.connection(),
        auth.user_id,
        chat_id,
        MessageRole::Assistant,
        &answer,
    )
    .await?;
    maybe_auto_title(&pool, &llm, &chat);

    Ok(HttpResponse::Ok().json(chat))
}

/// Rename a chat.
#[utoipa::path(
    put,
    path = "/api/chats/{chat_id}/title",
    tag = "Chats",
    params(("chat_id" = Uuid, Path, description = "Chat UUID")),
    request_body = RenameChatRequest,
    responses(
        (status = 200, description = "Renamed chat", body = Chat),
        (status = 400, description = "Missing title", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename_chat(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<RenameChatRequest>,
) -> AppResult<HttpResponse> {
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Title is required".to_string()))?;

    let chat = crate::db::chats::rename(pool.connection(), auth.user_id, *path, title).await?;
    Ok(HttpResponse::Ok().json(chat))
}

/// Delete a chat and its transcript.
#[utoipa::path(
    delete,
    path = "/api/chats/{chat_id}",
    tag = "Chats",
    params(("chat_id" = Uuid, Path, description = "Chat UUID")),
    responses(
        (status = 200, description = "Chat deleted", body = DeleteChatResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_chat(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    crate::db::chats::delete(pool.connection(), auth.user_id, *path).await?;
    Ok(HttpResponse::Ok().json(DeleteChatResponse {
        message: "Chat deleted successfully".to_string(),
    }))
}

/// Configure chat routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/chats")
            .route(web::get().to(list_chats))
            .route(web::post().to(create_chat)),
    )
    .service(
        web::resource("/chats/{chat_id}")
            .route(web::get().to(get_chat))
            .route(web::put().to(append_message))
            .route(web::delete().to(delete_chat)),
    )
    .service(web::resource("/chats/{chat_id}/title").route(web::put().to(rename_chat)))
    .service(web::resource("/chats/{chat_id}/reply").route(web::post().to(reply)));
}
