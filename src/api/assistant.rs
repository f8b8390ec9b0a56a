//! Coding assistant endpoints backed by the LLM collaborator.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::BearerAuth;
use crate::error::{AppError, AppResult};
use crate::services::assistant::{ask_about_selection_prompt, explain_error_prompt};
use crate::services::llm::CompletionProvider;

/// Request to explain an execution error.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExplainErrorRequest {
    pub language: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Question about a selected code snippet.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AskRequest {
    pub language: Option<String>,
    pub code: Option<String>,
    pub selection: Option<String>,
    pub question: Option<String>,
}

/// The assistant's answer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssistantResponse {
    pub response: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Explain an error produced by the user's code.
#[utoipa::path(
    post,
    path = "/api/assistant/explain-error",
    tag = "Assistant",
    request_body = ExplainErrorRequest,
    responses(
        (status = 200, description = "Explanation", body = AssistantResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 500, description = "Assistant unavailable", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[post("/assistant/explain-error")]
pub async fn explain_error(
    _auth: BearerAuth,
    llm: web::Data<dyn CompletionProvider>,
    body: web::Json<ExplainErrorRequest>,
) -> AppResult<HttpResponse> {
    let (Some(language), Some(code), Some(error)) =
        (present(&body.language), present(&body.code), present(&body.error))
    else {
        return Err(AppError::InvalidInput(
            "Language, code and error are required".to_string(),
        ));
    };

    let response = llm.prompt(&explain_error_prompt(language, code, error)).await?;
    Ok(HttpResponse::Ok().json(AssistantResponse { response }))
}

/// Answer a question about a selected part of the user's code.
#[utoipa::path(
    post,
    path = "/api/assistant/ask",
    tag = "Assistant",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer", body = AssistantResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 500, description = "Assistant unavailable", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[post("/assistant/ask")]
pub async fn ask(
    _auth: BearerAuth,
    llm: web::Data<dyn CompletionProvider>,
    body: web::Json<AskRequest>,
) -> AppResult<HttpResponse> {
    let (Some(language), Some(code), Some(selection), Some(question)) = (
        present(&body.language),
        present(&body.code),
        present(&body.selection),
        present(&body.question),
    ) else {
        return Err(AppError::InvalidInput(
            "Language, code, selection and question are required".to_string(),
        ));
    };

    let prompt = ask_about_selection_prompt(language, code, selection, question);
    let response = llm.prompt(&prompt).await?;
    Ok(HttpResponse::Ok().json(AssistantResponse { response }))
}

/// Configure assistant routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(explain_error).service(ask);
}
