//! Code execution proxy.

use actix_web::{HttpResponse, post, web};

use crate::error::{AppError, AppResult};
use crate::models::execution::{ExecuteRequest, ExecutionResult};
use crate::services::judge0::CodeExecutor;

/// Run code through the execution service and relay its result record.
///
/// Polling is bounded; a submission still queued after the last poll ends
/// in 504. Dropping the request stops the poll loop.
#[utoipa::path(
    post,
    path = "/execute",
    tag = "Execution",
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "Execution finished", body = ExecutionResult),
        (status = 400, description = "Missing fields or unsupported language", body = crate::error::ErrorResponse),
        (status = 500, description = "Execution service failure", body = crate::error::ErrorResponse),
        (status = 504, description = "Execution did not finish in time", body = crate::error::ErrorResponse),
    )
)]
#[post("/execute")]
pub async fn execute(
    executor: web::Data<dyn CodeExecutor>,
    body: web::Json<ExecuteRequest>,
) -> AppResult<HttpResponse> {
    let (Some(language), Some(code)) = (
        body.language.as_deref().filter(|l| !l.is_empty()),
        body.code.as_deref().filter(|c| !c.is_empty()),
    ) else {
        return Err(AppError::InvalidInput(
            "Language and code are required.".to_string(),
        ));
    };
    let stdin = body.stdin.as_deref().unwrap_or_default();

    let result = executor.execute(language, code, stdin).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Configure the execution route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(execute);
}
