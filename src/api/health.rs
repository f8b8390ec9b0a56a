//! Liveness and readiness probes.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::DbPool;

/// Liveness response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
}

/// Whether an optional collaborator has credentials.
#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorState {
    Configured,
    Unconfigured,
}

impl CollaboratorState {
    fn from_key<T>(key: &Option<T>) -> Self {
        if key.is_some() {
            Self::Configured
        } else {
            Self::Unconfigured
        }
    }
}

/// Readiness response. Missing collaborator keys degrade features without
/// making the service unready.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    status: &'static str,
    database: &'static str,
    execution: CollaboratorState,
    assistant: CollaboratorState,
    google_login: CollaboratorState,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness probe.
///
/// 200 once the database answers; reports which collaborators have keys.
#[utoipa::path(
    get,
    path = "/api/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Database unreachable", body = crate::error::ErrorResponse)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>, config: web::Data<Config>) -> HttpResponse {
    if let Err(e) = pool.ping().await {
        tracing::warn!("Readiness check failed: {}", e);
        return HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": "NOT_READY",
            "message": "Database connection failed"
        }));
    }

    HttpResponse::Ok().json(ReadyResponse {
        status: "ready",
        database: "connected",
        execution: CollaboratorState::from_key(&config.judge0.api_key),
        assistant: CollaboratorState::from_key(&config.llm.api_key),
        google_login: if config.google_oauth.enabled {
            CollaboratorState::Configured
        } else {
            CollaboratorState::Unconfigured
        },
    })
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
