//! Domain error types for the CodeMentor server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::services::judge0::ExecutionError;
use crate::services::llm::LlmError;
use crate::services::problem_generator::GenerationError;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found (or owned by someone else)
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("{0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("{0}")]
    Unauthorized(String),

    /// An external collaborator (LLM, code execution) failed
    #[error("{message}")]
    Upstream { message: String, details: String },

    /// Code execution did not finish within the polling budget
    #[error("Code execution timed out")]
    ExecutionTimeout(String),

    /// Unexpected server-side failure
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Upstream failure with a user-facing message and diagnostic details.
    pub fn upstream(message: impl Into<String>, details: impl fmt::Display) -> Self {
        AppError::Upstream {
            message: message.into(),
            details: details.to_string(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::Database(err) | AppError::Internal(err) => Some(err.clone()),
            AppError::Upstream { details, .. } => Some(details.clone()),
            AppError::ExecutionTimeout(details) => Some(details.clone()),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ExecutionTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_) | AppError::Upstream { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            AppError::InvalidInput(_) => ("INVALID_INPUT", self.to_string()),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
            AppError::Upstream { details, .. } => {
                tracing::warn!("Upstream error: {}", details);
                ("UPSTREAM_ERROR", self.to_string())
            }
            AppError::ExecutionTimeout(details) => {
                tracing::warn!("Execution timeout: {}", details);
                ("EXECUTION_TIMEOUT", self.to_string())
            }
            AppError::Internal(err_str) => {
                tracing::error!("Internal error: {}", err_str);
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        // Diagnostic detail only leaves the process in development builds.
        let details = if cfg!(debug_assertions) {
            self.details()
        } else {
            None
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
            details,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}

impl From<ExecutionError> for AppError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::UnsupportedLanguage(_) => AppError::InvalidInput(err.to_string()),
            ExecutionError::Timeout { .. } => AppError::ExecutionTimeout(err.to_string()),
            ExecutionError::MissingToken => {
                AppError::upstream("Failed to get submission token.", err)
            }
            _ => AppError::upstream("An error occurred while executing the code.", err),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        let message = match err {
            LlmError::NotConfigured => "The AI assistant is not configured.",
            LlmError::RateLimited { .. } => "AI quota exceeded. Please try again later.",
            _ => "Failed to get a response from the AI assistant. Please try again.",
        };
        AppError::upstream(message, err)
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Llm(inner) => inner.into(),
            _ => AppError::upstream("Failed to generate problem. Please try again.", err),
        }
    }
}
