//! Code execution request/result models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Judge0 status ids.
pub mod status {
    pub const IN_QUEUE: i32 = 1;
    pub const PROCESSING: i32 = 2;
    pub const ACCEPTED: i32 = 3;
}

/// Execution request accepted by `/execute`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecuteRequest {
    pub language: Option<String>,
    pub code: Option<String>,
    pub stdin: Option<String>,
}

/// Status of an execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExecutionStatus {
    pub id: i32,
    #[serde(default)]
    pub description: String,
}

/// Result record returned by the execution service, relayed unchanged.
///
/// Fields not named here (`language_id`, `wall_time`, `created_at`, ...) are
/// kept in `extra` so the relayed record matches what the service sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ExecutionResult {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: ExecutionStatus,
    /// Wall time in seconds, as reported
    #[serde(default)]
    pub time: Option<String>,
    /// Memory in kilobytes
    #[serde(default)]
    pub memory: Option<i64>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExecutionResult {
    /// Still queued or running.
    pub fn is_pending(&self) -> bool {
        matches!(self.status.id, status::IN_QUEUE | status::PROCESSING)
    }

    pub fn is_accepted(&self) -> bool {
        self.status.id == status::ACCEPTED
    }
}
