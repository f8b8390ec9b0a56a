//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CodeMentor Server",
        version = "0.1.0",
        description = "API server for AI-assisted coding chat, remote code execution and generated coding contests"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        api::auth::signup,
        api::auth::login,
        api::auth::me,
        api::auth::update_contest_level,
        // Chat endpoints
        api::chats::list_chats,
        api::chats::create_chat,
        api::chats::get_chat,
        api::chats::append_message,
        api::chats::reply,
        api::chats::rename_chat,
        api::chats::delete_chat,
        // Contest endpoints
        api::contest::submit,
        api::contest::generate_problem,
        api::contest::list_submissions,
        api::contest::get_submission,
        api::contest::leaderboard,
        api::contest::stats,
        // Execution and assistant
        api::execute::execute,
        api::assistant::explain_error,
        api::assistant::ask,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            api::health::CollaboratorState,
            // Auth
            models::user::UserResponse,
            models::user::SignupRequest,
            models::user::LoginRequest,
            models::user::ContestLevelRequest,
            models::user::AuthResponse,
            models::user::CurrentUserResponse,
            // Chats
            models::chat::MessageRole,
            models::chat::ChatMessage,
            models::chat::Chat,
            models::chat::CreateChatRequest,
            models::chat::AppendMessageRequest,
            models::chat::RenameChatRequest,
            models::chat::ReplyRequest,
            models::chat::DeleteChatResponse,
            // Contest
            models::contest::Difficulty,
            models::contest::TestCase,
            models::contest::Problem,
            models::contest::GenerateProblemRequest,
            models::contest::GenerateProblemResponse,
            models::contest::SubmitRequest,
            models::contest::TestCaseResult,
            models::contest::Submission,
            models::contest::SubmitResponse,
            models::contest::SubmissionsResponse,
            models::contest::SubmissionResponse,
            models::contest::LeaderboardEntry,
            models::contest::LeaderboardResponse,
            models::contest::DifficultyStats,
            models::contest::ByDifficulty,
            models::contest::ContestStats,
            models::contest::StatsResponse,
            // Execution
            models::execution::ExecuteRequest,
            models::execution::ExecutionStatus,
            models::execution::ExecutionResult,
            // Assistant
            api::assistant::ExplainErrorRequest,
            api::assistant::AskRequest,
            api::assistant::AssistantResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Signup, login and profile"),
        (name = "Chats", description = "Chat transcripts with the coding assistant"),
        (name = "Contest", description = "Generated problems, submissions and leaderboard"),
        (name = "Execution", description = "Remote code execution"),
        (name = "Assistant", description = "Error explanations and code questions")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
