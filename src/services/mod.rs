//! Business logic services and external collaborators.

pub mod assistant;
pub mod chat_title;
pub mod evaluator;
pub mod google_oauth;
pub mod judge0;
pub mod llm;
pub mod problem_generator;

pub use google_oauth::configure_routes as configure_oauth_routes;
pub use judge0::{CodeExecutor, ExecutionError, Judge0Client};
pub use llm::{ChatTurn, CompletionProvider, GeminiClient, LlmError};
