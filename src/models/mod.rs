//! Domain models for the CodeMentor API.

pub mod chat;
pub mod contest;
pub mod execution;
pub mod user;

pub use chat::{Chat, ChatMessage, MessageRole, PLACEHOLDER_TITLE};
pub use contest::{
    ContestStats, Difficulty, LeaderboardEntry, Problem, Submission, TestCase, TestCaseResult,
};
pub use execution::{ExecutionResult, ExecutionStatus};
pub use user::{User, UserResponse};
