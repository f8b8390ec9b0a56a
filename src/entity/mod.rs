//! SeaORM entity definitions.

pub mod chat;
pub mod chat_message;
pub mod contest_submission;
pub mod user;
