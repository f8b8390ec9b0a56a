//! API E2E test suite.
//!
//! Drives the full route table against a throwaway SQLite database, a mock
//! Judge0 server and a mock Gemini server. Each test owns its database and
//! mocks, so tests run in parallel without sharing state.
//!
//! Run with: cargo test --test api_e2e

mod mock_judge0;
mod test_helpers;

mod test_auth;
mod test_execute;
