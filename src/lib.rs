//! CodeMentor server library.
//!
//! This library provides the core functionality for the CodeMentor API:
//! accounts and bearer authentication, persisted assistant chats, the coding
//! contest (problem generation, evaluation, leaderboard) and the code
//! execution proxy.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
