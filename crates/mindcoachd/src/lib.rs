//! MindCoach daemon library - exposes modules for testing.

pub mod ai_service;
pub mod auth;
pub mod config;
pub mod error;
pub mod llm_client;
pub mod middleware;
pub mod prompts;
pub mod routes;
pub mod server;
pub mod store;

pub use config::Config;
pub use server::{build_router, AppState};
