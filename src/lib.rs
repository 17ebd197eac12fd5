//! Ignitia Payments - payment session service for paid report purchases
//!
//! This library provides a small HTTP API that creates hosted payment
//! sessions against the Paxos/Paxum payment provider and reconciles their
//! status through caller-driven polling and provider webhooks.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod middleware;
pub mod shared;

pub use config::AppConfig;
pub use infrastructure::http::server::HttpServer;
pub use shared::error::{AppError, AppResult};

/// Application result type
pub type Result<T> = std::result::Result<T, shared::error::AppError>;
