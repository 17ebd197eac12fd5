//! Logging utilities module
//!
//! This module provides centralized logging initialization and helpers.

use tracing::warn;

/// Logging utilities for the application
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging with the specified default level
    pub fn initialize(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| crate::shared::error::AppError::Internal(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }

    /// Log a webhook that could not be matched to a local session
    pub fn log_unmatched_webhook(event_type: &str, ref_id: &str) {
        warn!(
            event_type = %event_type,
            ref_id = %ref_id,
            "Webhook did not match any payment session"
        );
    }

    /// Log a rejected webhook signature for operator review
    pub fn log_rejected_signature(reason: &str) {
        warn!(
            reason = %reason,
            "Rejected webhook signature"
        );
    }
}
