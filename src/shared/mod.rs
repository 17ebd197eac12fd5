//! Shared utilities module
//!
//! This module contains cross-cutting concerns: error handling, logging,
//! metrics and validation helpers.

pub mod error;
pub mod logging;
pub mod metrics;
pub mod validation;

pub use error::{AppError, AppResult};
pub use metrics::{Metrics, PaymentMetrics};
