//! Metrics utilities module
//!
//! This module provides counters for the payment session lifecycle,
//! exposed as JSON on the metrics endpoint.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Payment sessions created
    pub sessions_created: u64,

    /// Status checks served
    pub status_checks: u64,

    /// Status transitions actually applied during reconciliation
    pub reconciliations_applied: u64,

    /// Webhooks received (any outcome)
    pub webhooks_received: u64,

    /// Webhooks fully processed
    pub webhooks_processed: u64,

    /// Webhooks acknowledged without action (unknown event type or ref id)
    pub webhooks_ignored: u64,

    /// Webhooks rejected by signature verification
    pub webhooks_rejected: u64,

    /// Provider call failures
    pub provider_errors: u64,

    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Payment metrics for the application
pub struct PaymentMetrics {
    sessions_created: AtomicU64,
    status_checks: AtomicU64,
    reconciliations_applied: AtomicU64,
    webhooks_received: AtomicU64,
    webhooks_processed: AtomicU64,
    webhooks_ignored: AtomicU64,
    webhooks_rejected: AtomicU64,
    provider_errors: AtomicU64,
    start_time: SystemTime,
}

impl PaymentMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            sessions_created: AtomicU64::new(0),
            status_checks: AtomicU64::new(0),
            reconciliations_applied: AtomicU64::new(0),
            webhooks_received: AtomicU64::new(0),
            webhooks_processed: AtomicU64::new(0),
            webhooks_ignored: AtomicU64::new(0),
            webhooks_rejected: AtomicU64::new(0),
            provider_errors: AtomicU64::new(0),
            start_time: SystemTime::now(),
        }
    }

    pub fn increment_sessions_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_status_checks(&self) {
        self.status_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reconciliations_applied(&self) {
        self.reconciliations_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_processed(&self) {
        self.webhooks_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_ignored(&self) {
        self.webhooks_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_rejected(&self) {
        self.webhooks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_provider_errors(&self) {
        self.provider_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics
    pub fn snapshot(&self) -> Metrics {
        let uptime = SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();

        Metrics {
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            status_checks: self.status_checks.load(Ordering::Relaxed),
            reconciliations_applied: self.reconciliations_applied.load(Ordering::Relaxed),
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            webhooks_processed: self.webhooks_processed.load(Ordering::Relaxed),
            webhooks_ignored: self.webhooks_ignored.load(Ordering::Relaxed),
            webhooks_rejected: self.webhooks_rejected.load(Ordering::Relaxed),
            provider_errors: self.provider_errors.load(Ordering::Relaxed),
            uptime_seconds: uptime,
        }
    }
}

impl Default for PaymentMetrics {
    fn default() -> Self {
        Self::new()
    }
}
