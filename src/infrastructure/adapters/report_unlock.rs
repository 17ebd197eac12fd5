//! Report unlock callback
//!
//! The completed-handler notifies the surrounding lead/report application
//! through this seam: unlock the purchased report and mark the lead
//! converted. The production default only logs the handoff; the owning
//! application supplies its own implementation when embedding the service.

use async_trait::async_trait;
use tracing::info;

use crate::domain::payments::PaymentSession;
use crate::shared::error::AppResult;

/// Callback invoked when a payment session reaches `completed`
#[async_trait]
pub trait ReportUnlock: Send + Sync {
    /// Called exactly once per session completion.
    async fn on_payment_completed(&self, session: &PaymentSession) -> AppResult<()>;
}

/// Default implementation that records the unlock request in the log
pub struct LoggingReportUnlock;

#[async_trait]
impl ReportUnlock for LoggingReportUnlock {
    async fn on_payment_completed(&self, session: &PaymentSession) -> AppResult<()> {
        info!(
            ref_id = %session.ref_id,
            lead_id = %session.lead_id,
            report_id = %session.report_id,
            "Payment completed; unlocking report and marking lead converted"
        );
        Ok(())
    }
}
