//! Payment session service orchestrating creation, status lookup and
//! reconciliation against the durable session store

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::payments::{Currency, PaymentSession, PaymentStatus};
use crate::infrastructure::adapters::provider_client::{
    map_provider_status, PaxosPaymentRequest, ProviderApi,
};
use crate::infrastructure::adapters::session_store::SessionStore;
use crate::shared::error::{AppError, AppResult};
use crate::shared::metrics::PaymentMetrics;
use crate::shared::validation::{format_amount, is_valid_ref_id};

/// Request to create a payment session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub report_id: String,
    pub lead_id: String,
}

/// Response returned to the purchase flow after session creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub payment_session_id: String,
    pub payment_url: String,
    pub ref_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Combined view of persisted session fields and the freshly resolved status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView {
    pub payment_session_id: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: Currency,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&PaymentSession> for SessionStatusView {
    fn from(session: &PaymentSession) -> Self {
        Self {
            payment_session_id: session.id.clone(),
            status: session.status,
            amount: session.amount,
            currency: session.currency,
            description: session.description.clone(),
            created_at: session.created_at,
            completed_at: session.completed_at,
            error_message: session.error_message.clone(),
        }
    }
}

/// Service owning the payment session lifecycle
pub struct PaymentSessionService {
    config: Arc<AppConfig>,
    provider: Arc<dyn ProviderApi>,
    store: Arc<SessionStore>,
    metrics: Arc<PaymentMetrics>,
}

impl PaymentSessionService {
    pub fn new(
        config: Arc<AppConfig>,
        provider: Arc<dyn ProviderApi>,
        store: Arc<SessionStore>,
        metrics: Arc<PaymentMetrics>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            metrics,
        }
    }

    fn validate(request: &CreateSessionRequest) -> AppResult<Currency> {
        let mut problems = Vec::new();

        if !request.amount.is_finite() || request.amount <= 0.0 {
            problems.push("amount must be greater than 0".to_string());
        }
        let currency = match request.currency.parse::<Currency>() {
            Ok(currency) => Some(currency),
            Err(e) => {
                problems.push(e);
                None
            }
        };
        if request.description.trim().is_empty() {
            problems.push("description is required".to_string());
        } else if request.description.len() > 500 {
            problems.push("description must be at most 500 characters".to_string());
        }
        if request.report_id.trim().is_empty() {
            problems.push("reportId is required".to_string());
        }
        if request.lead_id.trim().is_empty() {
            problems.push("leadId is required".to_string());
        }

        match (problems.is_empty(), currency) {
            (true, Some(currency)) => Ok(currency),
            _ => Err(AppError::Validation(problems.join("; "))),
        }
    }

    /// Create a payment session.
    ///
    /// The session row is only written after the provider confirms the
    /// payment, so a failed provider call leaves no partial local state.
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> AppResult<CreateSessionResponse> {
        let currency = Self::validate(&request)?;

        let now = Utc::now();
        // Embedding the creation instant keeps ref ids unique across retried
        // purchases for the same lead/report pair.
        let ref_id = format!(
            "{}-{}-{}",
            request.lead_id,
            request.report_id,
            now.timestamp_micros()
        );

        let wire_request = PaxosPaymentRequest {
            amount: format_amount(request.amount),
            currency: currency.as_str().to_string(),
            description: request.description.clone(),
            ref_id: ref_id.clone(),
        };

        let payment = match self.provider.create_payment(wire_request).await {
            Ok(payment) => payment,
            Err(e) => {
                self.metrics.increment_provider_errors();
                return Err(e);
            }
        };

        let payment_url = payment.payment_url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                self.config.provider.payment_url_base.trim_end_matches('/'),
                payment.id
            )
        });

        let expires_at = now + Duration::hours(self.config.payments.session_ttl_hours as i64);
        let session = PaymentSession {
            id: Uuid::new_v4().to_string(),
            ref_id: ref_id.clone(),
            lead_id: request.lead_id,
            report_id: request.report_id,
            amount: request.amount,
            currency,
            description: request.description,
            provider_payment_id: Some(payment.id),
            payment_url: Some(payment_url.clone()),
            status: PaymentStatus::Pending,
            error_message: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            expires_at,
        };
        self.store.put(&session).await?;
        self.metrics.increment_sessions_created();

        info!(
            ref_id = %ref_id,
            amount = %session.amount,
            currency = %currency.as_str(),
            "Created payment session"
        );

        Ok(CreateSessionResponse {
            payment_session_id: session.id,
            payment_url,
            ref_id,
            expires_at,
        })
    }

    /// Resolve the current status of a session, reconciling the persisted
    /// record with the provider's view.
    pub async fn get_status(&self, ref_id: &str) -> AppResult<SessionStatusView> {
        self.metrics.increment_status_checks();

        if !is_valid_ref_id(ref_id) {
            return Err(AppError::Validation("refId has an invalid format".to_string()));
        }

        let mut session = self
            .store
            .get(ref_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No payment session for ref id {}", ref_id)))?;

        // A terminal status never changes again; skip the provider round-trip.
        if session.status.is_terminal() {
            return Ok(SessionStatusView::from(&session));
        }

        // Lazy expiry runs before consulting the provider. Expired is
        // terminal, so a later provider-side completion is discarded.
        if session.status == PaymentStatus::Pending && session.is_expired() {
            if session.apply_status(PaymentStatus::Expired, Utc::now()) {
                self.store.put(&session).await?;
                self.metrics.increment_reconciliations_applied();
                info!(ref_id = %ref_id, "Payment session expired");
            }
            return Ok(SessionStatusView::from(&session));
        }

        let payment = match self.provider.get_payment_by_ref_id(ref_id).await {
            Ok(payment) => payment,
            Err(e) => {
                self.metrics.increment_provider_errors();
                return Err(e);
            }
        };
        let payment = payment.ok_or_else(|| {
            AppError::NotFound(format!("Provider has no payment for ref id {}", ref_id))
        })?;

        let resolved = map_provider_status(&payment.status);
        self.reconcile(&mut session, resolved, None).await?;

        Ok(SessionStatusView::from(&session))
    }

    /// Look up the persisted session for a reference id.
    pub(crate) async fn find_session(&self, ref_id: &str) -> AppResult<Option<PaymentSession>> {
        self.store.get(ref_id).await
    }

    /// Apply a freshly observed status to a session and persist it when the
    /// transition is permitted. Polling and webhook ingestion both funnel
    /// through here, so the monotonic terminal-state rule is checked in
    /// exactly one place. Returns whether a transition was applied.
    pub(crate) async fn reconcile(
        &self,
        session: &mut PaymentSession,
        next: PaymentStatus,
        error_message: Option<String>,
    ) -> AppResult<bool> {
        let now = Utc::now();
        if !session.apply_status(next, now) {
            if session.status != next {
                debug!(
                    ref_id = %session.ref_id,
                    current = %session.status.as_str(),
                    incoming = %next.as_str(),
                    "Discarding stale status update"
                );
            }
            return Ok(false);
        }

        if let Some(message) = error_message {
            session.error_message = Some(message);
        }
        self.store.put(session).await?;
        self.metrics.increment_reconciliations_applied();

        info!(
            ref_id = %session.ref_id,
            status = %session.status.as_str(),
            "Payment session status updated"
        );
        Ok(true)
    }
}
