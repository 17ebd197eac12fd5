//! Webhook dispatcher
//!
//! Converts asynchronous provider push notifications into the same guarded
//! state transitions produced by polling. The dispatcher always produces an
//! acknowledgement: a malformed or failing event is logged and flagged, but
//! the provider still receives a 200-equivalent response so it does not
//! pile up redeliveries.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::services::session_service::PaymentSessionService;
use crate::config::AppConfig;
use crate::domain::payments::PaymentStatus;
use crate::domain::webhooks::{WebhookEvent, WebhookEventType, WebhookPayload};
use crate::infrastructure::adapters::report_unlock::ReportUnlock;
use crate::infrastructure::adapters::session_store::SessionStore;
use crate::shared::error::{AppError, AppResult};
use crate::shared::logging::LoggingUtils;
use crate::shared::metrics::PaymentMetrics;

type HmacSha256 = Hmac<Sha256>;

/// Acknowledgement returned to the provider for every delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    fn ok() -> Self {
        Self {
            received: true,
            error: None,
        }
    }

    fn with_error(error: &AppError) -> Self {
        Self {
            received: true,
            error: Some(error.to_string()),
        }
    }
}

/// Dispatcher for inbound provider webhooks
pub struct WebhookDispatcher {
    config: Arc<AppConfig>,
    sessions: Arc<PaymentSessionService>,
    store: Arc<SessionStore>,
    unlock: Arc<dyn ReportUnlock>,
    metrics: Arc<PaymentMetrics>,
}

impl WebhookDispatcher {
    pub fn new(
        config: Arc<AppConfig>,
        sessions: Arc<PaymentSessionService>,
        store: Arc<SessionStore>,
        unlock: Arc<dyn ReportUnlock>,
        metrics: Arc<PaymentMetrics>,
    ) -> Self {
        Self {
            config,
            sessions,
            store,
            unlock,
            metrics,
        }
    }

    /// Handle one delivery. Always returns an acknowledgement; internal
    /// failures are carried in the `error` field for diagnostics only.
    pub async fn handle(&self, body: &[u8], signature: Option<&str>) -> WebhookAck {
        self.metrics.increment_webhooks_received();

        match self.process(body, signature).await {
            Ok(()) => WebhookAck::ok(),
            Err(e) => {
                error!(error = %e, "Webhook processing failed");
                WebhookAck::with_error(&e)
            }
        }
    }

    async fn process(&self, body: &[u8], signature: Option<&str>) -> AppResult<()> {
        // Verification runs before any parsing or state mutation.
        if let Some(secret) = self.config.webhook.secret.as_deref() {
            let Some(signature) = signature else {
                self.metrics.increment_webhooks_rejected();
                LoggingUtils::log_rejected_signature("signature header missing");
                return Err(AppError::SignatureVerification(
                    "signature header missing".to_string(),
                ));
            };
            if !verify_signature(body, signature, secret) {
                self.metrics.increment_webhooks_rejected();
                LoggingUtils::log_rejected_signature("signature mismatch");
                return Err(AppError::SignatureVerification(
                    "signature mismatch".to_string(),
                ));
            }
        }

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| AppError::MalformedPayload(e.to_string()))?;
        if payload.event.is_empty() || payload.data.ref_id.is_empty() {
            return Err(AppError::MalformedPayload(
                "event and data.ref_id are required".to_string(),
            ));
        }

        let event_type = WebhookEventType::parse(&payload.event);

        // Audit record first, outcome attached afterwards.
        let event = WebhookEvent::new(
            event_type.as_str(),
            &payload.data.ref_id,
            serde_json::to_value(&payload)?,
        );
        let event_id = event.id.clone();
        self.store.record_event(&event).await?;

        let outcome = self.dispatch(&event_type, &payload).await;
        self.store
            .mark_event_processed(&event_id, outcome.as_ref().err().map(|e| e.to_string()))
            .await?;
        outcome?;

        self.metrics.increment_webhooks_processed();
        Ok(())
    }

    async fn dispatch(
        &self,
        event_type: &WebhookEventType,
        payload: &WebhookPayload,
    ) -> AppResult<()> {
        info!(
            event_type = %event_type.as_str(),
            ref_id = %payload.data.ref_id,
            "Processing webhook event"
        );

        match event_type {
            WebhookEventType::PaymentCompleted => self.handle_completed(payload).await,
            WebhookEventType::PaymentFailed => self.handle_failed(payload).await,
            WebhookEventType::PaymentPending => self.handle_pending(payload).await,
            WebhookEventType::PaymentCancelled => self.handle_cancelled(payload).await,
            WebhookEventType::Unknown(name) => {
                warn!(event_type = %name, "Ignoring unknown webhook event type");
                self.metrics.increment_webhooks_ignored();
                Ok(())
            }
        }
    }

    async fn handle_completed(&self, payload: &WebhookPayload) -> AppResult<()> {
        let ref_id = &payload.data.ref_id;
        let Some(mut session) = self.sessions.find_session(ref_id).await? else {
            LoggingUtils::log_unmatched_webhook("payment.completed", ref_id);
            self.metrics.increment_webhooks_ignored();
            return Ok(());
        };

        let applied = self
            .sessions
            .reconcile(&mut session, PaymentStatus::Completed, None)
            .await?;

        // Redeliveries find the session already completed, so the unlock
        // callback fires exactly once per session.
        if applied {
            self.unlock.on_payment_completed(&session).await?;
        }
        Ok(())
    }

    async fn handle_failed(&self, payload: &WebhookPayload) -> AppResult<()> {
        let ref_id = &payload.data.ref_id;
        let Some(mut session) = self.sessions.find_session(ref_id).await? else {
            LoggingUtils::log_unmatched_webhook("payment.failed", ref_id);
            self.metrics.increment_webhooks_ignored();
            return Ok(());
        };

        self.sessions
            .reconcile(
                &mut session,
                PaymentStatus::Failed,
                payload.data.error.clone(),
            )
            .await?;
        Ok(())
    }

    async fn handle_pending(&self, payload: &WebhookPayload) -> AppResult<()> {
        let ref_id = &payload.data.ref_id;
        let Some(mut session) = self.sessions.find_session(ref_id).await? else {
            LoggingUtils::log_unmatched_webhook("payment.pending", ref_id);
            self.metrics.increment_webhooks_ignored();
            return Ok(());
        };

        // A pending notification means the provider has started work.
        self.sessions
            .reconcile(&mut session, PaymentStatus::Processing, None)
            .await?;
        Ok(())
    }

    async fn handle_cancelled(&self, payload: &WebhookPayload) -> AppResult<()> {
        let ref_id = &payload.data.ref_id;
        let Some(mut session) = self.sessions.find_session(ref_id).await? else {
            LoggingUtils::log_unmatched_webhook("payment.cancelled", ref_id);
            self.metrics.increment_webhooks_ignored();
            return Ok(());
        };

        self.sessions
            .reconcile(&mut session, PaymentStatus::Cancelled, None)
            .await?;
        Ok(())
    }
}

/// Verify an HMAC-SHA256 hex signature over the raw payload bytes.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());
    let provided = signature.trim();

    // Constant-time comparison to prevent timing attacks
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .as_bytes()
        .iter()
        .zip(provided.as_bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::session_service::CreateSessionRequest;
    use crate::domain::payments::PaymentSession;
    use crate::infrastructure::adapters::provider_client::{
        PaxosPaymentRequest, ProviderApi, ProviderPayment,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubProvider;

    #[async_trait]
    impl ProviderApi for StubProvider {
        async fn create_payment(
            &self,
            request: PaxosPaymentRequest,
        ) -> AppResult<ProviderPayment> {
            Ok(ProviderPayment {
                id: "pay_1".to_string(),
                ref_id: request.ref_id,
                amount: request.amount,
                currency: request.currency,
                status: "PAYMENT_STATUS_PENDING".to_string(),
                payment_url: None,
                created_at: "2026-08-01T10:00:00Z".to_string(),
            })
        }

        async fn get_payment_by_ref_id(
            &self,
            _ref_id: &str,
        ) -> AppResult<Option<ProviderPayment>> {
            Ok(None)
        }
    }

    struct CountingUnlock {
        calls: AtomicU32,
    }

    impl CountingUnlock {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ReportUnlock for CountingUnlock {
        async fn on_payment_completed(&self, _session: &PaymentSession) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        dispatcher: WebhookDispatcher,
        store: Arc<SessionStore>,
        unlock: Arc<CountingUnlock>,
    }

    fn fixture(secret: Option<&str>) -> Fixture {
        let mut config = AppConfig::default();
        config.webhook.secret = secret.map(|s| s.to_string());
        let config = Arc::new(config);

        let store = Arc::new(SessionStore::new(None));
        let metrics = Arc::new(PaymentMetrics::new());
        let sessions = Arc::new(PaymentSessionService::new(
            config.clone(),
            Arc::new(StubProvider),
            store.clone(),
            metrics.clone(),
        ));
        let unlock = Arc::new(CountingUnlock::new());

        Fixture {
            dispatcher: WebhookDispatcher::new(
                config,
                sessions.clone(),
                store.clone(),
                unlock.clone(),
                metrics,
            ),
            store,
            unlock,
        }
    }

    async fn seed_session(fixture: &Fixture) -> String {
        let sessions = PaymentSessionService::new(
            Arc::new(AppConfig::default()),
            Arc::new(StubProvider),
            fixture.store.clone(),
            Arc::new(PaymentMetrics::new()),
        );
        sessions
            .create_session(CreateSessionRequest {
                amount: 500.0,
                currency: "USD".to_string(),
                description: "Growth report".to_string(),
                report_id: "r1".to_string(),
                lead_id: "l1".to_string(),
            })
            .await
            .unwrap()
            .ref_id
    }

    fn completed_body(ref_id: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "event": "payment.completed",
            "data": {"ref_id": ref_id, "payment_amount": 500, "status": "completed"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_completed_webhook_unlocks_exactly_once() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;
        let body = completed_body(&ref_id);

        let ack = fixture.dispatcher.handle(&body, None).await;
        assert!(ack.received);
        assert!(ack.error.is_none());

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Completed);
        assert!(session.completed_at.is_some());
        assert_eq!(fixture.unlock.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_replayed_webhook_is_idempotent() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;
        let body = completed_body(&ref_id);

        fixture.dispatcher.handle(&body, None).await;
        let completed_at = fixture
            .store
            .get(&ref_id)
            .await
            .unwrap()
            .unwrap()
            .completed_at;

        let ack = fixture.dispatcher.handle(&body, None).await;
        assert!(ack.received);

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Completed);
        assert_eq!(session.completed_at, completed_at);
        assert_eq!(fixture.unlock.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_pending_webhook_does_not_regress_terminal_state() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;

        fixture
            .dispatcher
            .handle(&completed_body(&ref_id), None)
            .await;

        let stale = serde_json::to_vec(&serde_json::json!({
            "event": "payment.pending",
            "data": {"ref_id": ref_id}
        }))
        .unwrap();
        let ack = fixture.dispatcher.handle(&stale, None).await;
        assert!(ack.received);

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_webhook_records_error_message() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "payment.failed",
            "data": {"ref_id": ref_id, "error": "card declined"}
        }))
        .unwrap();
        fixture.dispatcher.handle(&body, None).await;

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Failed);
        assert_eq!(session.error_message.as_deref(), Some("card declined"));
    }

    #[tokio::test]
    async fn test_pending_webhook_moves_session_to_processing() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "payment.pending",
            "data": {"ref_id": ref_id}
        }))
        .unwrap();
        fixture.dispatcher.handle(&body, None).await;

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Processing);
    }

    #[tokio::test]
    async fn test_cancelled_webhook() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "payment.cancelled",
            "data": {"ref_id": ref_id}
        }))
        .unwrap();
        fixture.dispatcher.handle(&body, None).await;

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unknown_ref_id_is_acknowledged_without_mutation() {
        let fixture = fixture(None);

        let ack = fixture
            .dispatcher
            .handle(&completed_body("l9-r9-999"), None)
            .await;
        assert!(ack.received);
        assert!(ack.error.is_none());
        assert_eq!(fixture.unlock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_event_type_is_acknowledged_without_action() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;

        let body = serde_json::to_vec(&serde_json::json!({
            "event": "payment.refunded",
            "data": {"ref_id": ref_id}
        }))
        .unwrap();
        let ack = fixture.dispatcher.handle(&body, None).await;
        assert!(ack.received);
        assert!(ack.error.is_none());

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_acknowledged_with_error() {
        let fixture = fixture(None);

        let ack = fixture.dispatcher.handle(b"{\"event\":", None).await;
        assert!(ack.received);
        assert!(ack.error.is_some());

        let ack = fixture
            .dispatcher
            .handle(br#"{"event":"","data":{"ref_id":""}}"#, None)
            .await;
        assert!(ack.received);
        assert!(ack.error.is_some());
    }

    #[tokio::test]
    async fn test_webhook_audit_trail_is_recorded() {
        let fixture = fixture(None);
        let ref_id = seed_session(&fixture).await;

        fixture
            .dispatcher
            .handle(&completed_body(&ref_id), None)
            .await;

        let events = fixture.store.events_for(&ref_id).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "payment.completed");
        assert!(events[0].processed);
    }

    #[tokio::test]
    async fn test_valid_signature_is_accepted() {
        let secret = "whsec_test";
        let fixture = fixture(Some(secret));
        let ref_id = seed_session(&fixture).await;
        let body = completed_body(&ref_id);

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(&body);
        let signature = hex::encode(mac.finalize().into_bytes());

        let ack = fixture.dispatcher.handle(&body, Some(&signature)).await;
        assert!(ack.received);
        assert!(ack.error.is_none());

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_invalid_signature_is_rejected_without_mutation() {
        let fixture = fixture(Some("whsec_test"));
        let ref_id = seed_session(&fixture).await;
        let body = completed_body(&ref_id);

        let ack = fixture.dispatcher.handle(&body, Some("deadbeef")).await;
        assert!(ack.received);
        assert!(ack.error.is_some());

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Pending);
        assert_eq!(fixture.unlock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_signature_header_is_rejected_when_secret_configured() {
        let fixture = fixture(Some("whsec_test"));
        let ref_id = seed_session(&fixture).await;

        let ack = fixture
            .dispatcher
            .handle(&completed_body(&ref_id), None)
            .await;
        assert!(ack.received);
        assert!(ack.error.is_some());

        let session = fixture.store.get(&ref_id).await.unwrap().unwrap();
        assert_eq!(session.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_verify_signature_round_trip() {
        let payload = b"{\"event\":\"payment.completed\"}";
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(payload);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature(payload, &signature, "secret"));
        assert!(!verify_signature(payload, &signature, "other-secret"));
        assert!(!verify_signature(payload, "tampered", "secret"));
    }
}
