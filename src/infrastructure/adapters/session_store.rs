//! Redis-backed payment session store
//!
//! Sessions are mirrored to an in-memory map so the store keeps working
//! without Redis; with Redis enabled the map acts as a read-through cache.
//! Sessions are never deleted by the service, only aged out by the Redis
//! TTL; webhook audit records live alongside them.

use crate::domain::payments::PaymentSession;
use crate::domain::webhooks::WebhookEvent;
use crate::shared::error::{AppError, AppResult};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::collections::HashMap;
use std::sync::Arc;

// Retention for session and audit rows in Redis.
const RETENTION_SECONDS: u64 = 48 * 3600;

/// Abstraction for persisting payment sessions and webhook audit records
#[derive(Clone)]
pub struct SessionStore {
    redis: Option<Arc<ConnectionManager>>, // optional; in-memory only if None
    sessions: Arc<tokio::sync::RwLock<HashMap<String, PaymentSession>>>,
    events: Arc<tokio::sync::RwLock<Vec<WebhookEvent>>>,
}

impl SessionStore {
    pub fn new(redis: Option<Arc<ConnectionManager>>) -> Self {
        Self {
            redis,
            sessions: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            events: Arc::new(tokio::sync::RwLock::new(Vec::new())),
        }
    }

    fn session_key(ref_id: &str) -> String {
        format!("payment_sessions:{}", ref_id)
    }

    fn event_key(event_id: &str) -> String {
        format!("webhook_events:{}", event_id)
    }

    /// Persist a session keyed by its reference id.
    pub async fn put(&self, session: &PaymentSession) -> AppResult<()> {
        let serialized = serde_json::to_vec(session)
            .map_err(|e| AppError::Internal(format!("serialize session: {}", e)))?;

        if let Some(redis) = &self.redis {
            let mut conn = (**redis).clone();
            let key = Self::session_key(&session.ref_id);
            let _: () = conn
                .set_ex(key, serialized, RETENTION_SECONDS)
                .await
                .map_err(|e| AppError::Internal(format!("redis set: {}", e)))?;
        }

        // Always mirror to memory
        self.sessions
            .write()
            .await
            .insert(session.ref_id.clone(), session.clone());
        Ok(())
    }

    /// Fetch a session by reference id.
    pub async fn get(&self, ref_id: &str) -> AppResult<Option<PaymentSession>> {
        if let Some(redis) = &self.redis {
            let mut conn = (**redis).clone();
            let key = Self::session_key(ref_id);
            let data: Option<Vec<u8>> = conn
                .get(key)
                .await
                .map_err(|e| AppError::Internal(format!("redis get: {}", e)))?;
            if let Some(bytes) = data {
                let session: PaymentSession = serde_json::from_slice(&bytes)
                    .map_err(|e| AppError::Internal(format!("deserialize session: {}", e)))?;
                // mirror to memory
                self.sessions
                    .write()
                    .await
                    .insert(ref_id.to_string(), session.clone());
                return Ok(Some(session));
            }
        }
        Ok(self.sessions.read().await.get(ref_id).cloned())
    }

    /// Record an inbound webhook for audit before it is processed.
    pub async fn record_event(&self, event: &WebhookEvent) -> AppResult<()> {
        if let Some(redis) = &self.redis {
            let serialized = serde_json::to_vec(event)
                .map_err(|e| AppError::Internal(format!("serialize webhook event: {}", e)))?;
            let mut conn = (**redis).clone();
            let _: () = conn
                .set_ex(Self::event_key(&event.id), serialized, RETENTION_SECONDS)
                .await
                .map_err(|e| AppError::Internal(format!("redis set: {}", e)))?;
        }

        self.events.write().await.push(event.clone());
        Ok(())
    }

    /// Mark a recorded webhook as processed, or attach its failure message.
    pub async fn mark_event_processed(
        &self,
        event_id: &str,
        error_message: Option<String>,
    ) -> AppResult<()> {
        let mut events = self.events.write().await;
        let Some(event) = events.iter_mut().find(|e| e.id == event_id) else {
            return Ok(());
        };
        event.processed = error_message.is_none();
        event.error_message = error_message;

        if let Some(redis) = &self.redis {
            let serialized = serde_json::to_vec(&*event)
                .map_err(|e| AppError::Internal(format!("serialize webhook event: {}", e)))?;
            let mut conn = (**redis).clone();
            let _: () = conn
                .set_ex(Self::event_key(event_id), serialized, RETENTION_SECONDS)
                .await
                .map_err(|e| AppError::Internal(format!("redis set: {}", e)))?;
        }
        Ok(())
    }

    /// Audit records received for a reference id.
    pub async fn events_for(&self, ref_id: &str) -> Vec<WebhookEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.ref_id == ref_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payments::{Currency, PaymentStatus};
    use chrono::{Duration, Utc};

    fn session(ref_id: &str) -> PaymentSession {
        let now = Utc::now();
        PaymentSession {
            id: uuid::Uuid::new_v4().to_string(),
            ref_id: ref_id.to_string(),
            lead_id: "l1".to_string(),
            report_id: "r1".to_string(),
            amount: 500.0,
            currency: Currency::Usd,
            description: "Growth report".to_string(),
            provider_payment_id: Some("pay_1".to_string()),
            payment_url: None,
            status: PaymentStatus::Pending,
            error_message: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            expires_at: now + Duration::hours(24),
        }
    }

    #[tokio::test]
    async fn test_put_and_get_round_trip() {
        let store = SessionStore::new(None);
        let session = session("l1-r1-1");
        store.put(&session).await.unwrap();

        let fetched = store.get("l1-r1-1").await.unwrap().unwrap();
        assert_eq!(fetched.ref_id, "l1-r1-1");
        assert_eq!(fetched.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_unknown_ref_id_is_none() {
        let store = SessionStore::new(None);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_by_ref_id() {
        let store = SessionStore::new(None);
        let mut session = session("l1-r1-1");
        store.put(&session).await.unwrap();

        session.status = PaymentStatus::Completed;
        store.put(&session).await.unwrap();

        let fetched = store.get("l1-r1-1").await.unwrap().unwrap();
        assert_eq!(fetched.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_event_audit_trail() {
        let store = SessionStore::new(None);
        let event = WebhookEvent::new(
            "payment.completed",
            "l1-r1-1",
            serde_json::json!({"event": "payment.completed"}),
        );
        let event_id = event.id.clone();
        store.record_event(&event).await.unwrap();

        let recorded = store.events_for("l1-r1-1").await;
        assert_eq!(recorded.len(), 1);
        assert!(!recorded[0].processed);

        store.mark_event_processed(&event_id, None).await.unwrap();
        let recorded = store.events_for("l1-r1-1").await;
        assert!(recorded[0].processed);

        store
            .mark_event_processed(&event_id, Some("store offline".to_string()))
            .await
            .unwrap();
        let recorded = store.events_for("l1-r1-1").await;
        assert!(!recorded[0].processed);
        assert_eq!(recorded[0].error_message.as_deref(), Some("store offline"));
    }
}
