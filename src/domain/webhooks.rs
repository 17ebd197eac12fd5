//! Webhook domain models and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Known provider webhook event types, with an explicit fallback arm for
/// anything the provider introduces later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    PaymentCompleted,
    PaymentFailed,
    PaymentPending,
    PaymentCancelled,
    Unknown(String),
}

impl WebhookEventType {
    pub fn parse(event: &str) -> Self {
        match event {
            "payment.completed" => WebhookEventType::PaymentCompleted,
            "payment.failed" => WebhookEventType::PaymentFailed,
            "payment.pending" => WebhookEventType::PaymentPending,
            "payment.cancelled" => WebhookEventType::PaymentCancelled,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::PaymentCompleted => "payment.completed",
            WebhookEventType::PaymentFailed => "payment.failed",
            WebhookEventType::PaymentPending => "payment.pending",
            WebhookEventType::PaymentCancelled => "payment.cancelled",
            WebhookEventType::Unknown(other) => other,
        }
    }
}

/// Event payload data as delivered by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub ref_id: String,
    #[serde(default)]
    pub payment_amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Inbound webhook payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub data: WebhookData,
}

/// Audit record for one received webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub ref_id: String,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub error_message: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn new(event_type: &str, ref_id: &str, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            ref_id: ref_id.to_string(),
            payload,
            processed: false,
            error_message: None,
            received_at: Utc::now(),
        }
    }
}
