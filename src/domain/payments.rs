//! Payments domain models and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported settlement currencies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "CAD" => Ok(Currency::Cad),
            "AUD" => Ok(Currency::Aud),
            _ => Err(format!("unsupported currency: {}", s)),
        }
    }
}

/// Payment session status
///
/// Success path is `pending -> processing -> completed`; `failed` and
/// `cancelled` may be reached from either non-terminal state, and `expired`
/// is the time-based exit from `pending`. The four terminal states are final:
/// a session in one of them never transitions again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed
                | PaymentStatus::Failed
                | PaymentStatus::Cancelled
                | PaymentStatus::Expired
        )
    }

    // Ordering rank used to discard stale updates: a transition only moves
    // forward. Terminal states share the top rank so none replaces another.
    fn rank(&self) -> u8 {
        match self {
            PaymentStatus::Pending => 0,
            PaymentStatus::Processing => 1,
            _ => 2,
        }
    }

    /// Whether a reconciliation from `self` to `next` is permitted.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Expired => "expired",
        }
    }
}

/// Payment session persisted in the store
///
/// One session tracks one attempted purchase of a paid report from creation
/// to terminal outcome. `ref_id` is assigned once at creation and is the
/// only key usable to correlate provider webhooks with a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub id: String,
    pub ref_id: String,
    pub lead_id: String,
    pub report_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub description: String,
    pub provider_payment_id: Option<String>,
    pub payment_url: Option<String>,
    pub status: PaymentStatus,
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl PaymentSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Guarded status transition. The terminal/ordering check runs as a
    /// precondition before any field is written, so a stale update (for
    /// example a `pending` webhook delivered after `completed` was recorded)
    /// leaves the session untouched. Returns whether the transition applied.
    pub fn apply_status(&mut self, next: PaymentStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        if next == PaymentStatus::Completed {
            self.completed_at = Some(now);
        }
        true
    }
}
