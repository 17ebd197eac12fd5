//! Paxos API client
//!
//! Typed, authenticated transport to the payment provider. All wire-format
//! knowledge lives here: request shapes, the statements listing, and the
//! mapping from provider-native status strings to the internal enum.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::payments::PaymentStatus;
use crate::infrastructure::adapters::token_manager::TokenManager;
use crate::shared::error::{AppError, AppResult};

/// Payment creation request sent to the provider. `amount` is a fixed-point
/// decimal string with two fraction digits; `ref_id` must be unique per
/// attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PaxosPaymentRequest {
    pub amount: String,
    pub currency: String,
    pub description: String,
    pub ref_id: String,
}

/// Normalized provider payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPayment {
    pub id: String,
    pub ref_id: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub payment_url: Option<String>,
    pub created_at: String,
}

/// One row of the provider's statements listing
#[derive(Debug, Clone, Deserialize)]
pub struct PaxosStatementEntry {
    pub id: String,
    pub ref_id: String,
    pub payment_amount: String,
    pub payment_status: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaxosStatementListResponse {
    #[serde(default)]
    payments: Vec<PaxosStatementEntry>,
}

/// Map a provider-native payment status onto the internal enum.
///
/// Unrecognized statuses resolve to `pending` rather than erroring: the
/// provider may introduce new statuses before this client learns them, and
/// assuming success or failure on unknown input would be worse than waiting.
/// The fallback is logged so operators notice the gap.
pub fn map_provider_status(native: &str) -> PaymentStatus {
    match native {
        "PAYMENT_STATUS_PENDING" => PaymentStatus::Pending,
        "PAYMENT_STATUS_PROCESSING" => PaymentStatus::Processing,
        "PAYMENT_STATUS_COMPLETED" => PaymentStatus::Completed,
        "PAYMENT_STATUS_FAILED" => PaymentStatus::Failed,
        "PAYMENT_STATUS_CANCELLED" => PaymentStatus::Cancelled,
        other => {
            warn!(
                native_status = %other,
                "Unrecognized provider payment status, treating as pending"
            );
            PaymentStatus::Pending
        }
    }
}

/// Provider payment API
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Create a remote payment. Failures may have had side effects on the
    /// provider side, so callers retry only with a fresh `ref_id`.
    async fn create_payment(&self, request: PaxosPaymentRequest) -> AppResult<ProviderPayment>;

    /// Look up a payment by reference id. `None` means the provider has no
    /// matching payment, which is a normal negative result, not an error.
    async fn get_payment_by_ref_id(&self, ref_id: &str) -> AppResult<Option<ProviderPayment>>;
}

/// Production client for the Paxos payment API
pub struct PaxosProviderClient {
    config: Arc<AppConfig>,
    tokens: Arc<TokenManager>,
    client: reqwest::Client,
}

impl PaxosProviderClient {
    pub fn new(config: Arc<AppConfig>, tokens: Arc<TokenManager>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.provider.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            tokens,
            client,
        })
    }

    /// Query the statements endpoint for the given reference ids.
    pub async fn list_payments(&self, ref_ids: &[&str]) -> AppResult<Vec<PaxosStatementEntry>> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}/statements/payments", self.config.provider.api_base_url);
        let query: Vec<(&str, &str)> = ref_ids.iter().map(|id| ("ref_ids[]", *id)).collect();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::provider_transport(format!("statements request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider_http(status.as_u16(), body));
        }

        let list: PaxosStatementListResponse = response
            .json()
            .await
            .map_err(|e| AppError::Json(format!("invalid statements response: {}", e)))?;

        Ok(list.payments)
    }
}

#[async_trait]
impl ProviderApi for PaxosProviderClient {
    async fn create_payment(&self, request: PaxosPaymentRequest) -> AppResult<ProviderPayment> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}/payments", self.config.provider.api_base_url);

        info!(
            ref_id = %request.ref_id,
            amount = %request.amount,
            currency = %request.currency,
            "Creating provider payment"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::provider_transport(format!("payment creation failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider_http(status.as_u16(), body));
        }

        let payment: ProviderPayment = response
            .json()
            .await
            .map_err(|e| AppError::Json(format!("invalid payment response: {}", e)))?;

        info!(
            ref_id = %payment.ref_id,
            provider_payment_id = %payment.id,
            "Provider payment created"
        );

        Ok(payment)
    }

    async fn get_payment_by_ref_id(&self, ref_id: &str) -> AppResult<Option<ProviderPayment>> {
        let entries = self.list_payments(&[ref_id]).await?;

        Ok(entries.into_iter().find(|e| e.ref_id == ref_id).map(|entry| {
            ProviderPayment {
                id: entry.id,
                ref_id: entry.ref_id,
                amount: entry.payment_amount,
                // Statement rows carry no currency; payments settle in USD.
                currency: "USD".to_string(),
                status: entry.payment_status,
                payment_url: None,
                created_at: entry.created_at,
            }
        }))
    }
}
