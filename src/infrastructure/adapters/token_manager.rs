//! OAuth2 token manager for the payment provider
//!
//! This adapter acquires client-credential bearer tokens from the provider's
//! token endpoint and caches them in an explicit slot. It is the single
//! source of truth for a valid token; the raw token string never leaves the
//! token manager / provider client boundary.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::shared::error::{AppError, AppResult};

/// Provider token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Cached bearer credential
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Diagnostic view of the cache; exposes expiry but never the token itself
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub has_token: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Abstraction over the provider's token endpoint
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn request_token(&self) -> AppResult<TokenResponse>;
}

/// Production token endpoint performing the OAuth2 client-credentials
/// exchange against the configured provider
pub struct PaxosOAuthEndpoint {
    config: Arc<AppConfig>,
    client: reqwest::Client,
}

impl PaxosOAuthEndpoint {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.provider.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TokenEndpoint for PaxosOAuthEndpoint {
    async fn request_token(&self) -> AppResult<TokenResponse> {
        let provider = &self.config.provider;

        if !self.config.has_provider_credentials() {
            return Err(AppError::Config(
                "Provider credentials are not configured: client id and client secret are required"
                    .to_string(),
            ));
        }
        let client_id = provider.client_id.as_deref().unwrap_or_default();
        let client_secret = provider.client_secret.as_deref().unwrap_or_default();

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        let response = self
            .client
            .post(&provider.oauth_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::provider_transport(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderAuth {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::Json(format!("invalid token endpoint response: {}", e)))
    }
}

/// Token manager with an injected endpoint and an explicit cache slot
pub struct TokenManager {
    endpoint: Arc<dyn TokenEndpoint>,
    safety_margin: Duration,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(endpoint: Arc<dyn TokenEndpoint>, safety_margin_seconds: u64) -> Self {
        Self {
            endpoint,
            safety_margin: Duration::seconds(safety_margin_seconds as i64),
            cache: Mutex::new(None),
        }
    }

    /// Return a valid bearer token, reusing the cached one while it is
    /// inside its validity window. The cache lock is held across the
    /// refresh, so concurrent callers hitting an expired slot produce a
    /// single token request.
    pub async fn get_token(&self) -> AppResult<String> {
        let mut slot = self.cache.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Utc::now() {
                debug!("Reusing cached provider token");
                return Ok(cached.access_token.clone());
            }
        }

        let response = self.endpoint.request_token().await?;
        // The margin is applied at store time, so the reuse check above is a
        // plain expiry comparison.
        let expires_at =
            Utc::now() + Duration::seconds(response.expires_in as i64) - self.safety_margin;

        info!(expires_at = %expires_at, "Acquired new provider token");

        *slot = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at,
        });

        Ok(response.access_token)
    }

    /// Discard any cached token, forcing the next `get_token` to
    /// re-authenticate
    pub async fn clear_cache(&self) {
        *self.cache.lock().await = None;
    }

    /// Cache state for diagnostics
    pub async fn token_info(&self) -> TokenInfo {
        match self.cache.lock().await.as_ref() {
            Some(cached) => TokenInfo {
                has_token: true,
                expires_at: Some(cached.expires_at),
            },
            None => TokenInfo {
                has_token: false,
                expires_at: None,
            },
        }
    }
}
