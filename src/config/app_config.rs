//! Application configuration structures
//!
//! This module contains the main configuration structures for the service.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use validator::Validate;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server address to bind to
    pub bind_address: IpAddr,

    /// Server port
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    /// Maximum request size in bytes
    #[validate(range(min = 1024, max = 10485760))] // 1KB to 10MB
    pub max_request_size: usize,
}

/// Payment provider (Paxos/Paxum) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProviderConfig {
    /// OAuth2 token endpoint
    #[validate(url)]
    pub oauth_url: String,

    /// Payment API base URL
    #[validate(url)]
    pub api_base_url: String,

    /// OAuth2 client id. Absence is surfaced as a configuration error on
    /// first use, not at startup, so the rest of the service stays up.
    pub client_id: Option<String>,

    /// OAuth2 client secret
    pub client_secret: Option<String>,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,

    /// Base URL used to compose a hosted payment URL when the provider
    /// omits one from its response
    #[validate(url)]
    pub payment_url_base: String,
}

/// Payment session behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentsConfig {
    /// Session TTL in hours; a still-pending session past this age reads as expired
    #[validate(range(min = 1, max = 168))]
    pub session_ttl_hours: u64,

    /// Safety margin subtracted from provider token lifetimes (seconds)
    #[validate(range(min = 0, max = 600))]
    pub token_safety_margin_seconds: u64,
}

/// Webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebhookConfig {
    /// Shared secret for webhook signature verification; verification is
    /// skipped entirely when unset
    pub secret: Option<String>,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateLimitConfig {
    /// Requests per minute
    #[validate(range(min = 1, max = 10000))]
    pub requests_per_minute: u32,

    /// Burst size
    #[validate(range(min = 1, max = 1000))]
    pub burst_size: u32,

    /// Enable rate limiting
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level
    #[validate(length(min = 1))]
    pub level: String,
}

/// Session store cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Enable the Redis-backed store (in-memory only when disabled)
    pub enabled: bool,

    /// Redis connection URL
    #[validate(url)]
    pub redis_url: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Payment provider configuration
    pub provider: ProviderConfig,

    /// Payment session behaviour
    pub payments: PaymentsConfig,

    /// Webhook configuration
    pub webhook: WebhookConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Session store cache configuration
    pub cache: CacheConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".parse().unwrap(),
                port: 8080,
                max_request_size: 64 * 1024, // 64KB
            },
            provider: ProviderConfig {
                oauth_url: "https://oauth.paxos.com/oauth2/token".to_string(),
                api_base_url: "https://api.sandbox.paxos.com/v2".to_string(),
                client_id: None,
                client_secret: None,
                timeout_seconds: 30,
                payment_url_base: "https://pay.paxum.com/pay".to_string(),
            },
            payments: PaymentsConfig {
                session_ttl_hours: 24,
                token_safety_margin_seconds: 60,
            },
            webhook: WebhookConfig { secret: None },
            rate_limit: RateLimitConfig {
                requests_per_minute: 600,
                burst_size: 50,
                enabled: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            cache: CacheConfig {
                enabled: false,
                redis_url: "redis://127.0.0.1:6379".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("Conf").required(false))
            .add_source(config::Environment::with_prefix("IGNITIA_PAY").separator("__"))
            .build()
            .map_err(|e| crate::shared::error::AppError::Config(format!("Failed to build configuration: {}", e)))?;

        let config: AppConfig = config.try_deserialize()
            .map_err(|e| crate::shared::error::AppError::Config(format!("Failed to deserialize configuration: {}", e)))?;

        config.validate_config()
            .map_err(|e| crate::shared::error::AppError::Validation(format!("Configuration validation failed: {}", e)))?;

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_config(&self) -> Result<(), validator::ValidationErrors> {
        self.server.validate()?;
        self.provider.validate()?;
        self.payments.validate()?;
        self.webhook.validate()?;
        self.rate_limit.validate()?;
        self.logging.validate()?;
        self.cache.validate()?;

        Ok(())
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    /// Whether provider credentials are present
    pub fn has_provider_credentials(&self) -> bool {
        matches!(
            (&self.provider.client_id, &self.provider.client_secret),
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty()
        )
    }
}
