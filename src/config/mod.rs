//! Configuration module

pub mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, LoggingConfig, PaymentsConfig, ProviderConfig, RateLimitConfig,
    ServerConfig, WebhookConfig,
};
