//! Infrastructure adapters module
//!
//! This module contains adapters for external services and infrastructure concerns.

pub mod provider_client;
pub mod report_unlock;
pub mod session_store;
pub mod token_manager;

// Re-export all adapters
pub use provider_client::{
    map_provider_status, PaxosPaymentRequest, PaxosProviderClient, PaxosStatementEntry,
    ProviderApi, ProviderPayment,
};
pub use report_unlock::{LoggingReportUnlock, ReportUnlock};
pub use session_store::SessionStore;
pub use token_manager::{PaxosOAuthEndpoint, TokenEndpoint, TokenInfo, TokenManager, TokenResponse};
