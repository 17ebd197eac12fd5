//! HTTP server implementation
//!
//! This module wires adapters into services and services into routes. The
//! service is designed to run behind a reverse proxy that terminates SSL.

use crate::{
    application::services::session_service::PaymentSessionService,
    application::services::webhook_service::WebhookDispatcher,
    config::AppConfig,
    infrastructure::adapters::provider_client::{PaxosProviderClient, ProviderApi},
    infrastructure::adapters::report_unlock::{LoggingReportUnlock, ReportUnlock},
    infrastructure::adapters::session_store::SessionStore,
    infrastructure::adapters::token_manager::{PaxosOAuthEndpoint, TokenManager},
    infrastructure::http::routes::{handle_rejection, HealthRoutes, PaymentRoutes},
    shared::error::{AppError, AppResult},
    shared::metrics::PaymentMetrics,
};
use std::sync::Arc;
use tracing::{info, instrument};
use warp::{Filter, Reply};

/// HTTP server for the payment session service
pub struct HttpServer {
    config: AppConfig,
    session_service: Arc<PaymentSessionService>,
    webhook_dispatcher: Arc<WebhookDispatcher>,
    metrics: Arc<PaymentMetrics>,
}

impl HttpServer {
    /// Create a new server with the production provider client and the
    /// logging unlock callback
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let config_arc = Arc::new(config.clone());

        let token_endpoint = Arc::new(PaxosOAuthEndpoint::new(config_arc.clone())?);
        let tokens = Arc::new(TokenManager::new(
            token_endpoint,
            config.payments.token_safety_margin_seconds,
        ));
        let provider: Arc<dyn ProviderApi> =
            Arc::new(PaxosProviderClient::new(config_arc, tokens)?);

        Self::with_adapters(config, provider, Arc::new(LoggingReportUnlock)).await
    }

    /// Create a server with injected provider and unlock adapters. Embedding
    /// applications use this to supply their own report unlock hook.
    pub async fn with_adapters(
        config: AppConfig,
        provider: Arc<dyn ProviderApi>,
        unlock: Arc<dyn ReportUnlock>,
    ) -> AppResult<Self> {
        let config_arc = Arc::new(config.clone());

        let redis = if config.cache.enabled {
            let client = redis::Client::open(config.cache.redis_url.as_str())
                .map_err(|e| AppError::Config(format!("Invalid redis URL: {}", e)))?;
            let manager = client
                .get_connection_manager()
                .await
                .map_err(|e| AppError::Config(format!("Failed to connect to redis: {}", e)))?;
            Some(Arc::new(manager))
        } else {
            None
        };

        let metrics = Arc::new(PaymentMetrics::new());
        let store = Arc::new(SessionStore::new(redis));

        let session_service = Arc::new(PaymentSessionService::new(
            config_arc.clone(),
            provider,
            store.clone(),
            metrics.clone(),
        ));
        let webhook_dispatcher = Arc::new(WebhookDispatcher::new(
            config_arc,
            session_service.clone(),
            store,
            unlock,
            metrics.clone(),
        ));

        Ok(Self {
            config,
            session_service,
            webhook_dispatcher,
            metrics,
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the HTTP server
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let addr = self.config.server_address();
        let addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;

        info!("Starting HTTP server on {}", addr);

        let routes = self.create_routes();
        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Create the application routes
    pub fn create_routes(
        self,
    ) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        let payments = PaymentRoutes::create_routes(
            self.config.clone(),
            self.session_service,
            self.webhook_dispatcher,
        );
        let health = HealthRoutes::create_routes(self.metrics);

        payments.or(health).recover(handle_rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::provider_client::{
        PaxosPaymentRequest, ProviderPayment,
    };
    use async_trait::async_trait;
    use serde_json::Value;

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
                payment_url: Some("https://pay.example.com/pay_1".to_string()),
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

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        config.cache.enabled = false;
        config
    }

    async fn test_routes(
    ) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        let server = HttpServer::with_adapters(
            test_config(),
            Arc::new(StubProvider),
            Arc::new(LoggingReportUnlock),
        )
        .await
        .unwrap();
        server.create_routes()
    }

    #[tokio::test]
    async fn test_create_payment_returns_201() {
        let routes = test_routes().await;

        let response = warp::test::request()
            .method("POST")
            .path("/payments")
            .json(&serde_json::json!({
                "amount": 500.00,
                "currency": "USD",
                "description": "Growth report",
                "reportId": "r1",
                "leadId": "l1"
            }))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 201);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        let ref_id = body["refId"].as_str().unwrap();
        assert!(regex::Regex::new(r"^l1-r1-\d+$").unwrap().is_match(ref_id));
        assert_eq!(
            body["paymentUrl"].as_str().unwrap(),
            "https://pay.example.com/pay_1"
        );
        assert!(body["expiresAt"].is_string());
    }

    #[tokio::test]
    async fn test_create_payment_validation_failure_returns_400() {
        let routes = test_routes().await;

        let response = warp::test::request()
            .method("POST")
            .path("/payments")
            .json(&serde_json::json!({
                "amount": -1,
                "currency": "USD",
                "description": "Growth report",
                "reportId": "r1",
                "leadId": "l1"
            }))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 400);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["error"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn test_create_payment_without_credentials_returns_503() {
        // Production wiring with no configured credentials: the token
        // manager fails before any network call is attempted.
        let server = HttpServer::new(test_config()).await.unwrap();
        let routes = server.create_routes();

        let response = warp::test::request()
            .method("POST")
            .path("/payments")
            .json(&serde_json::json!({
                "amount": 500.00,
                "currency": "USD",
                "description": "Growth report",
                "reportId": "r1",
                "leadId": "l1"
            }))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_status_without_ref_id_returns_400() {
        let routes = test_routes().await;

        let response = warp::test::request()
            .method("GET")
            .path("/payments/status")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_status_for_unknown_session_returns_404() {
        let routes = test_routes().await;

        let response = warp::test::request()
            .method("GET")
            .path("/payments/status?refId=l9-r9-123")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_webhook_always_returns_200() {
        let routes = test_routes().await;

        let response = warp::test::request()
            .method("POST")
            .path("/payments/webhook")
            .body("not json")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["received"], true);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_webhook_for_unknown_ref_id_is_acknowledged() {
        let routes = test_routes().await;

        let response = warp::test::request()
            .method("POST")
            .path("/payments/webhook")
            .json(&serde_json::json!({
                "event": "payment.completed",
                "data": {"ref_id": "l9-r9-999", "payment_amount": 500, "status": "completed"}
            }))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["received"], true);
        assert!(body["error"].is_null());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let routes = test_routes().await;

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_metrics_endpoint_counts_sessions() {
        let routes = test_routes().await;

        warp::test::request()
            .method("POST")
            .path("/payments")
            .json(&serde_json::json!({
                "amount": 500.00,
                "currency": "USD",
                "description": "Growth report",
                "reportId": "r1",
                "leadId": "l1"
            }))
            .reply(&routes)
            .await;

        let response = warp::test::request()
            .method("GET")
            .path("/metrics")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["sessions_created"], 1);
    }
}
