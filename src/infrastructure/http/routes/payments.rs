//! Payments routes

use std::sync::Arc;
use warp::Filter;

use crate::application::services::session_service::PaymentSessionService;
use crate::application::services::webhook_service::WebhookDispatcher;
use crate::config::AppConfig;
use crate::infrastructure::http::handlers::{
    handle_create_payment, handle_payment_status, handle_webhook,
};
use crate::infrastructure::http::models::StatusQuery;
use crate::middleware::rate_limit;

pub struct PaymentRoutes;

impl PaymentRoutes {
    pub fn create_routes(
        config: AppConfig,
        service: Arc<PaymentSessionService>,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        // Caller-facing endpoints share one limiter; the webhook endpoint is
        // exempt so provider deliveries are never throttled into retries.
        let rate_limit = rate_limit::create_rate_limit_layer(&config);

        let create = warp::path("payments")
            .and(warp::path::end())
            .and(warp::post())
            .and(rate_limit.clone())
            .and(warp::body::content_length_limit(config.server.max_request_size as u64))
            .and(warp::body::json())
            .and(Self::with_service(service.clone()))
            .and_then(handle_create_payment);

        let status = warp::path("payments")
            .and(warp::path("status"))
            .and(warp::path::end())
            .and(warp::get())
            .and(rate_limit)
            .and(warp::query::<StatusQuery>())
            .and(Self::with_service(service))
            .and_then(handle_payment_status);

        let webhook = warp::path("payments")
            .and(warp::path("webhook"))
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::content_length_limit(config.server.max_request_size as u64))
            .and(warp::body::bytes())
            .and(warp::header::optional::<String>("x-paxos-signature"))
            .and(Self::with_dispatcher(dispatcher))
            .and_then(handle_webhook);

        create.or(status).or(webhook)
    }

    fn with_service(
        service: Arc<PaymentSessionService>,
    ) -> impl Filter<Extract = (Arc<PaymentSessionService>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || service.clone())
    }

    fn with_dispatcher(
        dispatcher: Arc<WebhookDispatcher>,
    ) -> impl Filter<Extract = (Arc<WebhookDispatcher>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || dispatcher.clone())
    }
}
