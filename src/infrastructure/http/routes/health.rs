//! Health and metrics routes

use std::sync::Arc;
use warp::Filter;

use crate::infrastructure::http::handlers::{handle_health_request, handle_metrics_request};
use crate::shared::metrics::PaymentMetrics;

pub struct HealthRoutes;

impl HealthRoutes {
    pub fn create_routes(
        metrics: Arc<PaymentMetrics>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and_then(handle_health_request);

        let metrics_route = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .and(Self::with_metrics(metrics))
            .and_then(handle_metrics_request);

        health.or(metrics_route)
    }

    fn with_metrics(
        metrics: Arc<PaymentMetrics>,
    ) -> impl Filter<Extract = (Arc<PaymentMetrics>,), Error = std::convert::Infallible> + Clone
    {
        warp::any().map(move || metrics.clone())
    }
}
