//! Health and metrics HTTP handlers

use std::sync::Arc;
use warp::Reply;

use crate::shared::metrics::PaymentMetrics;

pub async fn handle_health_request() -> Result<impl Reply, warp::reject::Rejection> {
    let health = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Ok(warp::reply::json(&health))
}

pub async fn handle_metrics_request(
    metrics: Arc<PaymentMetrics>,
) -> Result<impl Reply, warp::reject::Rejection> {
    Ok(warp::reply::json(&metrics.snapshot()))
}
