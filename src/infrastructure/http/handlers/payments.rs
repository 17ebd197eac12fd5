//! Payments HTTP handlers

use bytes::Bytes;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Reply;

use crate::application::services::session_service::{CreateSessionRequest, PaymentSessionService};
use crate::application::services::webhook_service::WebhookDispatcher;
use crate::infrastructure::http::models::{ErrorBody, StatusQuery};
use crate::shared::error::AppError;

fn error_reply(error: AppError) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ErrorBody::new(error.to_string())),
        error.http_status_code(),
    )
}

pub async fn handle_create_payment(
    body: CreateSessionRequest,
    service: Arc<PaymentSessionService>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let response = match service.create_session(body).await {
        Ok(response) => warp::reply::with_status(
            warp::reply::json(&response),
            StatusCode::CREATED,
        ),
        Err(e) => error_reply(e),
    };
    Ok(response)
}

pub async fn handle_payment_status(
    query: StatusQuery,
    service: Arc<PaymentSessionService>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let Some(ref_id) = query.ref_id.filter(|id| !id.is_empty()) else {
        return Ok(error_reply(AppError::Validation(
            "missing required parameter: refId".to_string(),
        )));
    };

    let response = match service.get_status(&ref_id).await {
        Ok(view) => warp::reply::with_status(warp::reply::json(&view), StatusCode::OK),
        Err(e) => error_reply(e),
    };
    Ok(response)
}

/// Webhook deliveries are always acknowledged with a 200 so the provider
/// never piles up redeliveries; processing failures surface only in the
/// acknowledgement's diagnostic field and the logs.
pub async fn handle_webhook(
    body: Bytes,
    signature: Option<String>,
    dispatcher: Arc<WebhookDispatcher>,
) -> Result<impl Reply, warp::reject::Rejection> {
    let ack = dispatcher.handle(&body, signature.as_deref()).await;
    Ok(warp::reply::with_status(
        warp::reply::json(&ack),
        StatusCode::OK,
    ))
}
