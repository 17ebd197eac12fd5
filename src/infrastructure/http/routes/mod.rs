//! HTTP routes module

pub mod health;
pub mod payments;

pub use health::HealthRoutes;
pub use payments::PaymentRoutes;

use crate::infrastructure::http::models::ErrorBody;
use crate::shared::error::AppError;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::Reply;

/// Map rejections onto the JSON error body the rest of the API uses.
pub async fn handle_rejection(
    err: warp::reject::Rejection,
) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(app_error) = err.find::<AppError>() {
        (app_error.http_status_code(), app_error.to_string())
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody::new(message)),
        status,
    ))
}
