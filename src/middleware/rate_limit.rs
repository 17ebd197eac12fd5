//! Rate limiting middleware

use crate::config::AppConfig;
use crate::shared::error::AppError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use warp::Filter;

/// Create a rate limiting filter based on configuration. The filter extracts
/// nothing and rejects with `AppError::RateLimit` once the quota is
/// exhausted; with rate limiting disabled it always passes.
pub fn create_rate_limit_layer(
    config: &AppConfig,
) -> impl Filter<Extract = (), Error = warp::reject::Rejection> + Clone {
    let limiter: Option<Arc<DefaultDirectRateLimiter>> = if config.rate_limit.enabled {
        let per_minute = NonZeroU32::new(config.rate_limit.requests_per_minute)
            .unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.rate_limit.burst_size).unwrap_or(NonZeroU32::MIN);
        Some(Arc::new(RateLimiter::direct(
            Quota::per_minute(per_minute).allow_burst(burst),
        )))
    } else {
        None
    };

    warp::any()
        .and_then(move || {
            let limiter = limiter.clone();
            async move {
                if let Some(limiter) = limiter {
                    if limiter.check().is_err() {
                        return Err(warp::reject::custom(AppError::RateLimit));
                    }
                }
                Ok(())
            }
        })
        .untuple_one()
}
