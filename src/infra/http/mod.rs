pub mod api;
mod middleware;

pub use api::ApiState;
pub use middleware::RequestContext;

use std::time::Duration;

use axum::{Router, middleware as axum_middleware, routing::get};

use middleware::{log_responses, request_timeout, set_request_context};

async fn health_check() -> &'static str {
    "OK"
}

/// Full HTTP surface: the resource API plus `/health-check`, wrapped in request-id,
/// response logging and timeout middleware.
pub fn build_router(state: ApiState, timeout: Duration) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .merge(api::build_api_router(state))
        .layer(axum_middleware::from_fn_with_state(timeout, request_timeout))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
