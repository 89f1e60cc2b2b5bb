//! Liveness endpoint

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::AppState;
use crate::services::error::ApiResponse;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/healthcheck", get(healthcheck))
}

async fn healthcheck() -> ApiResponse<&'static str> {
    ApiResponse::ok("ok", "Service is healthy")
}
