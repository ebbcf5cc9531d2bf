use axum::extract::DefaultBodyLimit;
use axum::routing::any;
use axum::Router;
use http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::config::{ConfigError, ServerConfig};
use crate::handler::{upload, AppState};
use crate::policy::FormConfig;

pub const UPLOAD_PATH: &str = "/upload";

/// Cross-origin callers: listed origins only, POST with a `Content-Type` header, no credentials.
pub fn cors_layer(config: &FormConfig) -> Result<CorsLayer, ConfigError> {
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.origin_headers()?))
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(false))
}

pub fn router(state: AppState, server: &ServerConfig) -> Result<Router, ConfigError> {
    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        .route(UPLOAD_PATH, any(upload))
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors)
        .with_state(state))
}
