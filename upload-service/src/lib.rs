pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod oidc;
pub mod store;
pub mod tokenless;

use std::sync::Arc;

use service_core::axum::{routing::get, Json, Router};
use service_core::error::AppError;
use tower_http::trace::TraceLayer;

use crate::auth::chain::AuthenticationChain;
use crate::config::UploadConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<UploadConfig>,
    pub chain: Arc<AuthenticationChain>,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/upload/*path",
            get(handlers::authorize_upload).post(handlers::authorize_upload),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ));

    Ok(app)
}

pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    }))
}
