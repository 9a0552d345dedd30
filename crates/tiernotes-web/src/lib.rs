use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod models;
pub mod settings;
pub mod state;
pub mod upload;

pub use settings::ServerSettings;
pub use state::AppState;

/// Build the application router.
///
/// Fails only when the configured CORS origin is not a valid header value.
pub fn router(state: Arc<AppState>, settings: &ServerSettings) -> anyhow::Result<Router> {
    let origin = if settings.cors_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(HeaderValue::from_str(settings.cors_origin.trim())?)
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/api/uploads", post(handlers::uploads::upload))
        .route("/api/health", get(handlers::health::health))
        .layer(DefaultBodyLimit::max(settings.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
