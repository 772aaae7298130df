use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{convert, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;

    // Browser client; unknown paths fall through to 404
    let serve_dir = ServeDir::new(&server.static_dir);
    let body_limit = server.max_body_bytes;

    Router::new()
        // Operational
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Conversion
        .route("/convert-single", post(convert::convert_single))
        .route("/convert-and-zip", post(convert::convert_and_zip))
        .fallback_service(serve_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
