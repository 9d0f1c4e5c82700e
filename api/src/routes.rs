use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_timeout = state.config.server.request_timeout();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/templates",
            post(handlers::templates::create_template).put(handlers::templates::create_template),
        )
        .route(
            "/templates/:template/jobs",
            post(handlers::jobs::create_job),
        )
        .route(
            "/templates/:template/jobs/*path",
            post(handlers::jobs::create_job_at_path),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors),
        )
        .with_state(state)
}
