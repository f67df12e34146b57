use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes: require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Intake from the order-execution platform
        .route("/internal/fills", post(handlers::fills::ingest))
        .route("/internal/closes", post(handlers::fills::close))
        // Subscriptions
        .route(
            "/api/subscriptions",
            get(handlers::subscriptions::list).post(handlers::subscriptions::create),
        )
        .route(
            "/api/subscriptions/:id",
            get(handlers::subscriptions::detail)
                .put(handlers::subscriptions::update)
                .delete(handlers::subscriptions::cancel),
        )
        .route(
            "/api/subscriptions/:id/pause",
            post(handlers::subscriptions::pause),
        )
        .route(
            "/api/subscriptions/:id/resume",
            post(handlers::subscriptions::resume),
        )
        .route(
            "/api/subscriptions/:id/trades",
            get(handlers::subscriptions::trades),
        )
        // Fraud alerts
        .route("/api/alerts", get(handlers::alerts::list))
        .route("/api/alerts/:id", get(handlers::alerts::detail))
        .route("/api/alerts/:id/status", post(handlers::alerts::set_status))
        // Traders
        .route("/api/traders/:id/risk", get(handlers::traders::risk))
        .route("/api/traders/:id/analyze", post(handlers::traders::analyze))
        // Control
        .route("/api/control/stop", post(handlers::control::stop))
        .route("/api/control/resume", post(handlers::control::resume))
        .route("/api/control/status", get(handlers::control::status))
        .layer(middleware::from_fn(require_auth));

    // CORS: allow same-origin + common dashboard origins
    let cors = CorsLayer::new()
        .allow_origin(Any) // nginx proxies from same origin; direct API access needs token
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
