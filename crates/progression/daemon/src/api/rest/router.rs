//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let player_routes = Router::new()
        .route("/profile", get(handlers::get_profile))
        .route("/ledger", get(handlers::get_ledger))
        .route("/assessments/sync", post(handlers::sync_assessment))
        .route("/evaluation", get(handlers::get_evaluation))
        .route("/upgrade", post(handlers::approve_upgrade))
        .route("/badges", post(handlers::grant_badge))
        .route("/identity-key", put(handlers::set_identity_key));

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/academies/:academy/players/:player", player_routes);

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
