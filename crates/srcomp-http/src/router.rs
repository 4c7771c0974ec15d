//! Axum router construction for the API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled so scoreboards and displays can fetch from any origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the API server.
///
/// See [`handlers`] for the endpoint table. The API is read-only, so only
/// `GET` is routed.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        // Resources
        .route("/arenas", get(handlers::list_arenas))
        .route("/arenas/{name}", get(handlers::get_arena))
        .route("/arenas/{name}/current", get(handlers::arena_current))
        .route("/corners", get(handlers::list_corners))
        .route("/corners/{number}", get(handlers::get_corner))
        .route("/teams", get(handlers::list_teams))
        .route("/teams/{tla}", get(handlers::get_team))
        // Schedule
        .route("/matches", get(handlers::list_matches))
        .route("/matches/last_scored", get(handlers::last_scored))
        .route("/matches/periods", get(handlers::periods))
        .route("/current", get(handlers::current))
        .route("/knockout", get(handlers::knockout))
        // Scores and metadata
        .route("/scores/league", get(handlers::league_scores))
        .route("/state", get(handlers::state_label))
        .route("/config", get(handlers::config))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
