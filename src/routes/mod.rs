use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::state::AppState;

pub mod library;
pub mod movies;
pub mod users;
pub mod watchlists;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Users
        .route("/users", post(users::create).get(users::list))
        .route("/users/:user_id", get(users::get))
        // Movie catalog
        .route("/movies/search", get(movies::search))
        .route("/movies/:movie_id", get(movies::get))
        .route("/movies/import/:external_id", post(movies::import))
        // Library
        .route(
            "/users/:user_id/library",
            post(library::add).get(library::list),
        )
        .route(
            "/users/:user_id/library/:entry_id",
            delete(library::remove),
        )
        .route(
            "/users/:user_id/library/:entry_id/status",
            patch(library::update_status),
        )
        .route(
            "/users/:user_id/library/:entry_id/rating",
            patch(library::update_rating),
        )
        .route(
            "/users/:user_id/library/:entry_id/liked",
            patch(library::update_liked),
        )
        // Watchlists
        .route(
            "/users/:user_id/watchlists",
            post(watchlists::create).get(watchlists::list),
        )
        .route(
            "/watchlists/:watchlist_id",
            get(watchlists::get).delete(watchlists::remove),
        )
        .route("/watchlists/:watchlist_id/items", post(watchlists::add_item))
        .route(
            "/watchlists/:watchlist_id/items/reorder",
            patch(watchlists::reorder),
        )
        .route(
            "/watchlists/:watchlist_id/items/:item_id",
            delete(watchlists::remove_item),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
