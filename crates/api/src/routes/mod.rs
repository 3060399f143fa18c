//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod events;
pub mod health;
pub mod statistics;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(statistics::routes())
        .merge(events::routes())
}
