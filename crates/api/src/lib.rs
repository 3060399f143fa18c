//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Statistics lookup and search routes
//! - The administrative recalculation endpoint
//! - The ledger event ingestion endpoint
//!
//! Authentication and tenant scoping are handled by external collaborators;
//! the statistics engine is multi-tenant-agnostic and must never be trusted
//! as an authorization boundary.

pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Income category counted as a short-term rental visit, when present.
    pub rental_category_id: Option<Uuid>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
