//! Lares API Server
//!
//! Main entry point for the Lares backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lares_api::{AppState, create_router};
use lares_core::ledger::SHORT_TERM_RENTAL_CATEGORY;
use lares_db::{IncomeCategoryRepository, connect};
use lares_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lares=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Resolve the income category whose entries count as rental visits
    let rental_category_id = IncomeCategoryRepository::new(db.clone())
        .find_id_by_code(SHORT_TERM_RENTAL_CATEGORY)
        .await?;
    match rental_category_id {
        Some(id) => info!(category_id = %id, "Rental visit counting enabled"),
        None => info!("No short-term rental category found, visit counting disabled"),
    }

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        rental_category_id,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
