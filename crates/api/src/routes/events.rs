//! Ledger event ingestion.
//!
//! The ledger subsystem fires `transaction_created` / `transaction_deleted`
//! notifications at this endpoint. Delivery is fire-and-forget: a malformed
//! or non-aggregating event is acknowledged and dropped, never rejected.
//! Only a store failure surfaces, so the sender knows to redeliver.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::AppState;
use lares_core::ledger::{EntryStatus, TransactionEvent, TransactionKind};
use lares_db::repositories::{StatisticProjector, StatisticRepository};

/// Creates the ledger event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ledger-events", post(ingest_event))
}

/// Wire form of a ledger event.
#[derive(Debug, Deserialize)]
pub struct LedgerEventRequest {
    /// Event discriminator: `transaction_created` or `transaction_deleted`.
    pub event: String,
    /// Transaction payload.
    pub transaction: TransactionPayload,
}

/// Wire form of the transaction carried by an event.
///
/// Kind and status arrive as free-form strings and are parsed leniently:
/// an unrecognized value makes the event a no-op, not an error.
#[derive(Debug, Deserialize)]
pub struct TransactionPayload {
    /// Ledger transaction ID.
    pub id: Uuid,
    /// Owning property.
    pub property_id: Option<Uuid>,
    /// Transaction kind.
    pub kind: Option<String>,
    /// Entry status.
    pub status: Option<String>,
    /// Signed ledger amount.
    pub amount: Decimal,
    /// Transaction date.
    pub date: NaiveDate,
    /// Resolved income category.
    pub income_category_id: Option<Uuid>,
}

/// Ingests one ledger event.
async fn ingest_event(
    State(state): State<AppState>,
    Json(request): Json<LedgerEventRequest>,
) -> impl IntoResponse {
    let Some(status) = request
        .transaction
        .status
        .as_deref()
        .and_then(EntryStatus::parse)
    else {
        warn!(
            transaction_id = %request.transaction.id,
            status = ?request.transaction.status,
            "ignoring ledger event with unrecognized status"
        );
        return StatusCode::ACCEPTED.into_response();
    };

    let event = TransactionEvent {
        id: request.transaction.id,
        property_id: request.transaction.property_id,
        kind: request
            .transaction
            .kind
            .as_deref()
            .and_then(TransactionKind::parse),
        status,
        amount: request.transaction.amount,
        date: request.transaction.date,
        income_category_id: request.transaction.income_category_id,
    };

    let projector = StatisticProjector::new(
        StatisticRepository::new(state.db.as_ref().clone()),
        state.rental_category_id,
    );

    let result = match request.event.as_str() {
        "transaction_created" => projector.on_transaction_created(&event).await,
        "transaction_deleted" => projector.on_transaction_deleted(&event).await,
        other => {
            warn!(event = other, "ignoring unrecognized ledger event type");
            return StatusCode::ACCEPTED.into_response();
        }
    };

    match result {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            error!(transaction_id = %event.id, error = %e, "Failed to project ledger event");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}
