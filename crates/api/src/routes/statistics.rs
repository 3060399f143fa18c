//! Statistics routes: cell lookup, search, and recalculation.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use lares_core::stats::StatisticKey;
use lares_db::repositories::{
    RecalculationError, RecalculationRepository, StatisticError, StatisticRepository,
    StatisticSearch,
};
use lares_shared::AppError;

/// Creates the statistics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/properties/{property_id}/statistics/{key}",
            get(get_statistic),
        )
        .route("/statistics", get(search_statistics))
        .route("/statistics/recalculations", post(recalculate))
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters for a single-cell lookup.
#[derive(Debug, Deserialize)]
pub struct StatisticQuery {
    /// Year, absent for the all-time cell.
    pub year: Option<i32>,
    /// Month, requires `year`.
    pub month: Option<i32>,
}

/// Query parameters for the statistics search.
#[derive(Debug, Deserialize)]
pub struct StatisticSearchQuery {
    /// Restrict to one property.
    pub property_id: Option<Uuid>,
    /// Metric to search.
    pub key: String,
    /// Restrict to one year.
    pub year: Option<i32>,
    /// Include yearly cells when no year is given.
    #[serde(default)]
    pub include_yearly: bool,
    /// Restrict to one month (requires `year`).
    pub month: Option<i32>,
    /// Include monthly cells.
    #[serde(default)]
    pub include_monthly: bool,
}

/// Request body for the administrative recalculation.
#[derive(Debug, Deserialize, Default)]
pub struct RecalculationRequest {
    /// Property to rebuild; absent rebuilds every property.
    pub property_id: Option<Uuid>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Response for a single-cell lookup.
#[derive(Debug, Serialize)]
pub struct StatisticValueResponse {
    /// Owning property.
    pub property_id: Uuid,
    /// Metric identity.
    pub key: String,
    /// Year, absent for all-time.
    pub year: Option<i32>,
    /// Month, absent unless monthly.
    pub month: Option<i32>,
    /// Cell value; zero when the cell has never been created.
    pub value: String,
}

/// One cell row in a search response.
#[derive(Debug, Serialize)]
pub struct StatisticRowResponse {
    /// Owning property.
    pub property_id: Uuid,
    /// Metric identity.
    pub key: String,
    /// Year, absent for all-time.
    pub year: Option<i32>,
    /// Month, absent unless monthly.
    pub month: Option<i32>,
    /// Cell value.
    pub value: String,
}

/// Response for a statistics search.
#[derive(Debug, Serialize)]
pub struct StatisticSearchResponse {
    /// Matching cells, coarser granularities first.
    pub rows: Vec<StatisticRowResponse>,
}

/// Per-key summary in a recalculation response.
#[derive(Debug, Serialize)]
pub struct KeySummaryResponse {
    /// Metric that was rebuilt.
    pub key: String,
    /// Number of contributing ledger rows.
    pub ledger_rows: u64,
    /// Resulting all-time total.
    pub all_time_total: String,
}

/// Per-property summary in a recalculation response.
#[derive(Debug, Serialize)]
pub struct PropertyRecalculationResponse {
    /// Property whose cells were rebuilt.
    pub property_id: Uuid,
    /// Per-key summaries.
    pub keys: Vec<KeySummaryResponse>,
}

/// Response for the administrative recalculation.
#[derive(Debug, Serialize)]
pub struct RecalculationResponse {
    /// One entry per rebuilt property.
    pub properties: Vec<PropertyRecalculationResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Returns one cell's value, zero when it has never been created.
async fn get_statistic(
    State(state): State<AppState>,
    Path((property_id, key)): Path<(Uuid, String)>,
    Query(params): Query<StatisticQuery>,
) -> impl IntoResponse {
    let Some(key) = StatisticKey::parse(&key) else {
        return unknown_key_response(&key);
    };
    if let Err(response) = validate_granularity(params.year, params.month) {
        return response;
    }

    let repo = StatisticRepository::new(state.db.as_ref().clone());
    match repo
        .query(property_id, key, params.year, params.month)
        .await
    {
        Ok(value) => (
            StatusCode::OK,
            Json(StatisticValueResponse {
                property_id,
                key: key.as_str().to_string(),
                year: params.year,
                month: params.month,
                value: format_value(value),
            }),
        )
            .into_response(),
        Err(e) => statistic_error_response(&e),
    }
}

/// Searches cells for reporting collaborators.
async fn search_statistics(
    State(state): State<AppState>,
    Query(params): Query<StatisticSearchQuery>,
) -> impl IntoResponse {
    let Some(key) = StatisticKey::parse(&params.key) else {
        return unknown_key_response(&params.key);
    };
    if let Err(response) = validate_granularity(params.year, params.month) {
        return response;
    }

    let search = StatisticSearch {
        property_id: params.property_id,
        key,
        year: params.year,
        include_yearly: params.include_yearly,
        month: params.month,
        include_monthly: params.include_monthly,
    };

    let repo = StatisticRepository::new(state.db.as_ref().clone());
    match repo.search(&search).await {
        Ok(cells) => {
            let rows = cells
                .into_iter()
                .map(|cell| StatisticRowResponse {
                    property_id: cell.property_id,
                    key: cell.key.as_str().to_string(),
                    year: cell.year,
                    month: cell.month,
                    value: format_value(cell.value),
                })
                .collect();
            (StatusCode::OK, Json(StatisticSearchResponse { rows })).into_response()
        }
        Err(e) => statistic_error_response(&e),
    }
}

/// Rebuilds statistics for one or every property from the canonical ledger.
async fn recalculate(
    State(state): State<AppState>,
    body: Option<Json<RecalculationRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let repo = RecalculationRepository::new(state.db.as_ref().clone(), state.rental_category_id);
    match repo.recalculate(request.property_id).await {
        Ok(results) => {
            let properties = results
                .into_iter()
                .map(|p| PropertyRecalculationResponse {
                    property_id: p.property_id,
                    keys: p
                        .keys
                        .into_iter()
                        .map(|k| KeySummaryResponse {
                            key: k.key.as_str().to_string(),
                            ledger_rows: k.ledger_rows,
                            all_time_total: format_value(k.all_time_total),
                        })
                        .collect(),
                })
                .collect();
            (
                StatusCode::OK,
                Json(RecalculationResponse { properties }),
            )
                .into_response()
        }
        Err(RecalculationError::PropertyNotFound(id)) => {
            app_error_response(&AppError::NotFound(format!("property {id}")))
        }
        Err(RecalculationError::Database(e)) => {
            error!(error = %e, "Recalculation failed");
            app_error_response(&AppError::Database("recalculation failed".to_string()))
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Formats a cell value with 4 decimal places.
fn format_value(value: Decimal) -> String {
    format!("{value:.4}")
}

/// Renders an `AppError` with its canonical status and error code.
fn app_error_response(error: &AppError) -> axum::response::Response {
    let status = StatusCode::from_u16(error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": error.error_code(),
            "message": error.to_string()
        })),
    )
        .into_response()
}

fn unknown_key_response(key: &str) -> axum::response::Response {
    app_error_response(&AppError::Validation(format!("unknown statistic key: {key}")))
}

fn validate_granularity(
    year: Option<i32>,
    month: Option<i32>,
) -> Result<(), axum::response::Response> {
    if month.is_some() && year.is_none() {
        return Err(app_error_response(&AppError::Validation(
            "month requires year".to_string(),
        )));
    }
    if let Some(month) = month
        && !(1..=12).contains(&month)
    {
        return Err(app_error_response(&AppError::Validation(
            "month must be between 1 and 12".to_string(),
        )));
    }
    Ok(())
}

fn statistic_error_response(error: &StatisticError) -> axum::response::Response {
    match error {
        StatisticError::Contention(property_id) => app_error_response(&AppError::Contention(
            format!("statistics store contention for property {property_id}, please retry"),
        )),
        StatisticError::Database(e) => {
            error!(error = %e, "Statistics query failed");
            app_error_response(&AppError::Database("statistics query failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_value_uses_four_decimals() {
        assert_eq!(format_value(dec!(1500)), "1500.0000");
        assert_eq!(format_value(dec!(249.5)), "249.5000");
        assert_eq!(format_value(dec!(-300.25)), "-300.2500");
    }

    #[test]
    fn test_granularity_validation() {
        assert!(validate_granularity(None, None).is_ok());
        assert!(validate_granularity(Some(2023), None).is_ok());
        assert!(validate_granularity(Some(2023), Some(2)).is_ok());
        assert!(validate_granularity(None, Some(2)).is_err());
        assert!(validate_granularity(Some(2023), Some(0)).is_err());
        assert!(validate_granularity(Some(2023), Some(13)).is_err());
    }
}
