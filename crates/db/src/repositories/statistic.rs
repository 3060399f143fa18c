//! Statistic cell store: the delta applier and the read-only query interface.
//!
//! Every cell mutation is a single atomic insert-or-accumulate upsert against
//! the coordinate's unique constraint. There is no read-modify-write sequence
//! and no in-process caching of cell values; multiple service instances may
//! share the store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, Order, QueryFilter, QueryOrder, Statement, TransactionTrait,
    sea_query::NullOrdering,
};
use tracing::warn;
use uuid::Uuid;

use lares_core::stats::{Granularity, StatisticKey};

use crate::entities::{property_statistics, sea_orm_active_enums::StatisticMetric};

/// Attempts per delta before contention is surfaced to the caller.
const MAX_DELTA_ATTEMPTS: u32 = 3;

/// Error types for statistic store operations.
#[derive(Debug, thiserror::Error)]
pub enum StatisticError {
    /// Store contention persisted across every retry; the delta was not
    /// applied and the caller may retry the whole operation.
    #[error("Statistics store contention for property {0}, please retry")]
    Contention(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// One materialized statistic cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticCell {
    /// Owning property.
    pub property_id: Uuid,
    /// Metric identity.
    pub key: StatisticKey,
    /// Year, `None` for all-time.
    pub year: Option<i32>,
    /// Month, `None` for whole-year and all-time.
    pub month: Option<i32>,
    /// Accumulated value.
    pub value: Decimal,
}

/// Search parameters for the reporting query contract.
///
/// Absent `year`/`month` mean "all-time only" unless the matching `include`
/// flag asks for the finer granularity as well.
#[derive(Debug, Clone)]
pub struct StatisticSearch {
    /// Restrict to one property; tenant scoping is the caller's concern.
    pub property_id: Option<Uuid>,
    /// Metric to search.
    pub key: StatisticKey,
    /// Restrict to one year.
    pub year: Option<i32>,
    /// Include yearly cells when no year is given.
    pub include_yearly: bool,
    /// Restrict to one month (requires `year`).
    pub month: Option<i32>,
    /// Include monthly cells.
    pub include_monthly: bool,
}

/// Repository for the statistic cell store.
#[derive(Debug, Clone)]
pub struct StatisticRepository {
    db: DatabaseConnection,
}

impl StatisticRepository {
    /// Creates a new statistic repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds `delta` to the all-time, yearly, and monthly cells for the given
    /// coordinate, creating any missing cell with `delta` as initial value.
    ///
    /// Safe under arbitrary concurrent invocation: each cell mutation is one
    /// atomic upsert serialized by the store, and the surrounding transaction
    /// holds a shared property-scope lock so concurrent deltas proceed in
    /// parallel while an in-flight rebuild of the same property is excluded.
    /// Transient serialization conflicts are retried a bounded number of
    /// times before surfacing as [`StatisticError::Contention`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store stays contended across every retry or
    /// the database fails.
    pub async fn apply_delta(
        &self,
        property_id: Uuid,
        key: StatisticKey,
        date: NaiveDate,
        delta: Decimal,
    ) -> Result<(), StatisticError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_apply_delta(property_id, key, date, delta).await {
                Ok(()) => return Ok(()),
                Err(err) if is_transient(&err) => {
                    if attempt >= MAX_DELTA_ATTEMPTS {
                        return Err(StatisticError::Contention(property_id));
                    }
                    warn!(
                        %property_id,
                        key = key.as_str(),
                        attempt,
                        error = %err,
                        "retrying contended statistics delta"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// One attempt: a transaction covering the three granularity upserts.
    async fn try_apply_delta(
        &self,
        property_id: Uuid,
        key: StatisticKey,
        date: NaiveDate,
        delta: Decimal,
    ) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;

        lock_property_shared(&txn, property_id).await?;

        for slice in Granularity::for_date(date) {
            upsert_cell(&txn, property_id, key, slice, delta).await?;
        }

        txn.commit().await
    }

    /// Returns the value of one cell, or zero when the cell has never been
    /// created. Absence is a defined result, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn query(
        &self,
        property_id: Uuid,
        key: StatisticKey,
        year: Option<i32>,
        month: Option<i32>,
    ) -> Result<Decimal, StatisticError> {
        let cell = property_statistics::Entity::find()
            .filter(property_statistics::Column::PropertyId.eq(property_id))
            .filter(property_statistics::Column::Metric.eq(StatisticMetric::from(key)))
            .filter(match year {
                Some(y) => property_statistics::Column::Year.eq(y),
                None => property_statistics::Column::Year.is_null(),
            })
            .filter(match month {
                Some(m) => property_statistics::Column::Month.eq(m),
                None => property_statistics::Column::Month.is_null(),
            })
            .one(&self.db)
            .await?;

        Ok(cell.map_or(Decimal::ZERO, |c| c.value))
    }

    /// Searches cells for reporting, ordered by property, then year and
    /// month with the coarser granularities first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search(
        &self,
        search: &StatisticSearch,
    ) -> Result<Vec<StatisticCell>, StatisticError> {
        let mut query = property_statistics::Entity::find()
            .filter(property_statistics::Column::Metric.eq(StatisticMetric::from(search.key)));

        if let Some(property_id) = search.property_id {
            query = query.filter(property_statistics::Column::PropertyId.eq(property_id));
        }

        if let Some(year) = search.year {
            query = query.filter(property_statistics::Column::Year.eq(year));
            if let Some(month) = search.month {
                query = query.filter(property_statistics::Column::Month.eq(month));
            } else if !search.include_monthly {
                query = query.filter(property_statistics::Column::Month.is_null());
            }
        } else {
            let mut granularities =
                sea_orm::Condition::any().add(property_statistics::Column::Year.is_null());
            if search.include_yearly {
                granularities = granularities.add(property_statistics::Column::Month.is_null());
            }
            if search.include_monthly {
                granularities = granularities.add(property_statistics::Column::Month.is_not_null());
            }
            query = query.filter(granularities);
        }

        let rows = query
            .order_by_asc(property_statistics::Column::PropertyId)
            .order_by_with_nulls(
                property_statistics::Column::Year,
                Order::Asc,
                NullOrdering::First,
            )
            .order_by_with_nulls(
                property_statistics::Column::Month,
                Order::Asc,
                NullOrdering::First,
            )
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatisticCell {
                property_id: row.property_id,
                key: row.metric.into(),
                year: row.year,
                month: row.month,
                value: row.value,
            })
            .collect())
    }
}

/// Inserts the cell with `delta` as initial value, or atomically adds `delta`
/// to the existing row. The conflict target is the four-part coordinate
/// constraint, which treats NULL year/month as distinct values.
async fn upsert_cell<C: ConnectionTrait>(
    conn: &C,
    property_id: Uuid,
    key: StatisticKey,
    slice: Granularity,
    delta: Decimal,
) -> Result<(), DbErr> {
    let cell = property_statistics::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(property_id),
        metric: Set(key.into()),
        year: Set(slice.year()),
        month: Set(slice.month()),
        value: Set(delta),
        ..Default::default()
    };

    property_statistics::Entity::insert(cell)
        .on_conflict(
            OnConflict::columns([
                property_statistics::Column::PropertyId,
                property_statistics::Column::Metric,
                property_statistics::Column::Year,
                property_statistics::Column::Month,
            ])
            .value(
                property_statistics::Column::Value,
                Expr::col((
                    property_statistics::Entity,
                    property_statistics::Column::Value,
                ))
                .add(delta),
            )
            .to_owned(),
        )
        .exec(conn)
        .await?;

    Ok(())
}

/// Takes the shared advisory lock for a property, scoped to the transaction.
///
/// Deltas hold the shared mode so they never block each other; the
/// recalculation engine takes the exclusive mode to drain in-flight deltas
/// before a rebuild.
pub(crate) async fn lock_property_shared<C: ConnectionTrait>(
    conn: &C,
    property_id: Uuid,
) -> Result<(), DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock_shared($1)",
        [property_lock_key(property_id).into()],
    ))
    .await?;
    Ok(())
}

/// Takes the exclusive advisory lock for a property, scoped to the
/// transaction.
pub(crate) async fn lock_property_exclusive<C: ConnectionTrait>(
    conn: &C,
    property_id: Uuid,
) -> Result<(), DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [property_lock_key(property_id).into()],
    ))
    .await?;
    Ok(())
}

/// Folds a property UUID into the 64-bit advisory lock keyspace.
///
/// A collision between two properties only causes spurious serialization,
/// never a lost update.
#[must_use]
pub(crate) fn property_lock_key(property_id: Uuid) -> i64 {
    let (hi, lo) = property_id.as_u64_pair();
    i64::from_ne_bytes((hi ^ lo).to_ne_bytes())
}

/// Whether a database error is a transient conflict worth retrying.
///
/// Matches the Postgres serialization_failure (40001) and deadlock_detected
/// (40P01) SQLSTATEs.
#[must_use]
pub(crate) fn is_transient(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("40001")
        || message.contains("40P01")
        || message.contains("could not serialize access")
        || message.contains("deadlock detected")
}

#[cfg(test)]
#[path = "statistic_tests.rs"]
mod tests;
