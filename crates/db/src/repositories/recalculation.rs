//! Full rebuild of statistic cells from the canonical ledger.
//!
//! Recalculation is a deterministic replace, not an incremental delta: for
//! every key it owns, it deletes the property's cells and reinserts values
//! summed from accepted ledger rows. Balance cells belong to the incremental
//! path alone and survive every rebuild untouched.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use lares_core::stats::{LedgerTotals, StatisticKey};

use crate::entities::{
    expenses, incomes, properties, property_statistics,
    sea_orm_active_enums::{EntryStatus, StatisticMetric, TransactionKind},
    transactions,
};
use crate::repositories::statistic::lock_property_exclusive;

/// Error types for recalculation operations.
#[derive(Debug, thiserror::Error)]
pub enum RecalculationError {
    /// Property not found.
    #[error("Property not found: {0}")]
    PropertyNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Rebuild outcome for one key of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySummary {
    /// Metric that was rebuilt.
    pub key: StatisticKey,
    /// Number of ledger rows that contributed.
    pub ledger_rows: u64,
    /// Resulting all-time total.
    pub all_time_total: Decimal,
}

/// Rebuild outcome for one property, one summary per recalculable key.
#[derive(Debug, Clone)]
pub struct PropertyRecalculation {
    /// Property whose cells were rebuilt.
    pub property_id: Uuid,
    /// Per-key summaries, including zero entries for inactive keys.
    pub keys: Vec<KeySummary>,
}

/// Repository for rebuilding statistics from the ledger.
#[derive(Debug, Clone)]
pub struct RecalculationRepository {
    db: DatabaseConnection,
    rental_category_id: Option<Uuid>,
}

impl RecalculationRepository {
    /// Creates a new recalculation repository.
    ///
    /// `rental_category_id` designates the income category counted as a
    /// short-term rental visit; `None` disables visit counting.
    #[must_use]
    pub const fn new(db: DatabaseConnection, rental_category_id: Option<Uuid>) -> Self {
        Self {
            db,
            rental_category_id,
        }
    }

    /// Rebuilds the cells of one property, or of every property when no ID
    /// is given.
    ///
    /// Each property is rebuilt in its own transaction under the exclusive
    /// property lock, so a rebuild never sees another property's data and
    /// never races the delta applier for its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the target property does not exist or the
    /// database fails.
    pub async fn recalculate(
        &self,
        property_id: Option<Uuid>,
    ) -> Result<Vec<PropertyRecalculation>, RecalculationError> {
        let targets = match property_id {
            Some(id) => {
                let exists = properties::Entity::find_by_id(id).one(&self.db).await?;
                if exists.is_none() {
                    return Err(RecalculationError::PropertyNotFound(id));
                }
                vec![id]
            }
            None => {
                properties::Entity::find()
                    .select_only()
                    .column(properties::Column::Id)
                    .into_tuple()
                    .all(&self.db)
                    .await?
            }
        };

        let mut results = Vec::with_capacity(targets.len());
        for id in targets {
            results.push(self.rebuild_property(id).await?);
        }
        Ok(results)
    }

    /// Rebuilds one property: sum accepted ledger rows, replace owned cells.
    async fn rebuild_property(
        &self,
        property_id: Uuid,
    ) -> Result<PropertyRecalculation, RecalculationError> {
        let txn = self.db.begin().await?;

        lock_property_exclusive(&txn, property_id).await?;

        let totals = self.load_totals(&txn, property_id).await?;

        // Replace every cell the rebuild owns. Balance cells are not in the
        // delete set and no balance total is ever computed here.
        property_statistics::Entity::delete_many()
            .filter(property_statistics::Column::PropertyId.eq(property_id))
            .filter(
                property_statistics::Column::Metric
                    .is_in(StatisticKey::RECALCULABLE.map(StatisticMetric::from)),
            )
            .exec(&txn)
            .await?;

        let mut cells = Vec::new();
        for (key, key_totals) in &totals {
            for (slice, value) in key_totals.cells() {
                cells.push(property_statistics::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    property_id: Set(property_id),
                    metric: Set(StatisticMetric::from(*key)),
                    year: Set(slice.year()),
                    month: Set(slice.month()),
                    value: Set(value),
                    ..Default::default()
                });
            }
        }
        if !cells.is_empty() {
            property_statistics::Entity::insert_many(cells).exec(&txn).await?;
        }

        txn.commit().await?;

        let keys: Vec<KeySummary> = StatisticKey::RECALCULABLE
            .iter()
            .map(|&key| {
                let key_totals = totals.get(&key);
                KeySummary {
                    key,
                    ledger_rows: key_totals.map_or(0, LedgerTotals::rows),
                    all_time_total: key_totals.map_or(Decimal::ZERO, LedgerTotals::all_time),
                }
            })
            .collect();

        info!(
            %property_id,
            rows = keys.iter().map(|k| k.ledger_rows).sum::<u64>(),
            "rebuilt property statistics"
        );

        Ok(PropertyRecalculation { property_id, keys })
    }

    /// Sums the accepted ledger rows of one property per recalculable key.
    async fn load_totals<C: ConnectionTrait>(
        &self,
        conn: &C,
        property_id: Uuid,
    ) -> Result<BTreeMap<StatisticKey, LedgerTotals>, DbErr> {
        let mut totals: BTreeMap<StatisticKey, LedgerTotals> = BTreeMap::new();

        let income_rows = incomes::Entity::find()
            .filter(incomes::Column::PropertyId.eq(property_id))
            .filter(incomes::Column::Status.eq(EntryStatus::Accepted))
            .all(conn)
            .await?;
        for row in income_rows {
            totals
                .entry(StatisticKey::Income)
                .or_default()
                .add(row.income_date, row.amount);
            if let Some(rental) = self.rental_category_id
                && row.category_id == rental
            {
                totals
                    .entry(StatisticKey::RentalVisits)
                    .or_default()
                    .add(row.income_date, Decimal::ONE);
            }
        }

        let expense_rows = expenses::Entity::find()
            .filter(expenses::Column::PropertyId.eq(property_id))
            .filter(expenses::Column::Status.eq(EntryStatus::Accepted))
            .all(conn)
            .await?;
        for row in expense_rows {
            // Same magnitude convention as the incremental path.
            totals
                .entry(StatisticKey::Expense)
                .or_default()
                .add(row.expense_date, row.amount.abs());
        }

        let cash_rows = transactions::Entity::find()
            .filter(transactions::Column::PropertyId.eq(property_id))
            .filter(transactions::Column::Status.eq(EntryStatus::Accepted))
            .filter(
                transactions::Column::Kind
                    .is_in([TransactionKind::Deposit, TransactionKind::Withdraw]),
            )
            .all(conn)
            .await?;
        for row in cash_rows {
            match row.kind {
                TransactionKind::Deposit => {
                    totals
                        .entry(StatisticKey::Deposit)
                        .or_default()
                        .add(row.transaction_date, row.amount);
                }
                TransactionKind::Withdraw => {
                    // Negation of the (negative) ledger amount, matching the
                    // incremental path.
                    totals
                        .entry(StatisticKey::Withdraw)
                        .or_default()
                        .add(row.transaction_date, -row.amount);
                }
                TransactionKind::Income | TransactionKind::Expense => {}
            }
        }

        Ok(totals)
    }
}
