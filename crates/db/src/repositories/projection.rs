//! Ledger event projection into the statistic cell store.
//!
//! The projector is a pure subscriber to the transaction event contract: it
//! derives the deltas in `lares-core` and fans them out to the delta applier.
//! Ledger internals (import formats, rule engines, tax logic) never leak in.

use tracing::warn;
use uuid::Uuid;

use lares_core::ledger::TransactionEvent;
use lares_core::stats::{EventEffect, deltas_for};

use crate::repositories::statistic::{StatisticError, StatisticRepository};

/// Projects transaction lifecycle events onto property statistics.
#[derive(Debug, Clone)]
pub struct StatisticProjector {
    statistics: StatisticRepository,
    rental_category_id: Option<Uuid>,
}

impl StatisticProjector {
    /// Creates a new projector.
    ///
    /// `rental_category_id` designates the income category counted as a
    /// short-term rental visit; `None` disables visit counting.
    #[must_use]
    pub const fn new(statistics: StatisticRepository, rental_category_id: Option<Uuid>) -> Self {
        Self {
            statistics,
            rental_category_id,
        }
    }

    /// Handles a "transaction created" notification.
    ///
    /// Non-accepted or malformed events are logged and ignored; they must
    /// not fail the fire-and-forget sender and must not touch any cell.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store rejects an applicable delta;
    /// the event source is expected to redeliver in that case.
    pub async fn on_transaction_created(
        &self,
        event: &TransactionEvent,
    ) -> Result<(), StatisticError> {
        self.project(event, EventEffect::Apply).await
    }

    /// Handles a "transaction deleted" notification.
    ///
    /// Mirrors [`on_transaction_created`](Self::on_transaction_created) with
    /// every delta negated, restoring each touched cell to its prior value.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store rejects an applicable delta.
    pub async fn on_transaction_deleted(
        &self,
        event: &TransactionEvent,
    ) -> Result<(), StatisticError> {
        self.project(event, EventEffect::Revert).await
    }

    async fn project(
        &self,
        event: &TransactionEvent,
        effect: EventEffect,
    ) -> Result<(), StatisticError> {
        let effects = match deltas_for(event, effect, self.rental_category_id) {
            Ok(effects) => effects,
            Err(discard) => {
                warn!(transaction_id = %event.id, reason = %discard, "ignoring ledger event");
                return Ok(());
            }
        };

        for delta in &effects.deltas {
            self.statistics
                .apply_delta(effects.property_id, delta.key, effects.date, delta.amount)
                .await?;
        }

        Ok(())
    }
}
