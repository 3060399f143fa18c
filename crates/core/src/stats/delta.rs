//! Event to delta derivation.
//!
//! Translates a ledger transaction notification into the set of signed
//! adjustments the delta applier must persist. The sign conventions here are
//! the single source of truth for both the incremental path and the
//! recalculation engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::{EntryStatus, TransactionEvent, TransactionKind};
use crate::stats::key::StatisticKey;

/// A signed adjustment to one metric of one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticDelta {
    /// Metric the adjustment targets.
    pub key: StatisticKey,
    /// Signed amount added to the all-time, yearly, and monthly cells.
    pub amount: Decimal,
}

/// Direction of an event's effect on the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEffect {
    /// Transaction created: apply the deltas.
    Apply,
    /// Transaction deleted: revert them, restoring the prior cell values.
    Revert,
}

/// Why an event produced no aggregation effect.
///
/// Discards are expected operational noise, not failures: the ledger fires
/// events for every transaction and only accepted, well-formed ones aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EventDiscard {
    /// Transaction status does not aggregate.
    #[error("transaction status '{}' does not aggregate", .0.as_str())]
    NotAccepted(EntryStatus),

    /// Event carried no property reference.
    #[error("event carries no property id")]
    MissingProperty,

    /// Event carried no recognizable transaction kind.
    #[error("event carries no recognizable transaction kind")]
    UnknownKind,
}

/// The full effect of one event: where it lands and what it adjusts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDeltas {
    /// Property whose cells are touched.
    pub property_id: Uuid,
    /// Date selecting the yearly and monthly cells.
    pub date: NaiveDate,
    /// Adjustments, one per affected metric.
    pub deltas: Vec<StatisticDelta>,
}

/// Derives the deltas for a transaction event.
///
/// Sign conventions per kind:
/// - `income` adds the ledger amount to INCOME
/// - `expense` adds the amount's magnitude to EXPENSE
/// - `deposit` adds the ledger amount to DEPOSIT
/// - `withdraw` adds the *negated* ledger amount to WITHDRAW (withdrawals are
///   stored negative in the ledger, so the cell accumulates positive values)
/// - every kind adds the signed ledger amount to BALANCE
/// - an income in the designated short-term rental category also counts one
///   RENTAL_VISITS
///
/// `Revert` negates every delta, so create followed by delete restores each
/// touched cell to its exact prior value.
///
/// # Errors
///
/// Returns an [`EventDiscard`] when the event must be ignored; callers log
/// and drop these without surfacing a failure.
pub fn deltas_for(
    event: &TransactionEvent,
    effect: EventEffect,
    rental_category_id: Option<Uuid>,
) -> Result<EventDeltas, EventDiscard> {
    if event.status != EntryStatus::Accepted {
        return Err(EventDiscard::NotAccepted(event.status));
    }
    let property_id = event.property_id.ok_or(EventDiscard::MissingProperty)?;
    let kind = event.kind.ok_or(EventDiscard::UnknownKind)?;

    let mut deltas = Vec::with_capacity(3);

    let counter_delta = match kind {
        TransactionKind::Income => StatisticDelta {
            key: StatisticKey::Income,
            amount: event.amount,
        },
        TransactionKind::Expense => StatisticDelta {
            key: StatisticKey::Expense,
            amount: event.amount.abs(),
        },
        TransactionKind::Deposit => StatisticDelta {
            key: StatisticKey::Deposit,
            amount: event.amount,
        },
        TransactionKind::Withdraw => StatisticDelta {
            key: StatisticKey::Withdraw,
            amount: -event.amount,
        },
    };
    deltas.push(counter_delta);

    // Net cash effect, regardless of category.
    deltas.push(StatisticDelta {
        key: StatisticKey::Balance,
        amount: event.amount,
    });

    if kind == TransactionKind::Income
        && rental_category_id.is_some()
        && event.income_category_id == rental_category_id
    {
        deltas.push(StatisticDelta {
            key: StatisticKey::RentalVisits,
            amount: Decimal::ONE,
        });
    }

    if effect == EventEffect::Revert {
        for delta in &mut deltas {
            delta.amount = -delta.amount;
        }
    }

    Ok(EventDeltas {
        property_id,
        date: event.date,
        deltas,
    })
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
