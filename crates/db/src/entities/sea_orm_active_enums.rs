//! `SeaORM` active enums mirroring the database enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use lares_core::ledger;
use lares_core::stats::StatisticKey;

/// Kind of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Rental or other income.
    #[sea_orm(string_value = "income")]
    Income,
    /// Property expense.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Cash deposit.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Cash withdrawal.
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
}

impl From<ledger::TransactionKind> for TransactionKind {
    fn from(kind: ledger::TransactionKind) -> Self {
        match kind {
            ledger::TransactionKind::Income => Self::Income,
            ledger::TransactionKind::Expense => Self::Expense,
            ledger::TransactionKind::Deposit => Self::Deposit,
            ledger::TransactionKind::Withdraw => Self::Withdraw,
        }
    }
}

impl From<TransactionKind> for ledger::TransactionKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => Self::Income,
            TransactionKind::Expense => Self::Expense,
            TransactionKind::Deposit => Self::Deposit,
            TransactionKind::Withdraw => Self::Withdraw,
        }
    }
}

/// Review status of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Awaiting review.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Confirmed; the only state that aggregates.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Rejected during review.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<ledger::EntryStatus> for EntryStatus {
    fn from(status: ledger::EntryStatus) -> Self {
        match status {
            ledger::EntryStatus::Pending => Self::Pending,
            ledger::EntryStatus::Accepted => Self::Accepted,
            ledger::EntryStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<EntryStatus> for ledger::EntryStatus {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::Pending => Self::Pending,
            EntryStatus::Accepted => Self::Accepted,
            EntryStatus::Rejected => Self::Rejected,
        }
    }
}

/// Metric identity of a statistic cell.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "statistic_metric")]
#[serde(rename_all = "snake_case")]
pub enum StatisticMetric {
    /// Running cash balance.
    #[sea_orm(string_value = "balance")]
    Balance,
    /// Accumulated income.
    #[sea_orm(string_value = "income")]
    Income,
    /// Accumulated expense magnitude.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Accumulated deposits.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Accumulated withdrawals.
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
    /// Count of short-term rental bookings.
    #[sea_orm(string_value = "rental_visits")]
    RentalVisits,
}

impl From<StatisticKey> for StatisticMetric {
    fn from(key: StatisticKey) -> Self {
        match key {
            StatisticKey::Balance => Self::Balance,
            StatisticKey::Income => Self::Income,
            StatisticKey::Expense => Self::Expense,
            StatisticKey::Deposit => Self::Deposit,
            StatisticKey::Withdraw => Self::Withdraw,
            StatisticKey::RentalVisits => Self::RentalVisits,
        }
    }
}

impl From<StatisticMetric> for StatisticKey {
    fn from(metric: StatisticMetric) -> Self {
        match metric {
            StatisticMetric::Balance => Self::Balance,
            StatisticMetric::Income => Self::Income,
            StatisticMetric::Expense => Self::Expense,
            StatisticMetric::Deposit => Self::Deposit,
            StatisticMetric::Withdraw => Self::Withdraw,
            StatisticMetric::RentalVisits => Self::RentalVisits,
        }
    }
}
