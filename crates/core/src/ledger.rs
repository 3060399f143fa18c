//! Ledger fact types and the inbound transaction event contract.
//!
//! The statistics engine never reads ledger internals directly; it consumes
//! the narrow event contract defined here. Ledger CRUD, import parsing, and
//! rule matching are external collaborators.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category code whose income entries increment the rental visits counter.
pub const SHORT_TERM_RENTAL_CATEGORY: &str = "short_term_rental";

/// Kind of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Rental or other income.
    Income,
    /// Property expense.
    Expense,
    /// Cash deposit into the property account.
    Deposit,
    /// Cash withdrawal from the property account.
    Withdraw,
}

impl TransactionKind {
    /// Returns the wire representation of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }

    /// Parses a kind from its wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "deposit" => Some(Self::Deposit),
            "withdraw" => Some(Self::Withdraw),
            _ => None,
        }
    }
}

/// Status of a ledger entry.
///
/// Only `Accepted` entries participate in aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Awaiting review; excluded from aggregation.
    Pending,
    /// Confirmed; the only state that aggregates.
    Accepted,
    /// Rejected during review; excluded from aggregation.
    Rejected,
}

impl EntryStatus {
    /// Returns the wire representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from its wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A transaction notification from the ledger subsystem.
///
/// Optional fields stay optional on purpose: event delivery is fire-and-forget
/// and a malformed event must be discardable without failing the sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Ledger transaction ID.
    pub id: Uuid,
    /// Owning property; absent in malformed events.
    pub property_id: Option<Uuid>,
    /// Transaction kind; absent when the wire value was unrecognized.
    pub kind: Option<TransactionKind>,
    /// Entry status.
    pub status: EntryStatus,
    /// Signed ledger amount.
    pub amount: Decimal,
    /// Transaction date, determines the yearly and monthly cells.
    pub date: NaiveDate,
    /// Resolved income category, when the transaction is an income.
    pub income_category_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            TransactionKind::Income,
            TransactionKind::Expense,
            TransactionKind::Deposit,
            TransactionKind::Withdraw,
        ] {
            assert_eq!(TransactionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::parse("transfer"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            EntryStatus::Pending,
            EntryStatus::Accepted,
            EntryStatus::Rejected,
        ] {
            assert_eq!(EntryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EntryStatus::parse("draft"), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            TransactionKind::parse("WITHDRAW"),
            Some(TransactionKind::Withdraw)
        );
        assert_eq!(EntryStatus::parse("Accepted"), Some(EntryStatus::Accepted));
    }
}
