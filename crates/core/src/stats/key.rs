//! Statistic key definitions.

use serde::{Deserialize, Serialize};

/// Identity of a per-property aggregate metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKey {
    /// Running cash balance, net of all accepted transactions.
    Balance,
    /// Accumulated income.
    Income,
    /// Accumulated expense magnitude.
    Expense,
    /// Accumulated deposits.
    Deposit,
    /// Accumulated withdrawals.
    Withdraw,
    /// Count of short-term rental bookings.
    RentalVisits,
}

impl StatisticKey {
    /// Every known key.
    pub const ALL: [Self; 6] = [
        Self::Balance,
        Self::Income,
        Self::Expense,
        Self::Deposit,
        Self::Withdraw,
        Self::RentalVisits,
    ];

    /// Keys the recalculation engine owns and rebuilds from the ledger.
    ///
    /// `Balance` is deliberately absent: balance cells are mutated only by
    /// the incremental delta path and survive every rebuild untouched.
    pub const RECALCULABLE: [Self; 5] = [
        Self::Income,
        Self::Expense,
        Self::Deposit,
        Self::Withdraw,
        Self::RentalVisits,
    ];

    /// Whether the recalculation engine may replace cells of this key.
    #[must_use]
    pub const fn is_rebuilt_from_ledger(self) -> bool {
        !matches!(self, Self::Balance)
    }

    /// Returns the wire representation of this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::RentalVisits => "rental_visits",
        }
    }

    /// Parses a key from its wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "balance" => Some(Self::Balance),
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "deposit" => Some(Self::Deposit),
            "withdraw" => Some(Self::Withdraw),
            "rental_visits" => Some(Self::RentalVisits),
            _ => None,
        }
    }
}
