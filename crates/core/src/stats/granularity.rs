//! Aggregation granularities.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One of the three time slices a statistic cell can cover.
///
/// A single ledger event always lands in exactly one coordinate per
/// granularity, which is why `for_date` returns all three at once: the delta
/// applier must touch them together or the cross-granularity sums drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// All-time cell, no year or month.
    AllTime,
    /// Whole-year cell.
    Yearly {
        /// Calendar year.
        year: i32,
    },
    /// Single-month cell.
    Monthly {
        /// Calendar year.
        year: i32,
        /// Calendar month, 1-12.
        month: i32,
    },
}

impl Granularity {
    /// The three coordinates a delta for `date` must be applied to.
    #[must_use]
    pub fn for_date(date: NaiveDate) -> [Self; 3] {
        let year = date.year();
        // chrono months are 1-12 and always fit
        let month = i32::try_from(date.month()).unwrap_or_default();
        [
            Self::AllTime,
            Self::Yearly { year },
            Self::Monthly { year, month },
        ]
    }

    /// Year component of the cell coordinate, `None` for all-time.
    #[must_use]
    pub const fn year(self) -> Option<i32> {
        match self {
            Self::AllTime => None,
            Self::Yearly { year } | Self::Monthly { year, .. } => Some(year),
        }
    }

    /// Month component of the cell coordinate, `None` unless monthly.
    #[must_use]
    pub const fn month(self) -> Option<i32> {
        match self {
            Self::AllTime | Self::Yearly { .. } => None,
            Self::Monthly { month, .. } => Some(month),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_date_expands_to_three_coordinates() {
        let date = NaiveDate::from_ymd_opt(2023, 2, 14).unwrap();
        let slices = Granularity::for_date(date);

        assert_eq!(slices[0], Granularity::AllTime);
        assert_eq!(slices[1], Granularity::Yearly { year: 2023 });
        assert_eq!(
            slices[2],
            Granularity::Monthly {
                year: 2023,
                month: 2
            }
        );
    }

    #[test]
    fn test_coordinate_components() {
        assert_eq!(Granularity::AllTime.year(), None);
        assert_eq!(Granularity::AllTime.month(), None);
        assert_eq!(Granularity::Yearly { year: 2024 }.year(), Some(2024));
        assert_eq!(Granularity::Yearly { year: 2024 }.month(), None);

        let monthly = Granularity::Monthly {
            year: 2024,
            month: 12,
        };
        assert_eq!(monthly.year(), Some(2024));
        assert_eq!(monthly.month(), Some(12));
    }

    #[test]
    fn test_month_is_always_in_range() {
        let mut date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        while date < end {
            let monthly = Granularity::for_date(date)[2];
            let month = monthly.month().unwrap();
            assert!((1..=12).contains(&month));
            date = date.succ_opt().unwrap();
        }
    }
}
