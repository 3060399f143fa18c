//! Ledger aggregation for the recalculation engine.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::stats::granularity::Granularity;

/// Running sums of ledger rows for one (property, key) pair across the three
/// granularities.
///
/// Feeding every contributing row through [`add`](Self::add) keeps the
/// all-time total equal to the sum of the yearly totals, and each yearly
/// total equal to the sum of its monthly totals, by construction.
#[derive(Debug, Clone, Default)]
pub struct LedgerTotals {
    rows: u64,
    all_time: Decimal,
    yearly: BTreeMap<i32, Decimal>,
    monthly: BTreeMap<(i32, i32), Decimal>,
}

impl LedgerTotals {
    /// Creates empty totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates one ledger row.
    pub fn add(&mut self, date: NaiveDate, amount: Decimal) {
        let year = date.year();
        let month = i32::try_from(date.month()).unwrap_or_default();

        self.rows += 1;
        self.all_time += amount;
        *self.yearly.entry(year).or_insert(Decimal::ZERO) += amount;
        *self.monthly.entry((year, month)).or_insert(Decimal::ZERO) += amount;
    }

    /// Number of contributing ledger rows.
    #[must_use]
    pub const fn rows(&self) -> u64 {
        self.rows
    }

    /// All-time total.
    #[must_use]
    pub const fn all_time(&self) -> Decimal {
        self.all_time
    }

    /// Whether no row contributed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Total for one year, zero when no row fell into it.
    #[must_use]
    pub fn for_year(&self, year: i32) -> Decimal {
        self.yearly.get(&year).copied().unwrap_or(Decimal::ZERO)
    }

    /// Total for one month, zero when no row fell into it.
    #[must_use]
    pub fn for_month(&self, year: i32, month: i32) -> Decimal {
        self.monthly
            .get(&(year, month))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// The full replace set: one cell per populated coordinate.
    ///
    /// Empty totals yield no cells, so a property without ledger activity
    /// gets nothing fabricated during a rebuild.
    #[must_use]
    pub fn cells(&self) -> Vec<(Granularity, Decimal)> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut cells = Vec::with_capacity(1 + self.yearly.len() + self.monthly.len());
        cells.push((Granularity::AllTime, self.all_time));
        for (&year, &value) in &self.yearly {
            cells.push((Granularity::Yearly { year }, value));
        }
        for (&(year, month), &value) in &self.monthly {
            cells.push((Granularity::Monthly { year, month }, value));
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_months_worked_example() {
        // 249 in February 2023 plus 1090 in March 2023.
        let mut totals = LedgerTotals::new();
        totals.add(date(2023, 2, 10), dec!(249));
        totals.add(date(2023, 3, 5), dec!(1090));

        assert_eq!(totals.rows(), 2);
        assert_eq!(totals.all_time(), dec!(1339));
        assert_eq!(totals.for_year(2023), dec!(1339));
        assert_eq!(totals.for_month(2023, 2), dec!(249));
        assert_eq!(totals.for_month(2023, 3), dec!(1090));
    }

    #[test]
    fn test_empty_totals_yield_no_cells() {
        let totals = LedgerTotals::new();

        assert!(totals.is_empty());
        assert_eq!(totals.all_time(), Decimal::ZERO);
        assert!(totals.cells().is_empty());
    }

    #[test]
    fn test_cells_cover_every_populated_coordinate() {
        let mut totals = LedgerTotals::new();
        totals.add(date(2022, 12, 31), dec!(10));
        totals.add(date(2023, 1, 1), dec!(20));

        let cells = totals.cells();
        // all-time + two years + two months
        assert_eq!(cells.len(), 5);
        assert!(cells.contains(&(Granularity::AllTime, dec!(30))));
        assert!(cells.contains(&(Granularity::Yearly { year: 2022 }, dec!(10))));
        assert!(cells.contains(&(Granularity::Yearly { year: 2023 }, dec!(20))));
        assert!(cells.contains(&(
            Granularity::Monthly {
                year: 2022,
                month: 12
            },
            dec!(10)
        )));
        assert!(cells.contains(&(
            Granularity::Monthly {
                year: 2023,
                month: 1
            },
            dec!(20)
        )));
    }

    /// Strategy for generating a batch of dated amounts within a few years
    fn rows_strategy() -> impl Strategy<Value = Vec<(NaiveDate, Decimal)>> {
        proptest::collection::vec(
            (
                2020i32..2025,
                1u32..13,
                1u32..29,
                -100_000i64..100_000i64,
            )
                .prop_map(|(y, m, d, n)| (date(y, m, d), Decimal::new(n, 2))),
            0..60,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The all-time cell equals the sum over yearly cells, and each
        /// yearly cell equals the sum over its monthly cells.
        #[test]
        fn prop_granularities_sum_consistently(rows in rows_strategy()) {
            let mut totals = LedgerTotals::new();
            for &(d, amount) in &rows {
                totals.add(d, amount);
            }

            let yearly_sum: Decimal = (2020..2025).map(|y| totals.for_year(y)).sum();
            prop_assert_eq!(totals.all_time(), yearly_sum);

            for year in 2020..2025 {
                let monthly_sum: Decimal =
                    (1..=12).map(|m| totals.for_month(year, m)).sum();
                prop_assert_eq!(totals.for_year(year), monthly_sum);
            }
        }

        /// Accumulation order never changes any total.
        #[test]
        fn prop_accumulation_is_commutative(rows in rows_strategy()) {
            let mut forward = LedgerTotals::new();
            for &(d, amount) in &rows {
                forward.add(d, amount);
            }

            let mut backward = LedgerTotals::new();
            for &(d, amount) in rows.iter().rev() {
                backward.add(d, amount);
            }

            prop_assert_eq!(forward.all_time(), backward.all_time());
            prop_assert_eq!(forward.rows(), backward.rows());
            prop_assert_eq!(forward.cells(), backward.cells());
        }

        /// The replace set carries exactly the populated coordinates.
        #[test]
        fn prop_cells_match_row_presence(rows in rows_strategy()) {
            let mut totals = LedgerTotals::new();
            for &(d, amount) in &rows {
                totals.add(d, amount);
            }

            if rows.is_empty() {
                prop_assert!(totals.cells().is_empty());
            } else {
                let cells = totals.cells();
                prop_assert!(cells.iter().any(|(g, _)| *g == Granularity::AllTime));
                prop_assert_eq!(
                    cells.iter().filter(|(g, _)| g.year().is_none()).count(),
                    1
                );
            }
        }
    }
}
