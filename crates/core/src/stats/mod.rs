//! Statistic keys, granularities, delta derivation, and rebuild sums.
//!
//! Everything here is pure: the database-facing delta applier and
//! recalculation engine live in `lares-db` and call into this module for the
//! sign conventions and aggregation rules.

pub mod delta;
pub mod granularity;
pub mod key;
pub mod rebuild;

pub use delta::{EventDeltas, EventDiscard, EventEffect, StatisticDelta, deltas_for};
pub use granularity::Granularity;
pub use key::StatisticKey;
pub use rebuild::LedgerTotals;
