//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod income_category;
pub mod projection;
pub mod recalculation;
pub mod statistic;

pub use income_category::IncomeCategoryRepository;
pub use projection::StatisticProjector;
pub use recalculation::{
    KeySummary, PropertyRecalculation, RecalculationError, RecalculationRepository,
};
pub use statistic::{StatisticCell, StatisticError, StatisticRepository, StatisticSearch};
