//! `SeaORM` entity definitions.

pub mod expenses;
pub mod income_categories;
pub mod incomes;
pub mod properties;
pub mod property_statistics;
pub mod sea_orm_active_enums;
pub mod transactions;
