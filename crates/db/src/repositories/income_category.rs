//! Income category lookups.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::income_categories;

/// Repository for income category lookups.
#[derive(Debug, Clone)]
pub struct IncomeCategoryRepository {
    db: DatabaseConnection,
}

impl IncomeCategoryRepository {
    /// Creates a new income category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a category ID by its unique code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_id_by_code(&self, code: &str) -> Result<Option<Uuid>, DbErr> {
        let category = income_categories::Entity::find()
            .filter(income_categories::Column::Code.eq(code))
            .one(&self.db)
            .await?;

        Ok(category.map(|c| c.id))
    }
}
