//! Category repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use tandem_core::expense::{
    CategoryUpdate, ExpenseError, NewCategory, validate_category_update, validate_new_category,
};
use tandem_shared::types::{CategoryId, CoupleId};

use crate::entities::categories;

fn db_err(e: sea_orm::DbErr) -> ExpenseError {
    ExpenseError::Database(e.to_string())
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists a couple's categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, couple_id: CoupleId) -> Result<Vec<categories::Model>, ExpenseError> {
        categories::Entity::find()
            .filter(categories::Column::CoupleId.eq(couple_id.into_inner()))
            .order_by_asc(categories::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Finds one of a couple's categories.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if the category does not exist or belongs
    /// to another couple.
    pub async fn find(
        &self,
        couple_id: CoupleId,
        category_id: CategoryId,
    ) -> Result<categories::Model, ExpenseError> {
        categories::Entity::find_by_id(category_id.into_inner())
            .filter(categories::Column::CoupleId.eq(couple_id.into_inner()))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?
            .ok_or(ExpenseError::CategoryNotFound(category_id))
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `DuplicateCategory`, or a database error.
    pub async fn create(
        &self,
        couple_id: CoupleId,
        input: NewCategory,
    ) -> Result<categories::Model, ExpenseError> {
        let input = validate_new_category(input)?;
        self.ensure_unique_name(couple_id, &input.name, None).await?;

        let now = chrono::Utc::now().into();
        let category = categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            couple_id: Set(couple_id.into_inner()),
            name: Set(input.name),
            color: Set(input.color),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = category.insert(self.db.as_ref()).await.map_err(db_err)?;
        info!(couple_id = %couple_id, category_id = %model.id, "Category created");
        Ok(model)
    }

    /// Renames or recolors a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound`, a validation error, `DuplicateCategory`,
    /// or a database error.
    pub async fn update(
        &self,
        couple_id: CoupleId,
        category_id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<categories::Model, ExpenseError> {
        let update = validate_category_update(update)?;
        let existing = self.find(couple_id, category_id).await?;

        if let Some(name) = &update.name {
            self.ensure_unique_name(couple_id, name, Some(category_id))
                .await?;
        }

        let mut active: categories::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(color) = update.color {
            active.color = Set(color);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.db.as_ref()).await.map_err(db_err)
    }

    /// Deletes a category. Its expenses keep existing without a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` or a database error.
    pub async fn delete(
        &self,
        couple_id: CoupleId,
        category_id: CategoryId,
    ) -> Result<(), ExpenseError> {
        let result = categories::Entity::delete_many()
            .filter(categories::Column::Id.eq(category_id.into_inner()))
            .filter(categories::Column::CoupleId.eq(couple_id.into_inner()))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(ExpenseError::CategoryNotFound(category_id));
        }

        info!(couple_id = %couple_id, category_id = %category_id, "Category deleted");
        Ok(())
    }

    async fn ensure_unique_name(
        &self,
        couple_id: CoupleId,
        name: &str,
        except: Option<CategoryId>,
    ) -> Result<(), ExpenseError> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::CoupleId.eq(couple_id.into_inner()))
            .filter(categories::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id.into_inner()));
        }

        let existing = query.one(self.db.as_ref()).await.map_err(db_err)?;
        if existing.is_some() {
            return Err(ExpenseError::DuplicateCategory(name.to_string()));
        }
        Ok(())
    }
}
