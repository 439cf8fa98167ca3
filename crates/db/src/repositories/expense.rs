//! Expense repository.
//!
//! All reads and writes are scoped to a couple. Rows of other couples are
//! reported as not found.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use tandem_core::expense::{
    ExpenseError, ExpenseUpdate, NewExpense, ensure_deletable, validate_expense_update,
    validate_new_expense,
};
use tandem_core::settlement::{ExpenseRecord, SettlementPeriod};
use tandem_shared::types::{CategoryId, CoupleId, ExpenseId, PageRequest, PageResponse, UserId};

use super::couple::Couple;
use crate::entities::{categories, expenses};

/// Filter for listing expenses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpenseFilter {
    /// Earliest expense date (inclusive).
    pub from: Option<NaiveDate>,
    /// Latest expense date (inclusive).
    pub to: Option<NaiveDate>,
    /// Only settled or only unsettled expenses.
    pub settled: Option<bool>,
}

/// Converts a stored expense into the calculator's view of it.
#[must_use]
pub fn to_record(model: &expenses::Model) -> ExpenseRecord {
    ExpenseRecord {
        id: ExpenseId::from_uuid(model.id),
        amount: model.amount,
        payer_id: UserId::from_uuid(model.payer_id),
        split_ratio: model.split_ratio,
        date: model.expense_date,
        settled: model.settled,
    }
}

fn db_err(e: sea_orm::DbErr) -> ExpenseError {
    ExpenseError::Database(e.to_string())
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: Arc<DatabaseConnection>,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists a couple's expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        couple_id: CoupleId,
        filter: ExpenseFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<expenses::Model>, ExpenseError> {
        let page = page.normalized();

        let mut query =
            expenses::Entity::find().filter(expenses::Column::CoupleId.eq(couple_id.into_inner()));
        if let Some(from) = filter.from {
            query = query.filter(expenses::Column::ExpenseDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expenses::Column::ExpenseDate.lte(to));
        }
        if let Some(settled) = filter.settled {
            query = query.filter(expenses::Column::Settled.eq(settled));
        }

        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let data = query
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Finds one of a couple's expenses.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` if the expense does not exist or belongs to
    /// another couple.
    pub async fn find(
        &self,
        couple_id: CoupleId,
        expense_id: ExpenseId,
    ) -> Result<expenses::Model, ExpenseError> {
        expenses::Entity::find_by_id(expense_id.into_inner())
            .filter(expenses::Column::CoupleId.eq(couple_id.into_inner()))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?
            .ok_or(ExpenseError::ExpenseNotFound(expense_id))
    }

    /// Records a new expense.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, `CategoryNotFound` for a
    /// category of another couple, or a database error.
    pub async fn create(
        &self,
        couple: &Couple,
        created_by: UserId,
        input: NewExpense,
    ) -> Result<expenses::Model, ExpenseError> {
        let input = validate_new_expense(input, &couple.partners)?;
        if let Some(category_id) = input.category_id {
            self.ensure_category(couple.id, category_id).await?;
        }

        let now = chrono::Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(ExpenseId::new().into_inner()),
            couple_id: Set(couple.id.into_inner()),
            payer_id: Set(input.payer_id.into_inner()),
            category_id: Set(input.category_id.map(CategoryId::into_inner)),
            amount: Set(input.amount),
            split_ratio: Set(input.split_ratio),
            description: Set(input.description),
            expense_date: Set(input.expense_date),
            settled: Set(false),
            created_by: Set(created_by.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = expense.insert(self.db.as_ref()).await.map_err(db_err)?;

        info!(
            couple_id = %couple.id,
            expense_id = %model.id,
            amount = %model.amount,
            "Expense recorded"
        );

        Ok(model)
    }

    /// Applies a partial update to an unsettled expense.
    ///
    /// The row is locked for the duration of the update so it cannot be
    /// settled underneath us.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound`, `ExpenseSettled`, a validation error, or a
    /// database error.
    pub async fn update(
        &self,
        couple: &Couple,
        expense_id: ExpenseId,
        update: ExpenseUpdate,
    ) -> Result<expenses::Model, ExpenseError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = expenses::Entity::find_by_id(expense_id.into_inner())
            .filter(expenses::Column::CoupleId.eq(couple.id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(ExpenseError::ExpenseNotFound(expense_id))?;

        let update = validate_expense_update(expense_id, existing.settled, update, &couple.partners)?;
        if let Some(Some(category_id)) = update.category_id {
            self.ensure_category(couple.id, category_id).await?;
        }

        let mut active: expenses::ActiveModel = existing.into();
        if let Some(amount) = update.amount {
            active.amount = Set(amount);
        }
        if let Some(split_ratio) = update.split_ratio {
            active.split_ratio = Set(split_ratio);
        }
        if let Some(payer_id) = update.payer_id {
            active.payer_id = Set(payer_id.into_inner());
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(category_id.map(CategoryId::into_inner));
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        if let Some(expense_date) = update.expense_date {
            active.expense_date = Set(expense_date);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(couple_id = %couple.id, expense_id = %expense_id, "Expense updated");

        Ok(updated)
    }

    /// Deletes an unsettled expense.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound`, `ExpenseSettled`, or a database error.
    pub async fn delete(
        &self,
        couple_id: CoupleId,
        expense_id: ExpenseId,
    ) -> Result<(), ExpenseError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = expenses::Entity::find_by_id(expense_id.into_inner())
            .filter(expenses::Column::CoupleId.eq(couple_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(ExpenseError::ExpenseNotFound(expense_id))?;

        ensure_deletable(expense_id, existing.settled)?;

        expenses::Entity::delete_by_id(existing.id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(couple_id = %couple_id, expense_id = %expense_id, "Expense deleted");

        Ok(())
    }

    /// Lists a couple's unsettled expenses dated inside the period, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_unsettled_in_period(
        &self,
        couple_id: CoupleId,
        period: &SettlementPeriod,
    ) -> Result<Vec<expenses::Model>, sea_orm::DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::CoupleId.eq(couple_id.into_inner()))
            .filter(expenses::Column::Settled.eq(false))
            .filter(expenses::Column::ExpenseDate.gte(period.start()))
            .filter(expenses::Column::ExpenseDate.lte(period.end()))
            .order_by_asc(expenses::Column::ExpenseDate)
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn ensure_category(
        &self,
        couple_id: CoupleId,
        category_id: CategoryId,
    ) -> Result<(), ExpenseError> {
        categories::Entity::find_by_id(category_id.into_inner())
            .filter(categories::Column::CoupleId.eq(couple_id.into_inner()))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?
            .map(|_| ())
            .ok_or(ExpenseError::CategoryNotFound(category_id))
    }
}
