//! Settlement repository.
//!
//! Previews read unsettled expenses and run the calculator. Confirmation
//! runs in one database transaction:
//!
//! 1. Lock the selected expense rows (`SELECT ... FOR UPDATE`)
//! 2. Re-validate the selection and recompute the settlement
//! 3. Flip `settled` with `UPDATE ... WHERE settled = false`
//! 4. Insert the settlement and its expense links
//!
//! The conditional update in step 3 is the serialization point: if it
//! touches fewer rows than were selected, another confirmation won the race
//! and the whole transaction is rolled back.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use tandem_core::settlement::{
    SettlementCalculator, SettlementError, SettlementPeriod, SettlementResult, SettlementStatus,
    SettlementStatusService, SettlementStatusUpdate, StoredExpense, WhoPaysWhom,
    prepare_confirmation,
};
use tandem_shared::types::{CoupleId, ExpenseId, PageRequest, PageResponse, SettlementId, UserId};

use super::couple::Couple;
use super::expense::{ExpenseRepository, to_record};
use crate::entities::{
    expenses,
    sea_orm_active_enums::{SettlementDirection, SettlementStatus as DbSettlementStatus},
    settlement_expenses, settlements,
};

/// A settlement with the ids of the expenses it covers.
#[derive(Debug, Clone)]
pub struct SettlementWithExpenses {
    /// The settlement row.
    pub settlement: settlements::Model,
    /// Expenses linked to it.
    pub expense_ids: Vec<ExpenseId>,
}

/// Result of a settlement preview.
#[derive(Debug, Clone)]
pub struct SettlementPreview {
    /// Calculated settlement.
    pub result: SettlementResult,
    /// The unsettled expenses it was computed from.
    pub expenses: Vec<expenses::Model>,
}

/// Converts a database status to the core status.
#[must_use]
pub fn status_from_db(status: &DbSettlementStatus) -> SettlementStatus {
    match status {
        DbSettlementStatus::Pending => SettlementStatus::Pending,
        DbSettlementStatus::Completed => SettlementStatus::Completed,
        DbSettlementStatus::Cancelled => SettlementStatus::Cancelled,
    }
}

/// Converts a core status to the database status.
#[must_use]
pub fn status_to_db(status: SettlementStatus) -> DbSettlementStatus {
    match status {
        SettlementStatus::Pending => DbSettlementStatus::Pending,
        SettlementStatus::Completed => DbSettlementStatus::Completed,
        SettlementStatus::Cancelled => DbSettlementStatus::Cancelled,
    }
}

/// Converts a database direction to the core direction.
#[must_use]
pub fn direction_from_db(direction: &SettlementDirection) -> WhoPaysWhom {
    match direction {
        SettlementDirection::User1PaysUser2 => WhoPaysWhom::User1PaysUser2,
        SettlementDirection::User2PaysUser1 => WhoPaysWhom::User2PaysUser1,
        SettlementDirection::NoTransfer => WhoPaysWhom::NoTransfer,
    }
}

fn direction_to_db(direction: WhoPaysWhom) -> SettlementDirection {
    match direction {
        WhoPaysWhom::User1PaysUser2 => SettlementDirection::User1PaysUser2,
        WhoPaysWhom::User2PaysUser1 => SettlementDirection::User2PaysUser1,
        WhoPaysWhom::NoTransfer => SettlementDirection::NoTransfer,
    }
}

fn db_err(e: DbErr) -> SettlementError {
    SettlementError::Database(e.to_string())
}

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: Arc<DatabaseConnection>,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Calculates what settling the period would look like. Writes nothing.
    ///
    /// # Errors
    ///
    /// Returns a calculator precondition error or a database error.
    pub async fn preview(
        &self,
        couple: &Couple,
        period: SettlementPeriod,
    ) -> Result<SettlementPreview, SettlementError> {
        let rows = ExpenseRepository::new(Arc::clone(&self.db))
            .list_unsettled_in_period(couple.id, &period)
            .await
            .map_err(db_err)?;

        let records: Vec<_> = rows.iter().map(to_record).collect();
        let result = SettlementCalculator::calculate(
            &records,
            couple.partners.user1_id,
            couple.partners.user2_id,
            period,
        )?;

        Ok(SettlementPreview {
            result,
            expenses: rows,
        })
    }

    /// Confirms a previewed selection, creating a pending settlement.
    ///
    /// # Errors
    ///
    /// - Validation errors for a malformed selection
    /// - Conflict errors if the selection changed since the preview, or a
    ///   concurrent confirmation settled some of the expenses first
    /// - `NothingToSettle` if the selection nets out to zero
    /// - `Database` for store failures
    pub async fn confirm(
        &self,
        couple: &Couple,
        created_by: UserId,
        period: SettlementPeriod,
        expense_ids: &[ExpenseId],
    ) -> Result<SettlementWithExpenses, SettlementError> {
        if expense_ids.is_empty() {
            return Err(SettlementError::EmptySelection);
        }

        let ids: Vec<_> = expense_ids.iter().map(|id| id.into_inner()).collect();
        let txn = self.db.begin().await.map_err(db_err)?;

        // 1. Lock the selected rows
        let rows = expenses::Entity::find()
            .filter(expenses::Column::Id.is_in(ids.clone()))
            .filter(expenses::Column::CoupleId.eq(couple.id.into_inner()))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(db_err)?;

        let current: Vec<StoredExpense> = rows
            .iter()
            .map(|row| StoredExpense {
                couple_id: CoupleId::from_uuid(row.couple_id),
                record: to_record(row),
            })
            .collect();

        // 2. Re-validate and recompute
        let result = prepare_confirmation(
            couple.id,
            couple.partners.user1_id,
            couple.partners.user2_id,
            period,
            expense_ids,
            &current,
        )
        .inspect_err(|e| {
            if e.is_conflict() {
                warn!(couple_id = %couple.id, error = %e, "Settlement selection changed since preview");
            }
        })?;

        // 3. Conditional update
        let now = Utc::now();
        let expected = ids.len() as u64;
        let updated = expenses::Entity::update_many()
            .col_expr(expenses::Column::Settled, Expr::value(true))
            .col_expr(expenses::Column::UpdatedAt, Expr::value(now))
            .filter(expenses::Column::Id.is_in(ids.clone()))
            .filter(expenses::Column::CoupleId.eq(couple.id.into_inner()))
            .filter(expenses::Column::Settled.eq(false))
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;

        if updated != expected {
            txn.rollback().await.map_err(db_err)?;
            warn!(
                couple_id = %couple.id,
                expected,
                updated,
                "Concurrent settlement detected, rolled back"
            );
            return Err(SettlementError::ConcurrentSettlement { expected, updated });
        }

        // 4. Settlement and links
        let settlement_id = SettlementId::new().into_inner();
        let settlement = settlements::ActiveModel {
            id: Set(settlement_id),
            couple_id: Set(couple.id.into_inner()),
            period_start: Set(result.period_start),
            period_end: Set(result.period_end),
            user1_paid_total: Set(result.user1_paid_total),
            user2_paid_total: Set(result.user2_paid_total),
            user1_should_pay: Set(result.user1_should_pay),
            user2_should_pay: Set(result.user2_should_pay),
            settlement_amount: Set(result.settlement_amount),
            direction: Set(direction_to_db(result.who_pays_whom)),
            status: Set(DbSettlementStatus::Pending),
            created_by: Set(created_by.into_inner()),
            completed_at: Set(None),
            cancelled_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let links = ids.iter().map(|expense_id| settlement_expenses::ActiveModel {
            settlement_id: Set(settlement_id),
            expense_id: Set(*expense_id),
            created_at: Set(now.into()),
        });
        settlement_expenses::Entity::insert_many(links)
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            couple_id = %couple.id,
            settlement_id = %settlement_id,
            amount = %result.settlement_amount,
            direction = %result.who_pays_whom,
            expenses = expected,
            "Settlement confirmed"
        );

        Ok(SettlementWithExpenses {
            settlement,
            expense_ids: expense_ids.to_vec(),
        })
    }

    /// Completes or cancels a pending settlement.
    ///
    /// Cancelling leaves the covered expenses settled.
    ///
    /// # Errors
    ///
    /// Returns `SettlementNotFound`, `InvalidTransition`, or a database error.
    pub async fn update_status(
        &self,
        couple_id: CoupleId,
        settlement_id: SettlementId,
        update: SettlementStatusUpdate,
        changed_by: UserId,
    ) -> Result<settlements::Model, SettlementError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = settlements::Entity::find_by_id(settlement_id.into_inner())
            .filter(settlements::Column::CoupleId.eq(couple_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(SettlementError::SettlementNotFound(settlement_id))?;

        let change =
            SettlementStatusService::apply(status_from_db(&existing.status), update, changed_by)?;

        let changed_at = change.changed_at.into();
        let mut active: settlements::ActiveModel = existing.into();
        active.status = Set(status_to_db(change.to));
        match change.to {
            SettlementStatus::Completed => active.completed_at = Set(Some(changed_at)),
            SettlementStatus::Cancelled => active.cancelled_at = Set(Some(changed_at)),
            SettlementStatus::Pending => {}
        }
        active.updated_at = Set(changed_at);

        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(
            couple_id = %couple_id,
            settlement_id = %settlement_id,
            from = %change.from,
            to = %change.to,
            changed_by = %change.changed_by,
            "Settlement status changed"
        );

        Ok(updated)
    }

    /// Finds one of a couple's settlements with its expense ids.
    ///
    /// # Errors
    ///
    /// Returns `SettlementNotFound` or a database error.
    pub async fn find(
        &self,
        couple_id: CoupleId,
        settlement_id: SettlementId,
    ) -> Result<SettlementWithExpenses, SettlementError> {
        let settlement = settlements::Entity::find_by_id(settlement_id.into_inner())
            .filter(settlements::Column::CoupleId.eq(couple_id.into_inner()))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?
            .ok_or(SettlementError::SettlementNotFound(settlement_id))?;

        let expense_ids = settlement_expenses::Entity::find()
            .filter(settlement_expenses::Column::SettlementId.eq(settlement.id))
            .order_by_asc(settlement_expenses::Column::ExpenseId)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|link| ExpenseId::from_uuid(link.expense_id))
            .collect();

        Ok(SettlementWithExpenses {
            settlement,
            expense_ids,
        })
    }

    /// Lists a couple's settlements, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(
        &self,
        couple_id: CoupleId,
        status: Option<SettlementStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<settlements::Model>, SettlementError> {
        let page = page.normalized();

        let mut query = settlements::Entity::find()
            .filter(settlements::Column::CoupleId.eq(couple_id.into_inner()));
        if let Some(status) = status {
            query = query.filter(settlements::Column::Status.eq(status_to_db(status)));
        }

        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;
        let data = query
            .order_by_desc(settlements::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}
