//! Expense routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::CoupleMember};
use tandem_core::expense::{ExpenseUpdate, NewExpense};
use tandem_db::{ExpenseFilter, ExpenseRepository};
use tandem_shared::types::{ExpenseId, PageRequest};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/{expense_id}",
            get(get_expense).patch(update_expense).delete(delete_expense),
        )
}

/// Query parameters for listing expenses.
#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    /// Filter by date range start (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Filter by date range end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Filter by settlement state.
    pub settled: Option<bool>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u32>,
}

/// GET /expenses - The couple's expenses, newest first.
async fn list_expenses(
    State(state): State<AppState>,
    member: CoupleMember,
    Query(query): Query<ListExpensesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from > to
    {
        return Err(ApiError::bad_request(
            "INVALID_DATE_RANGE",
            "'from' must not be after 'to'",
        ));
    }

    let filter = ExpenseFilter {
        from: query.from,
        to: query.to,
        settled: query.settled,
    };
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let expenses = ExpenseRepository::new(Arc::clone(&state.db))
        .list(member.couple.id, filter, &page)
        .await?;

    Ok(Json(expenses))
}

/// POST /expenses - Record an expense paid by either partner.
async fn create_expense(
    State(state): State<AppState>,
    member: CoupleMember,
    Json(payload): Json<NewExpense>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = ExpenseRepository::new(Arc::clone(&state.db))
        .create(&member.couple, member.user_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET `/expenses/{expense_id}` - One expense.
async fn get_expense(
    State(state): State<AppState>,
    member: CoupleMember,
    Path(expense_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = ExpenseRepository::new(Arc::clone(&state.db))
        .find(member.couple.id, ExpenseId::from_uuid(expense_id))
        .await?;

    Ok(Json(expense))
}

/// PATCH `/expenses/{expense_id}` - Edit an unsettled expense.
async fn update_expense(
    State(state): State<AppState>,
    member: CoupleMember,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = ExpenseRepository::new(Arc::clone(&state.db))
        .update(&member.couple, ExpenseId::from_uuid(expense_id), payload)
        .await?;

    Ok(Json(expense))
}

/// DELETE `/expenses/{expense_id}` - Remove an unsettled expense.
async fn delete_expense(
    State(state): State<AppState>,
    member: CoupleMember,
    Path(expense_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ExpenseRepository::new(Arc::clone(&state.db))
        .delete(member.couple.id, ExpenseId::from_uuid(expense_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
