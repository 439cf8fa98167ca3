//! Settlement routes.
//!
//! `calculate` previews the period and writes nothing. `confirm` re-validates
//! the previewed selection and persists it as a pending settlement. `PUT`
//! completes or cancels a pending settlement.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::CoupleMember};
use tandem_core::settlement::{
    SettlementPeriod, SettlementStatus, SettlementStatusUpdate, WhoPaysWhom,
};
use tandem_db::entities::settlements;
use tandem_db::repositories::settlement::{direction_from_db, status_from_db};
use tandem_db::SettlementRepository;
use tandem_shared::types::{ExpenseId, PageRequest, SettlementId};

/// Creates the settlement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settlements", get(list_settlements))
        .route("/settlements/calculate", post(calculate_settlement))
        .route("/settlements/confirm", post(confirm_settlement))
        .route(
            "/settlements/{settlement_id}",
            get(get_settlement).put(update_settlement),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for previewing a settlement.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    /// First day of the period (YYYY-MM-DD).
    pub period_start: NaiveDate,
    /// Last day of the period (YYYY-MM-DD).
    pub period_end: NaiveDate,
}

/// Request body for confirming a previewed settlement.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    /// First day of the period (YYYY-MM-DD).
    pub period_start: NaiveDate,
    /// Last day of the period (YYYY-MM-DD).
    pub period_end: NaiveDate,
    /// Expenses shown in the preview.
    pub expense_ids: Vec<ExpenseId>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct UpdateSettlementRequest {
    /// `completed` or `cancelled`.
    pub status: String,
}

/// Query parameters for listing settlements.
#[derive(Debug, Deserialize)]
pub struct ListSettlementsQuery {
    /// Filter by status.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u32>,
}

/// A persisted settlement.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    /// Settlement ID.
    pub id: Uuid,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Amount paid by user1.
    pub user1_paid_total: Decimal,
    /// Amount paid by user2.
    pub user2_paid_total: Decimal,
    /// User1's responsibility.
    pub user1_should_pay: Decimal,
    /// User2's responsibility.
    pub user2_should_pay: Decimal,
    /// Size of the settling transfer.
    pub settlement_amount: Decimal,
    /// Direction of the settling transfer.
    pub who_pays_whom: WhoPaysWhom,
    /// Lifecycle status.
    pub status: SettlementStatus,
    /// User who confirmed the settlement.
    pub created_by: Uuid,
    /// When the transfer was marked done.
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// When the settlement was abandoned.
    pub cancelled_at: Option<DateTime<FixedOffset>>,
    /// When the settlement was confirmed.
    pub created_at: DateTime<FixedOffset>,
    /// Covered expenses, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_ids: Option<Vec<ExpenseId>>,
}

impl SettlementResponse {
    fn new(model: settlements::Model, expense_ids: Option<Vec<ExpenseId>>) -> Self {
        Self {
            id: model.id,
            period_start: model.period_start,
            period_end: model.period_end,
            user1_paid_total: model.user1_paid_total,
            user2_paid_total: model.user2_paid_total,
            user1_should_pay: model.user1_should_pay,
            user2_should_pay: model.user2_should_pay,
            settlement_amount: model.settlement_amount,
            who_pays_whom: direction_from_db(&model.direction),
            status: status_from_db(&model.status),
            created_by: model.created_by,
            completed_at: model.completed_at,
            cancelled_at: model.cancelled_at,
            created_at: model.created_at,
            expense_ids,
        }
    }
}

fn parse_status_update(status: &str) -> Result<SettlementStatusUpdate, ApiError> {
    match SettlementStatus::parse(status) {
        Some(SettlementStatus::Completed) => Ok(SettlementStatusUpdate::Completed),
        Some(SettlementStatus::Cancelled) => Ok(SettlementStatusUpdate::Cancelled),
        _ => Err(ApiError::bad_request(
            "INVALID_STATUS",
            "status must be 'completed' or 'cancelled'",
        )),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /settlements/calculate - Preview the unsettled expenses of a period.
async fn calculate_settlement(
    State(state): State<AppState>,
    member: CoupleMember,
    Json(payload): Json<CalculateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let period = SettlementPeriod::new(payload.period_start, payload.period_end)?;

    let preview = SettlementRepository::new(Arc::clone(&state.db))
        .preview(&member.couple, period)
        .await?;

    Ok(Json(json!({
        "transfer": preview.result.transfer(),
        "settlement": preview.result,
        "expenses": preview.expenses,
    })))
}

/// POST /settlements/confirm - Persist a previewed settlement.
async fn confirm_settlement(
    State(state): State<AppState>,
    member: CoupleMember,
    Json(payload): Json<ConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let period = SettlementPeriod::new(payload.period_start, payload.period_end)?;

    let confirmed = SettlementRepository::new(Arc::clone(&state.db))
        .confirm(&member.couple, member.user_id, period, &payload.expense_ids)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SettlementResponse::new(
            confirmed.settlement,
            Some(confirmed.expense_ids),
        )),
    ))
}

/// PUT `/settlements/{settlement_id}` - Complete or cancel a pending settlement.
async fn update_settlement(
    State(state): State<AppState>,
    member: CoupleMember,
    Path(settlement_id): Path<Uuid>,
    Json(payload): Json<UpdateSettlementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = parse_status_update(&payload.status)?;

    let updated = SettlementRepository::new(Arc::clone(&state.db))
        .update_status(
            member.couple.id,
            SettlementId::from_uuid(settlement_id),
            update,
            member.user_id,
        )
        .await?;

    Ok(Json(SettlementResponse::new(updated, None)))
}

/// GET `/settlements/{settlement_id}` - A settlement with its expense ids.
async fn get_settlement(
    State(state): State<AppState>,
    member: CoupleMember,
    Path(settlement_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = SettlementRepository::new(Arc::clone(&state.db))
        .find(member.couple.id, SettlementId::from_uuid(settlement_id))
        .await?;

    Ok(Json(SettlementResponse::new(
        found.settlement,
        Some(found.expense_ids),
    )))
}

/// GET /settlements - The couple's settlements, newest first.
async fn list_settlements(
    State(state): State<AppState>,
    member: CoupleMember,
    Query(query): Query<ListSettlementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(s) => Some(SettlementStatus::parse(s).ok_or_else(|| {
            ApiError::bad_request("INVALID_STATUS", format!("Unknown status: {s}"))
        })?),
    };
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let settlements = SettlementRepository::new(Arc::clone(&state.db))
        .list(member.couple.id, status, &page)
        .await?
        .map(|model| SettlementResponse::new(model, None));

    Ok(Json(settlements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use tandem_db::entities::sea_orm_active_enums::{
        SettlementDirection, SettlementStatus as DbSettlementStatus,
    };
    use tandem_db::entities::{couples, expenses};
    use tandem_shared::types::UserId;

    fn expense_row(
        couple: &couples::Model,
        payer: Uuid,
        amount: Decimal,
        settled: bool,
    ) -> expenses::Model {
        let now = chrono::Utc::now().into();
        expenses::Model {
            id: ExpenseId::new().into_inner(),
            couple_id: couple.id,
            payer_id: payer,
            category_id: None,
            amount,
            split_ratio: dec!(0.5),
            description: String::new(),
            expense_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            settled,
            created_by: payer,
            created_at: now,
            updated_at: now,
        }
    }

    fn settlement_row(couple: &couples::Model, status: DbSettlementStatus) -> settlements::Model {
        let now = chrono::Utc::now().into();
        settlements::Model {
            id: SettlementId::new().into_inner(),
            couple_id: couple.id,
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            user1_paid_total: dec!(1000),
            user2_paid_total: dec!(2000),
            user1_should_pay: dec!(1500),
            user2_should_pay: dec!(1500),
            settlement_amount: dec!(500),
            direction: SettlementDirection::User1PaysUser2,
            status,
            created_by: couple.user1_id,
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case("completed", Some(SettlementStatusUpdate::Completed))]
    #[case("Cancelled", Some(SettlementStatusUpdate::Cancelled))]
    #[case("CANCELLED", Some(SettlementStatusUpdate::Cancelled))]
    #[case("pending", None)]
    #[case("paid", None)]
    #[case("", None)]
    fn test_parse_status_update(
        #[case] input: &str,
        #[case] expected: Option<SettlementStatusUpdate>,
    ) {
        match expected {
            Some(update) => assert_eq!(parse_status_update(input).unwrap(), update),
            None => assert_eq!(parse_status_update(input).unwrap_err().code(), "INVALID_STATUS"),
        }
    }

    #[tokio::test]
    async fn test_calculate_returns_preview() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let couple = test_support::couple_row(alice, bob);
        let rows = vec![
            expense_row(&couple, alice.into_inner(), dec!(1000), false),
            expense_row(&couple, bob.into_inner(), dec!(2000), false),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![couple.clone()]])
            .append_query_results([rows])
            .into_connection();
        let state = test_support::state(db);
        let token = test_support::token(&state, alice);
        let app = test_support::app(routes(), state);

        let response = test_support::send(
            app,
            "POST",
            "/settlements/calculate",
            Some(&token),
            Some(r#"{"period_start":"2024-01-01","period_end":"2024-01-31"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = test_support::json(response).await;
        assert_eq!(body["settlement"]["settlement_amount"], "500");
        assert_eq!(body["settlement"]["who_pays_whom"], "user1_pays_user2");
        assert_eq!(body["expenses"].as_array().unwrap().len(), 2);
        assert_eq!(body["transfer"]["from"], alice.to_string());
        assert_eq!(body["transfer"]["to"], bob.to_string());
        assert_eq!(body["transfer"]["amount"], "500");
    }

    #[tokio::test]
    async fn test_calculate_even_split_has_no_transfer() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let couple = test_support::couple_row(alice, bob);
        let rows = vec![
            expense_row(&couple, alice.into_inner(), dec!(1500), false),
            expense_row(&couple, bob.into_inner(), dec!(1500), false),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![couple.clone()]])
            .append_query_results([rows])
            .into_connection();
        let state = test_support::state(db);
        let token = test_support::token(&state, bob);
        let app = test_support::app(routes(), state);

        let response = test_support::send(
            app,
            "POST",
            "/settlements/calculate",
            Some(&token),
            Some(r#"{"period_start":"2024-01-01","period_end":"2024-01-31"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = test_support::json(response).await;
        assert_eq!(body["settlement"]["who_pays_whom"], "none");
        assert!(body["transfer"].is_null());
    }

    #[tokio::test]
    async fn test_calculate_rejects_reversed_period() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_support::couple_row(alice, bob)]])
            .into_connection();
        let state = test_support::state(db);
        let token = test_support::token(&state, bob);
        let app = test_support::app(routes(), state);

        let response = test_support::send(
            app,
            "POST",
            "/settlements/calculate",
            Some(&token),
            Some(r#"{"period_start":"2024-02-01","period_end":"2024-01-01"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = test_support::json(response).await;
        assert_eq!(body["error"], "INVALID_PERIOD");
    }

    #[tokio::test]
    async fn test_confirm_settled_expense_is_conflict() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let couple = test_support::couple_row(alice, bob);
        let row = expense_row(&couple, alice.into_inner(), dec!(1000), true);
        let body = format!(
            r#"{{"period_start":"2024-01-01","period_end":"2024-01-31","expense_ids":["{}"]}}"#,
            row.id
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![couple]])
            .append_query_results([vec![row]])
            .into_connection();
        let state = test_support::state(db);
        let token = test_support::token(&state, alice);
        let app = test_support::app(routes(), state);

        let response =
            test_support::send(app, "POST", "/settlements/confirm", Some(&token), Some(&body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = test_support::json(response).await;
        assert_eq!(body["error"], "EXPENSE_ALREADY_SETTLED");
    }

    #[tokio::test]
    async fn test_confirm_creates_pending_settlement() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let couple = test_support::couple_row(alice, bob);
        let rows = vec![
            expense_row(&couple, alice.into_inner(), dec!(1000), false),
            expense_row(&couple, bob.into_inner(), dec!(2000), false),
        ];
        let body = format!(
            r#"{{"period_start":"2024-01-01","period_end":"2024-01-31","expense_ids":["{}","{}"]}}"#,
            rows[0].id, rows[1].id
        );
        let created = settlement_row(&couple, DbSettlementStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![couple]])
            .append_query_results([rows])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .append_query_results([vec![created.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let state = test_support::state(db);
        let token = test_support::token(&state, alice);
        let app = test_support::app(routes(), state);

        let response =
            test_support::send(app, "POST", "/settlements/confirm", Some(&token), Some(&body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = test_support::json(response).await;
        assert_eq!(body["status"], "pending");
        assert_eq!(body["who_pays_whom"], "user1_pays_user2");
        assert_eq!(body["expense_ids"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_completed_settlement_is_rejected() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let couple = test_support::couple_row(alice, bob);
        let existing = settlement_row(&couple, DbSettlementStatus::Completed);
        let uri = format!("/settlements/{}", existing.id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![couple]])
            .append_query_results([vec![existing]])
            .into_connection();
        let state = test_support::state(db);
        let token = test_support::token(&state, bob);
        let app = test_support::app(routes(), state);

        let response = test_support::send(
            app,
            "PUT",
            &uri,
            Some(&token),
            Some(r#"{"status":"cancelled"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = test_support::json(response).await;
        assert_eq!(body["error"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_foreign_settlement_is_not_found() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_support::couple_row(alice, bob)]])
            .append_query_results([Vec::<settlements::Model>::new()])
            .into_connection();
        let state = test_support::state(db);
        let token = test_support::token(&state, alice);
        let app = test_support::app(routes(), state);

        let uri = format!("/settlements/{}", SettlementId::new());
        let response = test_support::send(app, "GET", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = test_support::json(response).await;
        assert_eq!(body["error"], "SETTLEMENT_NOT_FOUND");
    }
}
