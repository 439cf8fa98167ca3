//! The caller's couple.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::{AppState, extractors::CoupleMember};

/// Creates the couple routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/couple", get(get_couple))
}

/// GET /couple - The caller's couple and partner.
async fn get_couple(member: CoupleMember) -> Json<Value> {
    let couple = &member.couple;
    Json(json!({
        "id": couple.id,
        "name": couple.name,
        "user1_id": couple.partners.user1_id,
        "user2_id": couple.partners.user2_id,
        "partner_id": couple.partner_of(member.user_id),
    }))
}
