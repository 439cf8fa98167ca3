//! Request extractors.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use tandem_db::{Couple, CoupleRepository};
use tandem_shared::types::UserId;

/// The authenticated user together with their couple.
///
/// Rejects callers who are not paired with `403 NO_COUPLE`.
#[derive(Debug, Clone)]
pub struct CoupleMember {
    /// The caller.
    pub user_id: UserId,
    /// The caller's couple.
    pub couple: Couple,
}

impl FromRequestParts<AppState> for CoupleMember {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let user_id = auth.user_id();

        let couple = CoupleRepository::new(Arc::clone(&state.db))
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %user_id, "Caller has no couple");
                ApiError::no_couple()
            })?;

        Ok(Self { user_id, couple })
    }
}
