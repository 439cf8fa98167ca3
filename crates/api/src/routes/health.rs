//! Health check endpoints.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support;
    use axum::http::StatusCode;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let state = test_support::state(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = routes().with_state(state);

        let response = test_support::send(app, "GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = test_support::json(response).await;
        assert_eq!(body["status"], "healthy");
    }
}
