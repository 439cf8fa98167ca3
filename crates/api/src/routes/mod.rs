//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod categories;
pub mod couple;
pub mod expenses;
pub mod health;
pub mod settlements;

/// Creates the API router. Everything but the health check requires a token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(couple::routes())
        .merge(settlements::routes())
        .merge(expenses::routes())
        .merge(categories::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
