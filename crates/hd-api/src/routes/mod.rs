//! Portal routes.

pub mod admin;
pub mod auth;
pub mod health;
pub mod portal;
pub mod support;
pub mod tickets;

use crate::state::AppState;
use axum::Router;

/// Creates the main portal router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(portal::routes())
        .merge(auth::routes())
        .merge(health::routes())
        .nest("/admin", admin::routes())
        .nest("/support", support::routes())
        .nest("/tickets", tickets::routes())
        .with_state(state)
}
