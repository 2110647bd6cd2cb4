//! Support landing page.

use axum::{extract::State, routing::get, Router};
use hd_core::db::create_ticket_repository;
use hd_core::TicketStatus;

use crate::auth::RequireSupport;
use crate::error::ApiError;
use crate::state::AppState;
use crate::web::{HtmlTemplate, StaffNav, SupportLandingTemplate, TicketRow};

/// Creates the support routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(landing))
}

/// The open ticket queue.
async fn landing(
    State(state): State<AppState>,
    RequireSupport(user): RequireSupport,
) -> Result<HtmlTemplate<SupportLandingTemplate>, ApiError> {
    let tickets = create_ticket_repository(&state.db)
        .list(Some(TicketStatus::Open))
        .await?
        .into_iter()
        .map(TicketRow::from)
        .collect();

    Ok(HtmlTemplate(SupportLandingTemplate {
        staff: Some(StaffNav::from(&user)),
        tickets,
    }))
}
