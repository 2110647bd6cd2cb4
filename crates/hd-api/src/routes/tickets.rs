//! Ticket list and status changes for any signed-in staff member.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Form, Router,
};
use hd_core::db::create_ticket_repository;
use hd_core::{AuditEvent, TicketStatus};
use serde::Deserialize;
use tracing::info;

use crate::auth::{require_csrf, RequireStaff};
use crate::error::ApiError;
use crate::state::AppState;
use crate::web::{HtmlTemplate, StaffNav, TicketRow, TicketsTemplate};

/// Optional status filter for the ticket list.
#[derive(Debug, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<String>,
}

impl TicketFilter {
    fn parse(&self) -> Result<Option<TicketStatus>, ApiError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| ApiError::BadRequest(format!("Unknown ticket status: {}", s))),
        }
    }
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub csrf_token: String,
    pub status: String,
}

/// Creates the ticket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets))
        .route("/:id/status", post(set_status))
}

async fn list_tickets(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Query(filter): Query<TicketFilter>,
) -> Result<HtmlTemplate<TicketsTemplate>, ApiError> {
    let status = filter.parse()?;
    let tickets = create_ticket_repository(&state.db)
        .list(status)
        .await?
        .into_iter()
        .map(TicketRow::from)
        .collect();

    Ok(HtmlTemplate(TicketsTemplate {
        staff: Some(StaffNav::from(&user)),
        csrf_token: user.csrf_token.clone(),
        filter: status.map_or("all", |s| s.as_str()).to_string(),
        tickets,
    }))
}

/// Sets a ticket's status and returns to the list.
async fn set_status(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, ApiError> {
    require_csrf(&form.csrf_token, &user.csrf_token)?;

    let status: TicketStatus = form
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown ticket status: {}", form.status)))?;

    let updated = create_ticket_repository(&state.db)
        .set_status(id, status)
        .await?;
    if !updated {
        return Err(ApiError::NotFound(format!("Ticket {} not found", id)));
    }

    info!(ticket_id = id, status = %status, username = %user.username, "Ticket status changed");
    let detail = format!("ticket={} status={}", id, status);
    state
        .audit
        .record(&user.username, AuditEvent::TicketStatusChanged, Some(&detail))
        .await;

    Ok(Redirect::to("/tickets"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(status: Option<&str>) -> TicketFilter {
        TicketFilter {
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!(filter(None).parse().unwrap(), None);
        assert_eq!(filter(Some("")).parse().unwrap(), None);
        assert_eq!(filter(Some("all")).parse().unwrap(), None);
        assert_eq!(
            filter(Some("open")).parse().unwrap(),
            Some(TicketStatus::Open)
        );
        assert_eq!(
            filter(Some("Resolved")).parse().unwrap(),
            Some(TicketStatus::Resolved)
        );
    }

    #[test]
    fn test_unknown_filter_is_bad_request() {
        let err = filter(Some("closed")).parse().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
