//! Public pages: the index, ticket submission and ticket search.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use hd_core::db::{create_ticket_repository, DbError, SEARCH_LIMIT};
use hd_core::ticket::MAX_ISSUE_LEN;
use hd_core::{AuditEvent, NewTicket};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{get_session_data, login_csrf_token};
use crate::error::ApiError;
use crate::state::AppState;
use crate::web::{HtmlTemplate, IndexTemplate, SearchTemplate, StaffNav, TicketRow};

const TICKET_STORE_ERROR: &str = "Could not submit your ticket right now. Please try again later.";
const UNKNOWN_STUDENT: &str = "No student is registered with that ID.";
const SEARCH_STORE_ERROR: &str = "Search is temporarily unavailable. Please try again later.";

/// Ticket form as posted by the browser.
#[derive(Debug, Deserialize)]
pub struct TicketForm {
    pub student_id: String,
    pub issue: String,
}

// The validator derive expects a `u64` length bound.
const MAX_ISSUE_LEN_U64: u64 = MAX_ISSUE_LEN as u64;

/// A ticket submission after parsing, checked before it reaches the store.
#[derive(Debug, Validate)]
struct TicketSubmission {
    #[validate(range(min = 1, message = "Enter a valid student ID."))]
    student_id: i64,
    #[validate(length(
        min = 1,
        max = MAX_ISSUE_LEN_U64,
        message = "Describe the issue in 1 to 4000 characters."
    ))]
    issue: String,
}

impl From<TicketForm> for TicketSubmission {
    fn from(form: TicketForm) -> Self {
        Self {
            // Unparseable ids fall out of range and fail validation.
            student_id: form.student_id.trim().parse().unwrap_or(0),
            issue: form.issue.trim().to_string(),
        }
    }
}

impl TicketSubmission {
    /// First failing field message, student id before issue text.
    fn check(&self) -> Result<(), String> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };
        let fields = errors.field_errors();
        let message = ["student_id", "issue"]
            .iter()
            .filter_map(|name| fields.get(*name))
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid ticket.".to_string());
        Err(message)
    }
}

/// Search query string.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Creates the public routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/submit_ticket", post(submit_ticket))
        .route("/search", get(search))
}

/// Renders the portal index with the login, ticket and search forms.
async fn index(session: Session) -> Result<Response, ApiError> {
    render_index(&session, StatusCode::OK, IndexMessages::default()).await
}

#[derive(Default)]
pub(crate) struct IndexMessages {
    pub login_error: Option<String>,
    pub ticket_message: Option<String>,
    pub ticket_error: Option<String>,
}

/// Renders the index page, creating a login token when the session has none.
pub(crate) async fn render_index(
    session: &Session,
    status: StatusCode,
    messages: IndexMessages,
) -> Result<Response, ApiError> {
    let login_csrf = login_csrf_token(session).await?;
    let staff = get_session_data(session).await.as_ref().map(StaffNav::from);

    let page = HtmlTemplate(IndexTemplate {
        staff,
        login_csrf,
        login_error: messages.login_error,
        ticket_message: messages.ticket_message,
        ticket_error: messages.ticket_error,
    });
    Ok((status, page).into_response())
}

/// Files a ticket on behalf of a student. No sign-in required.
async fn submit_ticket(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<TicketForm>,
) -> Result<Response, ApiError> {
    let submission = TicketSubmission::from(form);
    if let Err(message) = submission.check() {
        return ticket_error(&session, StatusCode::UNPROCESSABLE_ENTITY, message).await;
    }

    let repo = create_ticket_repository(&state.db);
    let new_ticket = NewTicket {
        student_id: submission.student_id,
        issue: submission.issue,
    };

    match repo.create(&new_ticket).await {
        Ok(ticket) => {
            info!(ticket_id = ticket.id, student_id = ticket.student_id, "Ticket submitted");
            let detail = format!("ticket={} student={}", ticket.id, ticket.student_id);
            state
                .audit
                .record("anonymous", AuditEvent::TicketSubmitted, Some(&detail))
                .await;

            let messages = IndexMessages {
                ticket_message: Some(format!("Ticket #{} submitted.", ticket.id)),
                ..IndexMessages::default()
            };
            render_index(&session, StatusCode::OK, messages).await
        }
        Err(DbError::Constraint(_)) => {
            warn!(student_id = new_ticket.student_id, "Ticket for unknown student");
            ticket_error(
                &session,
                StatusCode::UNPROCESSABLE_ENTITY,
                UNKNOWN_STUDENT.to_string(),
            )
            .await
        }
        Err(e) => {
            warn!(error = %e, "Ticket store unavailable");
            ticket_error(
                &session,
                StatusCode::SERVICE_UNAVAILABLE,
                TICKET_STORE_ERROR.to_string(),
            )
            .await
        }
    }
}

async fn ticket_error(
    session: &Session,
    status: StatusCode,
    message: String,
) -> Result<Response, ApiError> {
    let messages = IndexMessages {
        ticket_error: Some(message),
        ..IndexMessages::default()
    };
    render_index(session, status, messages).await
}

/// Case-insensitive substring search over ticket issues.
async fn search(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Response {
    let staff = get_session_data(&session).await.as_ref().map(StaffNav::from);
    let repo = create_ticket_repository(&state.db);

    let (status, results, error) = match repo.search(&query.q, SEARCH_LIMIT).await {
        Ok(tickets) => (
            StatusCode::OK,
            tickets.into_iter().map(TicketRow::from).collect(),
            None,
        ),
        Err(e) => {
            warn!(error = %e, "Ticket search failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Vec::new(),
                Some(SEARCH_STORE_ERROR.to_string()),
            )
        }
    };

    let page = HtmlTemplate(SearchTemplate {
        staff,
        query: query.q,
        results,
        error,
    });
    (status, page).into_response()
}
