//! Authentication routes for login and logout.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Form, Router,
};
use hd_core::AuthOutcome;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::auth::{
    clear_session, session_state, set_session_data, validate_csrf_token, LOGIN_CSRF_KEY,
};
use crate::error::ApiError;
use crate::routes::portal::{render_index, IndexMessages};
use crate::state::AppState;

const SESSION_EXPIRED: &str = "Session expired. Please refresh and try again.";
const INVALID_REQUEST: &str = "Invalid request. Please try again.";

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

/// Creates the auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_submit))
        .route("/logout", post(logout))
}

/// Handles login form submission.
async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    // The token is checked before any credential work.
    let stored_csrf: Option<String> = session.get(LOGIN_CSRF_KEY).await?;
    match &stored_csrf {
        None => {
            return login_error(&session, StatusCode::OK, SESSION_EXPIRED).await;
        }
        Some(stored) if !validate_csrf_token(&form.csrf_token, stored) => {
            warn!("CSRF validation failed for login attempt");
            return login_error(&session, StatusCode::OK, INVALID_REQUEST).await;
        }
        Some(_) => {}
    }

    session.remove::<String>(LOGIN_CSRF_KEY).await?;

    match state.gate.authenticate(&form.username, &form.password).await {
        AuthOutcome::Success(data) => {
            // New id for the authenticated session.
            if let Err(e) = session.cycle_id().await {
                warn!(error = %e, "Failed to regenerate session ID");
            }

            let landing = data.role.landing_path();
            let username = data.username.clone();
            set_session_data(&session, data).await?;

            info!(username = %username, landing, "Session established");
            Ok(Redirect::to(landing).into_response())
        }
        outcome @ AuthOutcome::InvalidCredentials => {
            let message = outcome.message().unwrap_or_default();
            login_error(&session, StatusCode::OK, message).await
        }
        outcome @ AuthOutcome::ServiceUnavailable => {
            let message = outcome.message().unwrap_or_default();
            login_error(&session, StatusCode::SERVICE_UNAVAILABLE, message).await
        }
    }
}

/// Handles logout. Always succeeds, signed in or not.
async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    let mut current = session_state(&session).await;
    state.gate.logout(&mut current).await;

    if let Err(e) = clear_session(&session).await {
        warn!(error = %e, "Error clearing session during logout");
    }

    Redirect::to("/")
}

/// Re-renders the index with a login error and a fresh login token.
async fn login_error(
    session: &Session,
    status: StatusCode,
    message: &str,
) -> Result<Response, ApiError> {
    let messages = IndexMessages {
        login_error: Some(message.to_string()),
        ..IndexMessages::default()
    };
    render_index(session, status, messages).await
}
