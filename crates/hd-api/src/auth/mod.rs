//! Session handling and access guards for the portal.
//!
//! This module provides:
//! - Helpers to read and write the logical session fields
//! - Guard extractors that consult the session gate
//! - CSRF protection for forms

pub mod csrf;
pub mod extractors;

pub use csrf::{generate_csrf_token, require_csrf, validate_csrf_token};
pub use extractors::{RequireAdmin, RequireStaff, RequireSupport};

use hd_core::{SessionData, SessionState};
use tower_sessions::Session;

/// Session key for storing the authenticated staff member.
pub const SESSION_USER_KEY: &str = "user";

/// Session key for the CSRF token of the login form.
pub const LOGIN_CSRF_KEY: &str = "login_csrf";

/// Gets the session data from the session.
pub async fn get_session_data(session: &Session) -> Option<SessionData> {
    session
        .get::<SessionData>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten()
}

/// Reads the session as the gate sees it.
pub async fn session_state(session: &Session) -> SessionState {
    SessionState::from(get_session_data(session).await)
}

/// Stores session data in the session.
pub async fn set_session_data(
    session: &Session,
    data: SessionData,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(SESSION_USER_KEY, data).await
}

/// Drops every value held by the session (logout).
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Returns the login form token, creating one if the session has none.
pub async fn login_csrf_token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(token) = session.get::<String>(LOGIN_CSRF_KEY).await? {
        return Ok(token);
    }
    let token = generate_csrf_token();
    session.insert(LOGIN_CSRF_KEY, &token).await?;
    Ok(token)
}
