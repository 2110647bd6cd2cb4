//! Axum extractors that guard staff routes.
//!
//! Each protected handler names exactly one guard in its signature. The guard
//! asks the [`hd_core::SessionGate`] whether the session satisfies the
//! requirement before the handler body runs.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use hd_core::{AccessRequirement, Role, SessionData, SessionState};
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::session_state;

async fn guard<S>(
    parts: &mut Parts,
    state: &S,
    requirement: AccessRequirement,
) -> Result<SessionData, ApiError>
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    let app_state = AppState::from_ref(state);
    let session = Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| ApiError::Internal(msg.to_string()))?;

    let current = session_state(&session).await;
    let allowed = app_state.gate.authorize(&current, requirement);

    match current {
        SessionState::Authenticated(data) if allowed => Ok(data),
        SessionState::Authenticated(data) => {
            warn!(
                username = %data.username,
                role = %data.role,
                required = %requirement,
                path = %parts.uri.path(),
                "Access denied"
            );
            Err(ApiError::Forbidden(format!("{} required", requirement)))
        }
        SessionState::Anonymous => {
            debug!(path = %parts.uri.path(), "Anonymous request to protected route");
            Err(ApiError::NotAuthenticated)
        }
    }
}

macro_rules! define_session_guard {
    ($name:ident, $requirement:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $name(pub SessionData);

        #[async_trait]
        impl<S> FromRequestParts<S> for $name
        where
            AppState: FromRef<S>,
            S: Send + Sync,
        {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                guard(parts, state, $requirement).await.map($name)
            }
        }
    };
}

define_session_guard!(
    RequireStaff,
    AccessRequirement::AnyAuthenticated,
    "Admits any authenticated staff member."
);
define_session_guard!(
    RequireAdmin,
    AccessRequirement::Role(Role::Admin),
    "Admits admin sessions only. Support sessions get 403."
);
define_session_guard!(
    RequireSupport,
    AccessRequirement::Role(Role::Support),
    "Admits support sessions only. Admin sessions get 403."
);
