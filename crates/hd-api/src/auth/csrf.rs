//! CSRF (Cross-Site Request Forgery) protection.
//!
//! Staff forms carry the token stored in the session data. The login form
//! carries a token bound to the anonymous session under
//! [`super::LOGIN_CSRF_KEY`].

use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ApiError;

/// Generates a new CSRF token.
pub fn generate_csrf_token() -> String {
    hd_core::auth::generate_token()
}

/// Validates a CSRF token against the expected value.
///
/// Uses constant-time comparison to prevent timing attacks.
pub fn validate_csrf_token(submitted: &str, expected: &str) -> bool {
    if submitted.len() != expected.len() || expected.is_empty() {
        return false;
    }
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Rejects the request unless `submitted` matches `expected`.
pub fn require_csrf(submitted: &str, expected: &str) -> Result<(), ApiError> {
    if validate_csrf_token(submitted, expected) {
        Ok(())
    } else {
        warn!("CSRF validation failed");
        Err(ApiError::CsrfValidationFailed)
    }
}
