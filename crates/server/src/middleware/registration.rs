//! Registration gate for the upload route.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use photobooth_core::Registration;

use crate::error::{AppError, REGISTER_FIRST};
use crate::models::session_keys;
use crate::state::AppState;

/// Extractor that requires a registration in the session.
///
/// Runs before the request body is read. A missing session, a missing key
/// and a stored value that no longer validates are all rejected the same
/// way, with a 400 asking the visitor to register. So is a registration
/// whose department the current allow-list no longer permits.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireRegistration(registration): RequireRegistration) -> String {
///     format!("Hello, {}!", registration.name())
/// }
/// ```
pub struct RequireRegistration(pub Registration);

impl FromRequestParts<AppState> for RequireRegistration {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let rejection = || AppError::Precondition(REGISTER_FIRST.to_string());

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or_else(rejection)?;

        let registration: Registration = session
            .get(session_keys::REGISTRATION)
            .await
            .ok()
            .flatten()
            .ok_or_else(rejection)?;

        if !state.departments().permits(registration.department()) {
            tracing::debug!(
                department = %registration.department(),
                "Stored registration names a department no longer allowed"
            );
            return Err(rejection());
        }

        Ok(Self(registration))
    }
}
