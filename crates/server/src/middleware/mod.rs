//! HTTP middleware stack for the photobooth API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (only when an allowed origin is configured)
//! 4. Body limit
//! 5. Session layer (tower-sessions, signed cookie)

pub mod registration;
pub mod session;

pub use registration::RequireRegistration;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, signing_key};
