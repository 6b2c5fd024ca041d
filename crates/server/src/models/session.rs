//! Session-related types.
//!
//! The session holds a single typed [`Registration`](photobooth_core::Registration)
//! rather than loose fields, so a partially written session can never pass the
//! upload gate.

/// Session keys for registration data.
pub mod keys {
    /// Key for the visitor's validated registration.
    pub const REGISTRATION: &str = "registration";
}
