//! Session middleware configuration.
//!
//! Sessions live in the store passed in (`PostgreSQL` in production); the
//! cookie only carries the signed session id.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::SessionConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "photobooth_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Derive the cookie signing key from the session secret.
#[must_use]
pub fn signing_key(config: &SessionConfig) -> Key {
    Key::from(&Sha512::digest(config.secret.expose_secret().as_bytes())[..])
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &SessionConfig,
) -> SessionManagerLayer<S, tower_sessions::service::SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(secret: &str) -> SessionConfig {
        SessionConfig {
            secret: SecretString::from(secret.to_string()),
            secure: false,
        }
    }

    #[test]
    fn test_signing_key_is_deterministic() {
        let a = signing_key(&config("k3P9xQ2mV7nR4tY8wZ1bC6dF0gH5jL2s"));
        let b = signing_key(&config("k3P9xQ2mV7nR4tY8wZ1bC6dF0gH5jL2s"));
        assert_eq!(a.master(), b.master());
    }

    #[test]
    fn test_signing_key_depends_on_secret() {
        let a = signing_key(&config("k3P9xQ2mV7nR4tY8wZ1bC6dF0gH5jL2s"));
        let b = signing_key(&config("Z8y7X6w5V4u3T2s1R0q9P8o7N6m5L4k3"));
        assert_ne!(a.master(), b.master());
    }
}
