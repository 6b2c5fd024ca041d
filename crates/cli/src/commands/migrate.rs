//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! photobooth-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PHOTOBOOTH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/`. They create the
//! `photobooth` schema and its session table; department tables are created
//! by the server on first upload.

use photobooth_server::db;

use super::{CommandError, database_url};

/// Run the photobooth database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or
/// a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to photobooth database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running photobooth migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Photobooth migrations complete!");
    Ok(())
}
