//! CLI command implementations.

pub mod migrate;
pub mod records;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record query error.
    #[error("Repository error: {0}")]
    Repository(#[from] photobooth_server::db::RepositoryError),

    /// Invalid department argument.
    #[error("Invalid department: {0}")]
    InvalidDepartment(#[from] photobooth_core::DepartmentError),
}

/// Read the database URL, preferring `PHOTOBOOTH_DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("PHOTOBOOTH_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("PHOTOBOOTH_DATABASE_URL"))
}
