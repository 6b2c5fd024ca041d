//! Database operations for the photobooth `PostgreSQL` database.
//!
//! ## Schema `photobooth`
//!
//! - `session` - Tower-sessions storage
//! - `employees_<department>` - One table per department, created on first
//!   upload for that department
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p photobooth-cli -- migrate
//! ```

pub mod employees;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::models::{EmployeeRecord, NewEmployeeRecord};

pub use employees::PgEmployeeStore;

/// Schema holding the session table and every department table.
pub const SCHEMA: &str = "photobooth";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage for employee records, one collection per department.
///
/// Collections are created on first use; there is no registry of valid
/// departments at this layer.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Persist a record in its department's collection and return it with
    /// the generated id and timestamp.
    async fn insert(&self, record: NewEmployeeRecord) -> Result<EmployeeRecord, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
