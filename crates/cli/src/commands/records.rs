//! Record inspection commands.
//!
//! # Usage
//!
//! ```bash
//! # List departments that have received uploads
//! photobooth-cli departments
//!
//! # Show the latest records of a department
//! photobooth-cli records Engineering --limit 20
//! ```

use photobooth_core::Department;
use photobooth_server::db::{self, PgEmployeeStore};

use super::{CommandError, database_url};

async fn connect() -> Result<PgEmployeeStore, CommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    Ok(PgEmployeeStore::new(pool))
}

/// Print every department that has a record table.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the query fails.
pub async fn departments() -> Result<(), CommandError> {
    let store = connect().await?;
    let departments = store.departments().await?;

    if departments.is_empty() {
        tracing::info!("No departments yet");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    for department in departments {
        println!("{department}");
    }
    Ok(())
}

/// Print the newest records of `department`, one per line.
///
/// # Errors
///
/// Returns an error if the department name is invalid, the database is
/// unreachable or the query fails.
pub async fn list(department: &str, limit: i64) -> Result<(), CommandError> {
    let department = Department::parse(department)?;
    let store = connect().await?;
    let records = store.list(&department, limit).await?;

    tracing::info!(department = %department, count = records.len(), "Fetched records");

    #[allow(clippy::print_stdout)]
    for record in records {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.id,
            record.created_at.to_rfc3339(),
            record.name,
            record.email,
            record.image_path
        );
    }
    Ok(())
}
