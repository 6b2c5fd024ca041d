//! Employee record repository.
//!
//! Each department gets its own table, `photobooth."employees_<department>"`,
//! selected at request time from the registration's department. Table names
//! are built from a validated [`Department`], then quoted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use photobooth_core::{Department, Email, EmployeeId};

use super::{EmployeeStore, RepositoryError, SCHEMA};
use crate::models::{EmployeeRecord, NewEmployeeRecord};

/// Upper bound on department tables remembered as already created.
const KNOWN_TABLES_CAPACITY: u64 = 1_024;

/// `PostgreSQL` error code for `duplicate_table`.
const DUPLICATE_TABLE: &str = "42P07";

/// `PostgreSQL` error code for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

type EmployeeRow = (EmployeeId, String, Email, Department, String, DateTime<Utc>);

/// `PostgreSQL`-backed [`EmployeeStore`].
#[derive(Clone)]
pub struct PgEmployeeStore {
    pool: PgPool,
    known_tables: Cache<Department, ()>,
}

impl PgEmployeeStore {
    /// Create a new employee repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            known_tables: Cache::new(KNOWN_TABLES_CAPACITY),
        }
    }

    /// Create the department's table if it does not exist yet.
    ///
    /// Two requests racing to create the same table both succeed: the loser's
    /// duplicate-object error is swallowed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the DDL fails for any other reason.
    #[instrument(skip(self), fields(department = %department))]
    pub async fn ensure_collection(&self, department: &Department) -> Result<(), RepositoryError> {
        if self.known_tables.contains_key(department) {
            return Ok(());
        }

        let sql = format!(
            r"
            CREATE TABLE IF NOT EXISTS {table} (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                department TEXT NOT NULL,
                image_path TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
            table = qualified_table(department),
        );

        match sqlx::query(&sql).execute(&self.pool).await {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref db_err))
                if db_err.is_unique_violation()
                    || db_err.code().as_deref() == Some(DUPLICATE_TABLE) =>
            {
                debug!("Department table created concurrently");
            }
            Err(e) => return Err(RepositoryError::Database(e)),
        }

        self.known_tables.insert(department.clone(), ()).await;
        Ok(())
    }

    /// List a department's records, newest first.
    ///
    /// A department that has never received an upload has no table and
    /// yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        department: &Department,
        limit: i64,
    ) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        let sql = format!(
            r"
            SELECT id, name, email, department, image_path, created_at
            FROM {table}
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
            table = qualified_table(department),
        );

        let rows: Vec<EmployeeRow> = match sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(sqlx::Error::Database(ref db_err))
                if db_err.code().as_deref() == Some(UNDEFINED_TABLE) =>
            {
                Vec::new()
            }
            Err(e) => return Err(RepositoryError::Database(e)),
        };

        Ok(rows.into_iter().map(record_from_row).collect())
    }

    /// Departments that currently have a record table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the catalog query fails.
    pub async fn departments(&self) -> Result<Vec<Department>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT tablename::text
            FROM pg_catalog.pg_tables
            WHERE schemaname = $1
            ORDER BY tablename
            ",
        )
        .bind(SCHEMA)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(table,)| Department::from_table_name(&table))
            .collect())
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    #[instrument(skip(self, record), fields(department = %record.department))]
    async fn insert(&self, record: NewEmployeeRecord) -> Result<EmployeeRecord, RepositoryError> {
        self.ensure_collection(&record.department).await?;

        let sql = format!(
            r"
            INSERT INTO {table} (name, email, department, image_path)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, department, image_path, created_at
            ",
            table = qualified_table(&record.department),
        );

        let row: EmployeeRow = sqlx::query_as(&sql)
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.department)
            .bind(&record.image_path)
            .fetch_one(&self.pool)
            .await?;

        let saved = record_from_row(row);
        debug!(id = %saved.id, "Inserted employee record");
        Ok(saved)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn record_from_row(row: EmployeeRow) -> EmployeeRecord {
    let (id, name, email, department, image_path, created_at) = row;
    EmployeeRecord {
        id,
        name,
        email,
        department,
        image_path,
        created_at,
    }
}

/// Schema-qualified, quoted table name for a department.
fn qualified_table(department: &Department) -> String {
    format!(
        "{}.{}",
        quote_identifier(SCHEMA),
        quote_identifier(&department.table_name())
    )
}

/// Quote a SQL identifier, doubling any embedded quotes.
fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_table_preserves_case_and_spaces() {
        let dept = Department::parse("Human Resources").unwrap();
        assert_eq!(
            qualified_table(&dept),
            "\"photobooth\".\"employees_Human Resources\""
        );
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_distinct_departments_get_distinct_tables() {
        let upper = Department::parse("Engineering").unwrap();
        let lower = Department::parse("engineering").unwrap();
        assert_ne!(qualified_table(&upper), qualified_table(&lower));
    }
}
