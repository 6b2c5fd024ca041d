//! `PostgreSQL` employee store tests.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `DATABASE_URL`. Each test works in a department named after the current
//! time and drops its table afterwards.
//!
//! Run with: cargo test -p photobooth-integration-tests -- --ignored

use chrono::Utc;
use secrecy::SecretString;
use sqlx::PgPool;

use photobooth_core::{Department, Email};
use photobooth_server::db::{self, EmployeeStore, PgEmployeeStore};
use photobooth_server::models::NewEmployeeRecord;

/// Connection string for the test database (configurable via environment).
fn database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/photobooth_test".to_string())
}

async fn migrated_pool() -> PgPool {
    let pool = db::create_pool(&SecretString::from(database_url()))
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A department no earlier run has used.
fn fresh_department(label: &str) -> Department {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    Department::parse(&format!("{label} {nanos}")).expect("valid department")
}

fn new_record(name: &str, department: &Department) -> NewEmployeeRecord {
    NewEmployeeRecord {
        name: name.to_string(),
        email: Email::parse("ada@example.com").expect("valid email"),
        department: department.clone(),
        image_path: format!("uploads/{department}/1700000000000.png"),
    }
}

async fn drop_department(pool: &PgPool, department: &Department) {
    let sql = format!(
        "DROP TABLE IF EXISTS \"{}\".\"{}\"",
        db::SCHEMA,
        department.table_name()
    );
    sqlx::query(&sql)
        .execute(pool)
        .await
        .expect("Failed to drop department table");
}

// ============================================================================
// Insert
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_insert_creates_table_for_new_department() {
    let pool = migrated_pool().await;
    let store = PgEmployeeStore::new(pool.clone());
    let department = fresh_department("Booth Insert");

    let saved = store
        .insert(new_record("Ada Lovelace", &department))
        .await
        .expect("Failed to insert record");

    assert_eq!(saved.name, "Ada Lovelace");
    assert_eq!(saved.email.as_str(), "ada@example.com");
    assert_eq!(saved.department, department);
    assert!(saved.image_path.starts_with("uploads/Booth Insert "));

    let listed = store.list(&department, 10).await.expect("Failed to list");
    assert_eq!(listed, vec![saved]);

    let departments = store.departments().await.expect("Failed to list departments");
    assert!(departments.contains(&department));

    drop_department(&pool, &department).await;
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_concurrent_first_inserts_share_one_table() {
    let pool = migrated_pool().await;
    // Separate stores so neither skips table creation from a warm cache.
    let first = PgEmployeeStore::new(pool.clone());
    let second = PgEmployeeStore::new(pool.clone());
    let department = fresh_department("Booth Race");

    let (a, b) = tokio::join!(
        first.insert(new_record("Ada", &department)),
        second.insert(new_record("Grace", &department)),
    );
    let a = a.expect("first insert failed");
    let b = b.expect("second insert failed");
    assert_ne!(a.id, b.id);

    let listed = first.list(&department, 10).await.expect("Failed to list");
    assert_eq!(listed.len(), 2);

    drop_department(&pool, &department).await;
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_departments_differing_in_case_are_separate() {
    let pool = migrated_pool().await;
    let store = PgEmployeeStore::new(pool.clone());
    let upper = fresh_department("Booth Case");
    let lower = Department::parse(&upper.as_str().to_lowercase()).expect("valid department");

    store
        .insert(new_record("Ada", &upper))
        .await
        .expect("Failed to insert record");

    assert_eq!(store.list(&upper, 10).await.expect("list").len(), 1);
    assert!(store.list(&lower, 10).await.expect("list").is_empty());

    drop_department(&pool, &upper).await;
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_list_of_unused_department_is_empty() {
    let pool = migrated_pool().await;
    let store = PgEmployeeStore::new(pool);

    let records = store
        .list(&fresh_department("Booth Unused"), 10)
        .await
        .expect("Missing table should not be an error");

    assert!(records.is_empty());
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_ping() {
    let store = PgEmployeeStore::new(migrated_pool().await);
    store.ping().await.expect("Database should be reachable");
}
