//! End-to-end test harness for the Virtual Photobooth API.
//!
//! Drives the real router in-process with `axum-test`. Sessions use the
//! tower-sessions `MemoryStore`, images go to a temporary directory, and the
//! database and SMTP relay are replaced by in-memory fakes that can be told
//! to fail.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p photobooth-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower_sessions::MemoryStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};

use photobooth_core::{Department, EmployeeId};
use photobooth_server::config::{DepartmentPolicy, HttpConfig, SessionConfig};
use photobooth_server::db::{EmployeeStore, RepositoryError};
use photobooth_server::models::{EmployeeRecord, NewEmployeeRecord};
use photobooth_server::services::{EmailError, ImageStorage, Mailer, PhotoEmail};
use photobooth_server::state::AppState;

/// Session secret used by every test server.
pub const TEST_SESSION_SECRET: &str = "k3P9xQ2mV7nR4tY8wZ1bC6dF0gH5jL2s";

/// A small PNG header, enough to stand in for an image.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

// ============================================================================
// Fakes
// ============================================================================

/// In-memory [`EmployeeStore`] that records every insert.
#[derive(Default)]
pub struct MemoryEmployeeStore {
    records: Mutex<Vec<EmployeeRecord>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl MemoryEmployeeStore {
    /// Make every following insert fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All records written so far, in insert order.
    #[must_use]
    pub fn records(&self) -> Vec<EmployeeRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records of one department.
    #[must_use]
    pub fn records_in(&self, department: &str) -> Vec<EmployeeRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.department.as_str() == department)
            .collect()
    }

    /// Departments that have at least one record, as the collections a
    /// database would have created.
    #[must_use]
    pub fn collections(&self) -> Vec<Department> {
        let mut departments: Vec<_> = self.records().into_iter().map(|r| r.department).collect();
        departments.sort();
        departments.dedup();
        departments
    }
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn insert(&self, record: NewEmployeeRecord) -> Result<EmployeeRecord, RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx_pool_closed()));
        }

        let saved = EmployeeRecord {
            id: EmployeeId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            name: record.name,
            email: record.email,
            department: record.department,
            image_path: record.image_path,
            created_at: Utc::now(),
        };

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(saved.clone());
        Ok(saved)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx_pool_closed()));
        }
        Ok(())
    }
}

fn sqlx_pool_closed() -> sqlx::Error {
    sqlx::Error::PoolClosed
}

/// [`SessionStore`] whose backend is always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn save(&self, _record: &Record) -> session_store::Result<()> {
        Err(session_store::Error::Backend("session backend unavailable".into()))
    }

    async fn load(&self, _session_id: &Id) -> session_store::Result<Option<Record>> {
        Err(session_store::Error::Backend("session backend unavailable".into()))
    }

    async fn delete(&self, _session_id: &Id) -> session_store::Result<()> {
        Err(session_store::Error::Backend("session backend unavailable".into()))
    }
}

/// A delivered email together with the attachment bytes read at send time.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub email: PhotoEmail,
    pub attachment: Vec<u8>,
}

/// [`Mailer`] that keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    /// Make every following send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_photo(&self, email: &PhotoEmail) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::InvalidAddress(email.to.clone()));
        }

        let attachment = tokio::fs::read(&email.image_path)
            .await
            .map_err(|source| EmailError::Attachment {
                path: email.image_path.clone(),
                source,
            })?;

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentEmail {
                email: email.clone(),
                attachment,
            });
        Ok(())
    }
}

// ============================================================================
// Test context
// ============================================================================

/// A running in-process server plus handles on everything it writes to.
pub struct TestContext {
    pub server: TestServer,
    pub employees: Arc<MemoryEmployeeStore>,
    pub mailer: Arc<RecordingMailer>,
    pub uploads_root: PathBuf,
    _temp_dir: TempDir,
}

/// Builder for [`TestContext`].
#[derive(Default)]
pub struct TestContextBuilder {
    departments: DepartmentPolicy,
    uploads_root: Option<PathBuf>,
    allowed_origin: Option<&'static str>,
    max_upload_bytes: Option<usize>,
    sessions: Sessions,
}

/// Session backend a test server runs with.
#[derive(Default)]
enum Sessions {
    #[default]
    Fresh,
    Shared(MemoryStore),
    Failing,
}

impl TestContextBuilder {
    /// Only accept these departments at registration.
    #[must_use]
    pub fn allow_departments(mut self, list: &str) -> Self {
        self.departments = DepartmentPolicy::parse_list(list).expect("valid department list");
        self
    }

    /// Store images under `root` instead of a fresh temporary directory.
    #[must_use]
    pub fn uploads_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.uploads_root = Some(root.into());
        self
    }

    /// Enable CORS for `origin`.
    #[must_use]
    pub const fn allowed_origin(mut self, origin: &'static str) -> Self {
        self.allowed_origin = Some(origin);
        self
    }

    /// Limit request bodies to `bytes`.
    #[must_use]
    pub const fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = Some(bytes);
        self
    }

    /// Keep sessions in `store`, so that several servers can share them.
    #[must_use]
    pub fn session_store(mut self, store: MemoryStore) -> Self {
        self.sessions = Sessions::Shared(store);
        self
    }

    /// Run with a session store that fails every operation.
    #[must_use]
    pub fn failing_sessions(mut self) -> Self {
        self.sessions = Sessions::Failing;
        self
    }

    /// Build the router and start the test server.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or test server cannot be created.
    #[must_use]
    pub fn build(self) -> TestContext {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let uploads_root = self
            .uploads_root
            .unwrap_or_else(|| temp_dir.path().join("uploads"));

        let employees = Arc::new(MemoryEmployeeStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(
            employees.clone(),
            mailer.clone(),
            ImageStorage::new(uploads_root.clone()),
            self.departments,
        );

        let http = HttpConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            allowed_origin: self
                .allowed_origin
                .map(|origin| origin.parse().expect("valid origin")),
            max_upload_bytes: self.max_upload_bytes.unwrap_or(10 * 1024 * 1024),
            session: SessionConfig {
                secret: SecretString::from(TEST_SESSION_SECRET.to_string()),
                secure: false,
            },
        };

        let app = match self.sessions {
            Sessions::Fresh => {
                photobooth_server::build_router(state, MemoryStore::default(), &http)
            }
            Sessions::Shared(store) => photobooth_server::build_router(state, store, &http),
            Sessions::Failing => photobooth_server::build_router(state, FailingSessionStore, &http),
        };
        let server = TestServer::builder()
            .save_cookies()
            .build(app)
            .expect("Failed to create test server");

        TestContext {
            server,
            employees,
            mailer,
            uploads_root,
            _temp_dir: temp_dir,
        }
    }
}

impl TestContext {
    /// Start a server with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Configure a server before starting it.
    #[must_use]
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder::default()
    }

    /// Register the visitor for this context's cookie session.
    pub async fn register(&self, name: &str, email: &str, department: &str) -> Value {
        let response = self
            .server
            .post("/api/register")
            .json(&json!({ "name": name, "email": email, "department": department }))
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Upload `bytes` as the `image` field with the given file name.
    pub async fn upload(&self, file_name: &str, bytes: &[u8]) -> axum_test::TestResponse {
        self.server
            .post("/api/upload")
            .multipart(image_form(file_name, bytes))
            .await
    }

    /// Every file currently stored for `department`.
    #[must_use]
    pub fn stored_files(&self, department: &str) -> Vec<PathBuf> {
        list_files(&self.uploads_root.join(department))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Multipart form with a single `image` file part.
#[must_use]
pub fn image_form(file_name: &str, bytes: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part("image", image_part(file_name, bytes))
}

/// A PNG file part.
#[must_use]
pub fn image_part(file_name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes::Bytes::copy_from_slice(bytes))
        .file_name(file_name.to_string())
        .mime_type("image/png")
}

/// Files directly inside `dir`, sorted; empty when `dir` does not exist.
#[must_use]
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}
