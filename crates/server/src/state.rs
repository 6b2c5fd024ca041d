//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::DepartmentPolicy;
use crate::db::EmployeeStore;
use crate::services::{ImageStorage, Mailer};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Record storage and mail
/// delivery are held as trait objects so tests can substitute them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    employees: Arc<dyn EmployeeStore>,
    mailer: Arc<dyn Mailer>,
    storage: ImageStorage,
    departments: DepartmentPolicy,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        mailer: Arc<dyn Mailer>,
        storage: ImageStorage,
        departments: DepartmentPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                employees,
                mailer,
                storage,
                departments,
            }),
        }
    }

    /// Get the employee record store.
    #[must_use]
    pub fn employees(&self) -> &dyn EmployeeStore {
        self.inner.employees.as_ref()
    }

    /// Get the photo mailer.
    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    /// Get the image storage.
    #[must_use]
    pub fn storage(&self) -> &ImageStorage {
        &self.inner.storage
    }

    /// Get the departments registration accepts.
    #[must_use]
    pub fn departments(&self) -> &DepartmentPolicy {
        &self.inner.departments
    }
}
