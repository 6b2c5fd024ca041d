//! Employee records written once per successful upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use photobooth_core::{Department, Email, EmployeeId, Registration};

/// A persisted employee record.
///
/// Lives in the department's own table and is never updated or deleted.
/// `image_path` is the only link to the stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub name: String,
    pub email: Email,
    pub department: Department,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a record about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployeeRecord {
    pub name: String,
    pub email: Email,
    pub department: Department,
    pub image_path: String,
}

impl NewEmployeeRecord {
    /// Build a record candidate from a registration and the stored image path.
    #[must_use]
    pub fn from_registration(registration: &Registration, image_path: impl Into<String>) -> Self {
        Self {
            name: registration.name().to_owned(),
            email: registration.email().clone(),
            department: registration.department().clone(),
            image_path: image_path.into(),
        }
    }
}
