//! Registration details held in the visitor's session.

use serde::{Deserialize, Serialize};

use super::department::{Department, DepartmentError};
use super::email::{Email, EmailError};

/// Errors that can occur when validating a [`RegistrationForm`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// At least one of `name`, `email` or `department` is absent or blank.
    #[error("All fields are required")]
    MissingFields,
    /// The name exceeds the maximum length.
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The email address is malformed.
    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),
    /// The department name is malformed.
    #[error("Invalid department: {0}")]
    InvalidDepartment(#[from] DepartmentError),
}

/// Raw registration input as submitted by the client.
///
/// Every field is optional so that a missing field is reported as
/// [`RegistrationError::MissingFields`] rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// A complete, validated registration.
///
/// This is the only value the upload path trusts: holding a `Registration`
/// means all three fields were present and valid when it was created, and
/// deserializing one (e.g. from a session store) re-runs the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistrationForm")]
pub struct Registration {
    name: String,
    email: Email,
    department: Department,
}

impl Registration {
    /// Maximum length of a registrant name.
    pub const MAX_NAME_LENGTH: usize = 200;

    /// Validate the three registration fields.
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::MissingFields`] if any field is absent or
    /// blank, otherwise the first field-specific validation error.
    pub fn new(name: &str, email: &str, department: &str) -> Result<Self, RegistrationError> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() || department.trim().is_empty() {
            return Err(RegistrationError::MissingFields);
        }

        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(RegistrationError::NameTooLong {
                max: Self::MAX_NAME_LENGTH,
            });
        }

        Ok(Self {
            name: name.to_owned(),
            email: Email::parse(email)?,
            department: Department::parse(department)?,
        })
    }

    /// The registrant's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The address the photo is delivered to.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// The department that routes storage and records.
    #[must_use]
    pub const fn department(&self) -> &Department {
        &self.department
    }
}

impl TryFrom<RegistrationForm> for Registration {
    type Error = RegistrationError;

    fn try_from(form: RegistrationForm) -> Result<Self, Self::Error> {
        match (form.name, form.email, form.department) {
            (Some(name), Some(email), Some(department)) => Self::new(&name, &email, &department),
            _ => Err(RegistrationError::MissingFields),
        }
    }
}
