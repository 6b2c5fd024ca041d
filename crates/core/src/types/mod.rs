//! Core types for the photobooth.
//!
//! This module provides type-safe wrappers for the registration data that
//! flows from the session into storage, the database and email.

pub mod department;
pub mod email;
pub mod id;
pub mod registration;

pub use department::{Department, DepartmentError};
pub use email::{Email, EmailError};
pub use id::EmployeeId;
pub use registration::{Registration, RegistrationError, RegistrationForm};
