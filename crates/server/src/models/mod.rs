//! Domain models for the photobooth backend.

pub mod employee;
pub mod session;

pub use employee::{EmployeeRecord, NewEmployeeRecord};
pub use session::keys as session_keys;
