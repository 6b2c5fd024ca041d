//! Photobooth Core - Shared domain types.
//!
//! This crate provides the types shared by the Virtual Photobooth components:
//! - `server` - HTTP backend (registration, upload, delivery)
//! - `cli` - Command-line tools for migrations and record inspection
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Every value that reaches the filesystem, a SQL identifier
//! or an outgoing email is validated here first.
//!
//! # Modules
//!
//! - [`types`] - Validated newtypes for emails, departments, registrations and record ids

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
