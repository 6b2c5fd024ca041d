//! Upload orchestration: store the file, record it, email it.
//!
//! Stages run in a fixed order and each one's side effects are kept when a
//! later stage fails. A failed record write leaves the file on disk; a failed
//! email leaves both the file and the record.

use core::fmt;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, instrument, warn};

use photobooth_core::Registration;

use super::email::{EmailError, Mailer, PhotoEmail};
use super::storage::{ImageStorage, StorageError};
use crate::db::{EmployeeStore, RepositoryError};
use crate::models::{EmployeeRecord, NewEmployeeRecord};

/// Errors from a stage of the upload pipeline.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Writing the image failed; nothing was persisted.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Writing the record failed; the image is already on disk.
    #[error("{0}")]
    Persistence(#[from] RepositoryError),

    /// Sending the email failed; the image and record are kept.
    #[error("{0}")]
    Delivery(#[from] EmailError),
}

impl UploadError {
    /// The stage that failed.
    #[must_use]
    pub const fn stage(&self) -> UploadStage {
        match self {
            Self::Storage(_) => UploadStage::FileWrite,
            Self::Persistence(_) => UploadStage::RecordWrite,
            Self::Delivery(_) => UploadStage::EmailSend,
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    FileWrite,
    RecordWrite,
    EmailSend,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FileWrite => "file_write",
            Self::RecordWrite => "record_write",
            Self::EmailSend => "email_send",
        })
    }
}

/// The image part of an upload request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name as sent by the client, used only for its extension.
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// Runs the upload pipeline for one registered visitor.
pub struct UploadService<'a> {
    storage: &'a ImageStorage,
    employees: &'a dyn EmployeeStore,
    mailer: &'a dyn Mailer,
}

impl<'a> UploadService<'a> {
    /// Create an upload service over the given collaborators.
    #[must_use]
    pub fn new(
        storage: &'a ImageStorage,
        employees: &'a dyn EmployeeStore,
        mailer: &'a dyn Mailer,
    ) -> Self {
        Self {
            storage,
            employees,
            mailer,
        }
    }

    /// Store, record and deliver one image.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure as an `UploadError`. Earlier stages
    /// are not undone.
    #[instrument(
        skip(self, registration, upload),
        fields(department = %registration.department(), bytes = upload.data.len())
    )]
    pub async fn process(
        &self,
        registration: &Registration,
        upload: ImageUpload,
    ) -> Result<EmployeeRecord, UploadError> {
        let result = self.run(registration, upload).await;
        if let Err(e) = &result {
            warn!(stage = %e.stage(), error = %e, "Upload stage failed");
        }
        result
    }

    async fn run(
        &self,
        registration: &Registration,
        upload: ImageUpload,
    ) -> Result<EmployeeRecord, UploadError> {
        let stored = self
            .storage
            .store(
                registration.department(),
                upload.file_name.as_deref(),
                upload.data,
            )
            .await?;
        info!(stage = %UploadStage::FileWrite, path = %stored.public_path, "Image stored");

        let record = self
            .employees
            .insert(NewEmployeeRecord::from_registration(
                registration,
                stored.public_path.clone(),
            ))
            .await?;
        info!(stage = %UploadStage::RecordWrite, id = %record.id, "Record saved");

        let email = PhotoEmail::for_registration(registration, stored.file_path)?;
        self.mailer.send_photo(&email).await?;
        info!(stage = %UploadStage::EmailSend, to = %email.to, "Photo delivered");

        Ok(record)
    }
}
