//! Business logic services.

pub mod email;
pub mod storage;
pub mod upload;

pub use email::{EmailError, Mailer, PhotoEmail, SmtpMailer, recipient_address};
pub use storage::{ImageStorage, StorageError, StoredImage};
pub use upload::{ImageUpload, UploadError, UploadService, UploadStage};
