//! JSON API routes.
//!
//! Registration stores the visitor's details in the session; upload reads
//! them back from there and never from the request body.

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use photobooth_core::{Registration, RegistrationForm};

use crate::error::{AppError, Result};
use crate::middleware::RequireRegistration;
use crate::models::{EmployeeRecord, session_keys};
use crate::services::{ImageUpload, UploadService, recipient_address};
use crate::state::AppState;

/// Multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

/// Response carrying only a status message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Response from a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub data: EmployeeRecord,
}

/// Register the visitor for this session.
///
/// POST /api/register
///
/// Replaces any earlier registration in the same session. On any validation
/// failure the session is left untouched.
///
/// # Errors
///
/// Returns `AppError::Validation` for missing or invalid fields and
/// `AppError::SessionPersistence` if the session cannot be saved.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    form: std::result::Result<Json<RegistrationForm>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(form) = form.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected registration body");
        AppError::Validation(rejection.body_text())
    })?;

    let registration =
        Registration::try_from(form).map_err(|e| AppError::Validation(e.to_string()))?;

    // The photo can only be delivered to an address the transport accepts.
    recipient_address(registration.email().as_str())
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if !state.departments().permits(registration.department()) {
        return Err(AppError::Validation(format!(
            "Unknown department: {}",
            registration.department()
        )));
    }

    session
        .insert(session_keys::REGISTRATION, &registration)
        .await
        .map_err(AppError::SessionPersistence)?;
    session.save().await.map_err(AppError::SessionPersistence)?;

    tracing::info!(department = %registration.department(), "Visitor registered");

    Ok(Json(MessageResponse {
        message: "Registration successful",
    }))
}

/// Upload a photo for the registered visitor.
///
/// POST /api/upload
///
/// Expects `multipart/form-data` with a file part named `image`. Any other
/// field, including a `department`, is ignored.
///
/// # Errors
///
/// Returns `AppError::Precondition` without a registration,
/// `AppError::Validation` for a missing image or malformed body, and
/// `AppError::Upload` when storing, recording or emailing fails.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    RequireRegistration(registration): RequireRegistration,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected upload body");
        AppError::Validation(format!("Invalid multipart body: {}", rejection.body_text()))
    })?;

    let image = read_image(multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No image file uploaded".to_string()))?;

    let service = UploadService::new(state.storage(), state.employees(), state.mailer());
    let record = service.process(&registration, image).await?;

    Ok(Json(UploadResponse {
        message: "Image uploaded and data saved successfully!",
        data: record,
    }))
}

/// Read the first file part named `image`, skipping everything else.
async fn read_image(mut multipart: Multipart) -> Result<Option<ImageUpload>> {
    let invalid = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        // A plain text field named `image` is not a file.
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let data = field.bytes().await.map_err(invalid)?;
        return Ok(Some(ImageUpload {
            file_name: Some(file_name),
            data,
        }));
    }

    Ok(None)
}
