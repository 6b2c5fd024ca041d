//! Photo delivery by email.
//!
//! Uses SMTP via lettre with an Askama plain-text template. Every message
//! carries the captured photo as a single PNG attachment.

use std::path::{Path, PathBuf};

use askama::Template;
use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{
        Attachment, MultiPart, SinglePart,
        header::{ContentType, ContentTypeErr},
    },
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use photobooth_core::Registration;

use crate::config::EmailConfig;

/// Subject line of every photo delivery.
pub const PHOTO_SUBJECT: &str = "Your Captured Image";

/// File name the photo is attached under, whatever its stored name.
pub const ATTACHMENT_NAME: &str = "captured_image.png";

/// Plain text template for the photo delivery email.
#[derive(Template)]
#[template(path = "email/photo_delivery.txt")]
struct PhotoDeliveryText<'a> {
    name: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Invalid attachment content type.
    #[error("Invalid content type: {0}")]
    ContentType(#[from] ContentTypeErr),

    /// The stored image could not be read back for attaching.
    #[error("Failed to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered photo delivery, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Stored image to attach.
    pub image_path: PathBuf,
}

impl PhotoEmail {
    /// Render the delivery email for a registration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Template` if the body fails to render.
    pub fn for_registration(
        registration: &Registration,
        image_path: impl Into<PathBuf>,
    ) -> Result<Self, EmailError> {
        let body = PhotoDeliveryText {
            name: registration.name(),
        }
        .render()?;

        Ok(Self {
            to: registration.email().as_str().to_owned(),
            subject: PHOTO_SUBJECT.to_owned(),
            body,
            image_path: image_path.into(),
        })
    }
}

/// Outbound delivery of photo emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one email with the photo attached. Not retried.
    async fn send_photo(&self, email: &PhotoEmail) -> Result<(), EmailError>;
}

/// SMTP [`Mailer`] using a STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_photo(&self, email: &PhotoEmail) -> Result<(), EmailError> {
        let image = read_attachment(&email.image_path).await?;
        let message = compose_message(&self.from_address, email, image)?;

        self.transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

async fn read_attachment(path: &Path) -> Result<Vec<u8>, EmailError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| EmailError::Attachment {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse `address` with the same grammar the SMTP transport applies.
///
/// # Errors
///
/// Returns `EmailError::InvalidAddress` if lettre rejects the address.
pub fn recipient_address(address: &str) -> Result<Address, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

/// Build a `multipart/mixed` message: the text body plus the photo.
///
/// # Errors
///
/// Returns error if an address is malformed or the message cannot be built.
pub fn compose_message(
    from: &str,
    email: &PhotoEmail,
    image: Vec<u8>,
) -> Result<Message, EmailError> {
    let attachment = Attachment::new(ATTACHMENT_NAME.to_owned())
        .body(image, ContentType::parse("image/png")?);

    let message = Message::builder()
        .from(
            from.parse()
                .map_err(|_| EmailError::InvalidAddress(from.to_string()))?,
        )
        .to(recipient_address(&email.to)?.into())
        .subject(&email.subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(email.body.clone()))
                .singlepart(attachment),
        )?;

    Ok(message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration::new("Ada Lovelace", "ada@example.com", "Engineering").unwrap()
    }

    #[test]
    fn test_body_greets_registrant() {
        let email = PhotoEmail::for_registration(&registration(), "uploads/x.png").unwrap();

        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, "Your Captured Image");
        assert!(email.body.starts_with("Hi Ada Lovelace,\n\n"));
        assert!(
            email
                .body
                .contains("Thank you for using the Virtual Photobooth! Attached is your photo.")
        );
        assert!(email.body.contains("Best regards,\nVirtual Photobooth"));
    }

    #[test]
    fn test_message_attaches_png_under_fixed_name() {
        let email = PhotoEmail::for_registration(&registration(), "uploads/x.jpg").unwrap();
        let message = compose_message("booth@example.com", &email, b"jpeg".to_vec()).unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("Subject: Your Captured Image"));
        assert!(raw.contains("filename=\"captured_image.png\""));
        assert!(raw.contains("image/png"));
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let email = PhotoEmail::for_registration(&registration(), "uploads/x.png").unwrap();
        let err = compose_message("not an address", &email, Vec::new()).unwrap_err();
        assert!(matches!(err, EmailError::InvalidAddress(_)));
    }

    #[test]
    fn test_recipient_address_follows_transport_grammar() {
        assert!(recipient_address("ada@example.com").is_ok());
        for address in ["a,b@c", "a<b>@c", "ada@exa mple.com"] {
            assert!(matches!(
                recipient_address(address),
                Err(EmailError::InvalidAddress(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_missing_attachment_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_attachment(&dir.path().join("gone.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::Attachment { .. }));
    }
}
