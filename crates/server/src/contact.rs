//! Contact form: `POST /api/contact` relays a visitor message to the shop
//! owner's inbox over SMTP. When SMTP is not configured the noop transport
//! logs the submission instead, so local development needs no credentials.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use bloomery_core::config::SmtpConfig;

use crate::bootstrap::ApiState;
use crate::error::ApiError;

#[derive(Clone, Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not assemble message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp transport failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("smtp owner address is not configured")]
    MissingOwner,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send_contact(&self, submission: &ContactRequest) -> Result<(), MailerError>;

    fn is_noop(&self) -> bool {
        false
    }
}

/// Stands in when `smtp.enabled` is false. Submissions are accepted and
/// logged, never delivered.
#[derive(Default)]
pub struct NoopMailer;

#[async_trait::async_trait]
impl Mailer for NoopMailer {
    async fn send_contact(&self, submission: &ContactRequest) -> Result<(), MailerError> {
        info!(
            event_name = "contact.noop_delivery",
            sender_name = %submission.name,
            sender_email = %submission.email,
            "smtp disabled, contact submission logged only"
        );
        Ok(())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    owner: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailerError> {
        let owner: Mailbox =
            config.owner_address.as_deref().ok_or(MailerError::MissingOwner)?.parse()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self { transport: builder.build(), owner })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send_contact(&self, submission: &ContactRequest) -> Result<(), MailerError> {
        let mut message = Message::builder()
            .from(self.owner.clone())
            .to(self.owner.clone())
            .subject(format!("New Contact Form Submission from {}", submission.name));

        // Replies should go to the visitor when their address parses.
        if let Ok(reply_to) = submission.email.parse::<Mailbox>() {
            message = message.reply_to(reply_to);
        }

        let email = message.body(format!(
            "Name: {}\nEmail: {}\n\n{}",
            submission.name, submission.email, submission.message
        ))?;

        self.transport.send(email).await?;
        Ok(())
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new().route("/api/contact", post(submit_contact)).with_state(state)
}

pub async fn submit_contact(
    State(state): State<ApiState>,
    Json(body): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    for (field, value) in
        [("name", &body.name), ("email", &body.email), ("message", &body.message)]
    {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("contact {field} is required")));
        }
    }

    state.mailer.send_contact(&body).await.map_err(|mail_error| {
        error!(
            event_name = "contact.delivery_failed",
            error = %mail_error,
            "contact submission could not be delivered"
        );
        ApiError::Mail
    })?;

    info!(
        event_name = "contact.delivered",
        sender_email = %body.email,
        "contact submission forwarded to the shop owner"
    );

    Ok(Json(ContactResponse { message: "Email sent successfully!".to_string() }))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;

    use super::{submit_contact, ContactRequest, Mailer, MailerError, NoopMailer};
    use crate::bootstrap::test_support::state_with_mailer;

    struct FailingMailer;

    #[async_trait::async_trait]
    impl Mailer for FailingMailer {
        async fn send_contact(&self, _submission: &ContactRequest) -> Result<(), MailerError> {
            Err(MailerError::MissingOwner)
        }
    }

    fn submission() -> ContactRequest {
        ContactRequest {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            message: "Do you deliver on Sundays?".to_string(),
        }
    }

    #[tokio::test]
    async fn noop_mailer_accepts_submissions() {
        let state = state_with_mailer(std::sync::Arc::new(NoopMailer));
        let response = submit_contact(State(state), Json(submission())).await.expect("accepted");
        assert_eq!(response.0.message, "Email sent successfully!");
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let state = state_with_mailer(std::sync::Arc::new(NoopMailer));
        let mut body = submission();
        body.message = "   ".to_string();

        let result = submit_contact(State(state), Json(body)).await;
        let error = result.expect_err("blank message must fail");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transport_failure_maps_to_mail_error() {
        let state = state_with_mailer(std::sync::Arc::new(FailingMailer));
        let result = submit_contact(State(state), Json(submission())).await;
        let error = result.expect_err("delivery failure must surface");
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "Error sending email.");
    }
}
