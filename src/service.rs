use chrono::Datelike;
use lettre::{Message, message::header::ContentType};

use std::sync::Arc;

use crate::{
    config::Config,
    dto::SendResult,
    template,
    transport::{DeliveryError, TransportConfigError, TransportFactory},
};

pub struct EmailService {
    sender: String,
    factory: Arc<dyn TransportFactory>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid email address format: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Failed to create email transporter: {0}")]
    TransportConfig(#[from] TransportConfigError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl EmailService {
    pub fn new(config: &Config, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            sender: config.sender().to_string(),
            factory,
        }
    }

    pub async fn send_verification_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<SendResult, MailError> {
        let year = chrono::Local::now().year();

        let message = Message::builder()
            .from(self.sender.parse()?)
            .to(email.parse()?)
            .subject(template::SUBJECT)
            .message_id(None)
            .header(ContentType::TEXT_HTML)
            .body(template::render_body(code, year))?;

        let transporter = self.factory.create_transporter().inspect_err(|e| {
            tracing::error!("Failed to create email transporter: {e}");
        })?;

        let message_id = transporter.send(message).await.inspect_err(|e| {
            tracing::error!("Error sending email: {e}");
        })?;

        tracing::info!("Email sent: {}", message_id);

        Ok(SendResult {
            success: true,
            message_id,
        })
    }
}
