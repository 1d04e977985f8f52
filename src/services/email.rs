//! Email channel over SMTP

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use super::channels::{ChannelSender, Recipient};
use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::notification::{Channel, ChannelOutcome, Notification},
};

#[derive(Clone)]
pub struct EmailSender {
    config: EmailConfig,
    /// None when email delivery is disabled
    mailer: Option<SmtpTransport>,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let mailer = if config.enabled {
            Some(build_transport(&config)?)
        } else {
            None
        };
        Ok(Self { config, mailer })
    }

    fn build_message(&self, to: &str, notification: &Notification) -> AppResult<Message> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Classifieds");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Validation(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&notification.title)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(notification.message.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                "<html><body><h3>{}</h3><p>{}</p></body></html>",
                                escape_html(&notification.title),
                                escape_html(&notification.message).replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }
}

fn build_transport(config: &EmailConfig) -> AppResult<SmtpTransport> {
    let builder = if config.smtp_use_tls {
        SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
    } else {
        SmtpTransport::builder_dangerous(&config.smtp_host)
    }
    .port(config.smtp_port);

    let builder = match (&config.smtp_username, &config.smtp_password) {
        (Some(username), Some(password)) => {
            builder.credentials(Credentials::new(username.clone(), password.clone()))
        }
        _ => builder,
    };

    Ok(builder.build())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, recipient: &Recipient, notification: &Notification) -> ChannelOutcome {
        let Some(mailer) = self.mailer.clone() else {
            return ChannelOutcome::skipped("email delivery is disabled");
        };
        let Some(to) = recipient.email.as_deref() else {
            return ChannelOutcome::skipped("recipient has no email address");
        };

        let message = match self.build_message(to, notification) {
            Ok(message) => message,
            Err(e) => return ChannelOutcome::failed(e.to_string()),
        };

        // SmtpTransport is blocking
        match tokio::task::spawn_blocking(move || mailer.send(&message)).await {
            Ok(Ok(_)) => ChannelOutcome::Delivered,
            Ok(Err(e)) => ChannelOutcome::failed(format!("SMTP error: {}", e)),
            Err(e) => ChannelOutcome::failed(format!("email task failed: {}", e)),
        }
    }
}
