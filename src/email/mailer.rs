//! Outbound mail.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {address:?}: {message}")]
    Address { address: String, message: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("smtp delivery failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl EmailAttachment {
    pub fn pdf(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf".to_string(),
            data,
        }
    }
}

/// A single-recipient message with HTML and plain-text alternatives.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from_address: String,
    pub from_name: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait Mailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        log::info!(
            "SMTP transport configured for {}:{} (tls: {})",
            config.host,
            config.port,
            config.tls
        );
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, MailError> {
    let parsed = address.trim().parse().map_err(|e: lettre::address::AddressError| {
        MailError::Address {
            address: address.to_string(),
            message: e.to_string(),
        }
    })?;
    let name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
    Ok(Mailbox::new(name, parsed))
}

/// Assemble the MIME message: alternative text/html body, attachments alongside.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    let body = MultiPart::alternative_plain_html(email.text.clone(), email.html.clone());

    let body = if email.attachments.is_empty() {
        body
    } else {
        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| MailError::Build(e.to_string()))?;
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.data.clone(), content_type),
            );
        }
        mixed
    };

    Message::builder()
        .from(mailbox(Some(&email.from_name), &email.from_address)?)
        .to(mailbox(None, &email.to)?)
        .subject(email.subject.clone())
        .multipart(body)
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(&email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        log::info!("Email {:?} delivered to {}", email.subject, email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from_address: "orders@example.com".to_string(),
            from_name: "Orders".to_string(),
            to: "jane@example.com".to_string(),
            subject: "Invoice #17".to_string(),
            html: "<p>Hi Jane,</p>".to_string(),
            text: "Hi Jane,".to_string(),
            attachments: vec![EmailAttachment::pdf("invoice.pdf", b"%PDF-1.4".to_vec())],
        }
    }

    #[test]
    fn test_build_message_with_attachment() {
        let message = build_message(&email()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Invoice #17"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("invoice.pdf"));
    }

    #[test]
    fn test_build_message_without_attachment_is_alternative_only() {
        let mut plain = email();
        plain.attachments.clear();
        let raw = String::from_utf8(build_message(&plain).unwrap().formatted()).unwrap();

        assert!(!raw.contains("multipart/mixed"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let mut bad = email();
        bad.to = "not an address".to_string();
        assert!(matches!(
            build_message(&bad),
            Err(MailError::Address { .. })
        ));
    }
}
