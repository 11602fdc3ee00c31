//! Customer emails: invoice delivery, recommendations and their audit log.

pub mod context;
pub mod handlers;
pub mod mailer;

pub use context::{build_email_log_context, is_allowed_email_type, EmailLogContext};
pub use handlers::config;
pub use mailer::{EmailAttachment, MailError, Mailer, OutgoingEmail, SmtpMailer};
