//! Application state and record store operations.
//!
//! Operations are split into submodules by concern:
//! - `email_log` - audit records for outgoing email
//! - `records` - batched lookups of related records

mod email_log;
mod records;

pub use email_log::{EmailLogEntry, EMAIL_LOGS_COLLECTION};
pub use records::FILTER_CHUNK_SIZE;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::document::{PdfConverter, TemplateRenderer};
use crate::email::{Mailer, SmtpMailer};
use crate::store::{PocketBaseStore, RecordStore};

/// Display address used as the `From` of every outgoing email.
#[derive(Debug, Clone)]
pub struct Sender {
    pub address: String,
    pub name: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore + Send + Sync>,
    pub mailer: Arc<dyn Mailer + Send + Sync>,
    pub templates: TemplateRenderer,
    pub pdf: PdfConverter,
    pub sender: Sender,
}

impl AppState {
    pub fn new_with_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("frame-orders-server/1.0")
            .build()?;

        let store = Arc::new(PocketBaseStore::new(config.store.clone(), http_client));
        let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);

        Ok(Self::new_with_parts(store, mailer, config))
    }

    /// Build state around an existing store and mailer (used by tests).
    pub fn new_with_parts(
        store: Arc<dyn RecordStore + Send + Sync>,
        mailer: Arc<dyn Mailer + Send + Sync>,
        config: &AppConfig,
    ) -> Self {
        AppState {
            store,
            mailer,
            templates: TemplateRenderer::new(&config.views_dir, &config.invoice_template),
            pdf: PdfConverter::new(&config.pdf_bin),
            sender: Sender {
                address: config.sender_address.clone(),
                name: config.sender_name.clone(),
            },
        }
    }
}
