use chrono::{SecondsFormat, Utc};
use log::{debug, error, info};
use serde_json::{json, Map, Value};

use super::AppState;
use crate::email::EmailLogContext;
use crate::store::Record;

pub const EMAIL_LOGS_COLLECTION: &str = "email_logs";

/// Handle on a created email log. Empty when the create failed, in which case
/// updates are no-ops.
#[derive(Debug, Default)]
pub struct EmailLogEntry {
    record: Option<Record>,
}

impl EmailLogEntry {
    pub fn id(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.id.as_str())
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl AppState {
    /// Record an `attempted` email. Store failures are logged and swallowed.
    pub async fn create_email_log(
        &self,
        to_email: &str,
        to_name: &str,
        subject: &str,
        ctx: &EmailLogContext,
        sent_by: &str,
        meta: Map<String, Value>,
    ) -> EmailLogEntry {
        let mut fields = Map::new();
        fields.insert("channel".into(), json!("email"));
        fields.insert("status".into(), json!("attempted"));
        fields.insert(
            "sentAt".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        fields.insert("error".into(), json!(""));
        fields.insert("toEmail".into(), json!(to_email.trim()));
        fields.insert("toName".into(), json!(to_name.trim()));
        fields.insert("subject".into(), json!(subject.trim()));
        fields.insert("templateKey".into(), json!(ctx.template_key.trim()));
        fields.insert(
            "emailType".into(),
            json!(or_default(&ctx.email_type, "generic")),
        );
        fields.insert(
            "eventType".into(),
            json!(or_default(&ctx.event_type, "manual")),
        );
        fields.insert("eventNote".into(), json!(ctx.event_note.trim()));

        let relations = [
            ("orderId", &ctx.order_id),
            ("customerId", &ctx.customer_id),
            ("frameItemId", &ctx.frame_item_id),
            ("paperweightItemId", &ctx.paperweight_item_id),
        ];
        for (key, value) in relations {
            if !value.trim().is_empty() {
                fields.insert(key.into(), json!(value.trim()));
            }
        }
        if !sent_by.trim().is_empty() {
            fields.insert("sentBy".into(), json!(sent_by.trim()));
        }
        fields.insert("meta".into(), Value::Object(meta));

        debug!("Creating email log for {}", to_email);
        match self.store.create_record(EMAIL_LOGS_COLLECTION, fields).await {
            Ok(record) => {
                info!("Email log {} created (attempted)", record.id);
                EmailLogEntry {
                    record: Some(record),
                }
            }
            Err(e) => {
                error!("email log create failed: {}", e);
                EmailLogEntry::default()
            }
        }
    }

    /// Move the log to `status`, set or clear `error`, and shallow-merge `meta_patch`
    /// over the stored meta. Store failures are logged and swallowed.
    pub async fn update_email_log(
        &self,
        entry: &mut EmailLogEntry,
        status: &str,
        error_message: &str,
        meta_patch: Map<String, Value>,
    ) {
        let Some(record) = entry.record.as_mut() else {
            return;
        };

        let mut meta = record.get_object("meta");
        for (key, value) in meta_patch {
            meta.insert(key, value);
        }

        let mut fields = Map::new();
        if !status.trim().is_empty() {
            fields.insert("status".into(), json!(status));
        }
        fields.insert("error".into(), json!(error_message.trim()));
        fields.insert("meta".into(), Value::Object(meta));

        for (key, value) in &fields {
            record.set(key, value.clone());
        }

        let id = record.id.clone();
        match self
            .store
            .update_record(EMAIL_LOGS_COLLECTION, &id, fields)
            .await
        {
            Ok(updated) => {
                info!("Email log {} updated ({})", id, status);
                *record = updated;
            }
            Err(e) => error!("email log {} update failed: {}", id, e),
        }
    }
}
