//! Email log context: who an email went to, why, and what it relates to.

use serde_json::{json, Map, Value};

use crate::invoice::models::InvoicePayload;

pub const ALLOWED_EMAIL_TYPES: &[&str] = &[
    "invoice",
    "recommendation_bouquet",
    "recommendation_paperweight",
    "status_update",
    "comment",
    "generic",
];

pub fn is_allowed_email_type(value: &str) -> bool {
    ALLOWED_EMAIL_TYPES.contains(&value)
}

/// Per-route fallbacks for fields the client did not supply.
#[derive(Debug, Clone, Copy)]
pub struct EmailLogDefaults {
    pub email_type: &'static str,
    pub event_type: &'static str,
    pub template_key: &'static str,
}

pub const INVOICE_LOG_DEFAULTS: EmailLogDefaults = EmailLogDefaults {
    email_type: "invoice",
    event_type: "manual",
    template_key: "invoice",
};

pub const RECOMMENDATION_LOG_DEFAULTS: EmailLogDefaults = EmailLogDefaults {
    email_type: "recommendation_bouquet",
    event_type: "manual",
    template_key: "recommendation",
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailLogContext {
    pub email_type: String,
    pub event_type: String,
    pub event_note: String,
    pub template_key: String,
    pub order_id: String,
    pub customer_id: String,
    pub frame_item_id: String,
    pub paperweight_item_id: String,
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Resolve the log context and initial meta for an outgoing email.
///
/// Client-supplied `emailContext.meta` goes in first so the server-computed
/// keys always win.
pub fn build_email_log_context(
    payload: &InvoicePayload,
    defaults: EmailLogDefaults,
) -> (EmailLogContext, Map<String, Value>) {
    let mut ctx = EmailLogContext {
        email_type: defaults.email_type.to_string(),
        event_type: defaults.event_type.to_string(),
        event_note: String::new(),
        template_key: defaults.template_key.to_string(),
        order_id: payload.order.order_id.trim().to_string(),
        customer_id: payload.customer.id.trim().to_string(),
        frame_item_id: String::new(),
        paperweight_item_id: String::new(),
    };

    let mut meta = payload
        .email_context
        .as_ref()
        .and_then(|ec| ec.meta.clone())
        .unwrap_or_default();
    meta.insert("framesCount".to_string(), json!(payload.frames.len()));
    meta.insert(
        "hasPaperweight".to_string(),
        json!(payload.paperweight().is_some()),
    );

    let Some(ec) = &payload.email_context else {
        return (ctx, meta);
    };

    if let Some(email_type) = trimmed(&ec.email_type) {
        if is_allowed_email_type(&email_type) {
            ctx.email_type = email_type;
        } else {
            ctx.email_type = "generic".to_string();
            meta.insert("emailTypeInvalid".to_string(), json!(ec.email_type));
        }
    }

    let overrides = [
        (&mut ctx.event_type, &ec.event_type),
        (&mut ctx.event_note, &ec.event_note),
        (&mut ctx.template_key, &ec.template_key),
        (&mut ctx.order_id, &ec.order_id),
        (&mut ctx.customer_id, &ec.customer_id),
        (&mut ctx.frame_item_id, &ec.frame_item_id),
        (&mut ctx.paperweight_item_id, &ec.paperweight_item_id),
    ];
    for (field, value) in overrides {
        if let Some(value) = trimmed(value) {
            *field = value;
        }
    }

    if let Some(source) = trimmed(&ec.source) {
        meta.insert("source".to_string(), json!(source));
    }

    (ctx, meta)
}
