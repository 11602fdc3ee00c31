use actix_web::{web, HttpResponse};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Instant;
use utoipa::ToSchema;

use super::context::{build_email_log_context, INVOICE_LOG_DEFAULTS, RECOMMENDATION_LOG_DEFAULTS};
use super::mailer::{EmailAttachment, OutgoingEmail};
use crate::auth::AuthenticatedUser;
use crate::db::{AppState, EmailLogEntry};
use crate::document::ConversionError;
use crate::error::AppError;
use crate::invoice::models::InvoicePayload;
use crate::invoice::view_model::format_invoice_no;
use crate::invoice::{decode_payload, render_invoice_html};
use crate::ErrorResponse;

#[derive(Serialize, ToSchema)]
pub struct SendEmailResponse {
    pub ok: bool,
}

fn decode_with_recipient(body: &[u8]) -> Result<InvoicePayload, AppError> {
    let payload: InvoicePayload = decode_payload(body)?;
    if payload.customer.email.trim().is_empty() {
        warn!("Rejecting email request without a customer email");
        return Err(AppError::Validation("Missing customer email.".to_string()));
    }
    Ok(payload)
}

fn greeting_name(payload: &InvoicePayload) -> &str {
    let first = payload.customer.first_name.trim();
    if first.is_empty() {
        "there"
    } else {
        first
    }
}

/// `Invoice #<no>`, or plain `Invoice` when the order has no number yet.
pub fn invoice_subject(payload: &InvoicePayload) -> String {
    let no = format_invoice_no(payload.order.order_no.value());
    if no == "-" {
        "Invoice".to_string()
    } else {
        format!("Invoice #{}", no)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn meta(pairs: Value) -> Map<String, Value> {
    match pairs {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn outgoing(state: &AppState, payload: &InvoicePayload, subject: &str) -> OutgoingEmail {
    OutgoingEmail {
        from_address: state.sender.address.clone(),
        from_name: state.sender.name.clone(),
        to: payload.customer.email.trim().to_string(),
        subject: subject.to_string(),
        html: String::new(),
        text: String::new(),
        attachments: Vec::new(),
    }
}

async fn convert_to_pdf(state: &AppState, html: String) -> Result<Vec<u8>, ConversionError> {
    let converter = state.pdf.clone();
    web::block(move || converter.convert(&html))
        .await
        .map_err(|e| ConversionError::Blocking(e.to_string()))?
}

#[utoipa::path(
    context_path = "/api",
    tag = "Email",
    post,
    path = "/email/invoice",
    request_body(content = serde_json::Value, description = "Order payload with customer email", content_type = "application/json"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Invoice sent", body = SendEmailResponse),
        (status = 400, description = "Invalid payload or missing customer email", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Rendering, PDF conversion or delivery failed", body = ErrorResponse)
    )
)]
pub async fn send_invoice_email(
    user: AuthenticatedUser,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Executing send_invoice_email handler");
    let payload = decode_with_recipient(&body)?;

    let subject = invoice_subject(&payload);
    let (ctx, initial_meta) = build_email_log_context(&payload, INVOICE_LOG_DEFAULTS);
    let mut log_entry: EmailLogEntry = data
        .create_email_log(
            &payload.customer.email,
            &payload.customer.display_name(),
            &subject,
            &ctx,
            user.id(),
            initial_meta,
        )
        .await;

    let html = match render_invoice_html(&data, &payload).await {
        Ok(html) => html,
        Err(err) => {
            let message = err.details().unwrap_or_else(|| err.to_string());
            data.update_email_log(
                &mut log_entry,
                "failed",
                &message,
                meta(json!({ "stage": "render_html" })),
            )
            .await;
            return Err(err);
        }
    };

    let pdf_start = Instant::now();
    let pdf = match convert_to_pdf(&data, html).await {
        Ok(pdf) => pdf,
        Err(e) => {
            error!("Invoice PDF conversion failed: {}", e);
            data.update_email_log(
                &mut log_entry,
                "failed",
                &e.to_string(),
                meta(json!({
                    "stage": "render_pdf",
                    "pdfMs": elapsed_ms(pdf_start),
                    "pdfBytes": 0,
                })),
            )
            .await;
            return Err(AppError::Conversion(e));
        }
    };
    let pdf_bytes = pdf.len();

    let name = greeting_name(&payload);
    let mut email = outgoing(&data, &payload, &subject);
    email.html = format!(
        "<p>Hi {},</p><p>Please find your invoice attached.</p>",
        name
    );
    email.text = format!("Hi {},\n\nPlease find your invoice attached.\n", name);
    email.attachments.push(EmailAttachment::pdf("invoice.pdf", pdf));

    let send_start = Instant::now();
    if let Err(e) = data.mailer.send(email).await {
        error!("Failed to send invoice email to {}: {}", payload.customer.email, e);
        data.update_email_log(
            &mut log_entry,
            "failed",
            &e.to_string(),
            meta(json!({
                "stage": "send_email",
                "sendMs": elapsed_ms(send_start),
                "pdfBytes": pdf_bytes,
            })),
        )
        .await;
        return Err(AppError::Send {
            kind: "invoice",
            source: e,
        });
    }

    data.update_email_log(
        &mut log_entry,
        "sent",
        "",
        meta(json!({
            "stage": "sent",
            "sendMs": elapsed_ms(send_start),
            "pdfBytes": pdf_bytes,
        })),
    )
    .await;

    info!("Invoice email sent to {}", payload.customer.email);
    Ok(HttpResponse::Ok().json(SendEmailResponse { ok: true }))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Email",
    post,
    path = "/email/recommendation",
    request_body(content = serde_json::Value, description = "Order payload with customer email", content_type = "application/json"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recommendation sent", body = SendEmailResponse),
        (status = 400, description = "Invalid payload or missing customer email", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Delivery failed", body = ErrorResponse)
    )
)]
pub async fn send_recommendation_email(
    user: AuthenticatedUser,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Executing send_recommendation_email handler");
    let payload = decode_with_recipient(&body)?;

    let subject = "Your bouquet recommendation";
    let (ctx, initial_meta) = build_email_log_context(&payload, RECOMMENDATION_LOG_DEFAULTS);
    let mut log_entry = data
        .create_email_log(
            &payload.customer.email,
            &payload.customer.display_name(),
            subject,
            &ctx,
            user.id(),
            initial_meta,
        )
        .await;

    let name = greeting_name(&payload);
    let mut email = outgoing(&data, &payload, subject);
    email.html = format!(
        "<p>Hi {},</p><p>Your recommendation is ready. If you have any questions, reply to this email.</p>",
        name
    );
    email.text = format!("Hi {},\n\nYour recommendation is ready.\n", name);

    let send_start = Instant::now();
    if let Err(e) = data.mailer.send(email).await {
        error!(
            "Failed to send recommendation email to {}: {}",
            payload.customer.email, e
        );
        data.update_email_log(
            &mut log_entry,
            "failed",
            &e.to_string(),
            meta(json!({
                "stage": "send_email",
                "sendMs": elapsed_ms(send_start),
            })),
        )
        .await;
        return Err(AppError::Send {
            kind: "recommendation",
            source: e,
        });
    }

    data.update_email_log(
        &mut log_entry,
        "sent",
        "",
        meta(json!({
            "stage": "sent",
            "sendMs": elapsed_ms(send_start),
        })),
    )
    .await;

    info!("Recommendation email sent to {}", payload.customer.email);
    Ok(HttpResponse::Ok().json(SendEmailResponse { ok: true }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/email/invoice").route(web::post().to(send_invoice_email)))
        .service(
            web::resource("/email/recommendation")
                .route(web::post().to(send_recommendation_email)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_subject() {
        let mut payload = InvoicePayload::default();
        assert_eq!(invoice_subject(&payload), "Invoice");

        payload.order.order_no = crate::invoice::models::Number(Some(1042.0));
        assert_eq!(invoice_subject(&payload), "Invoice #1042");
    }

    #[test]
    fn test_greeting_falls_back_to_there() {
        let mut payload = InvoicePayload::default();
        assert_eq!(greeting_name(&payload), "there");
        payload.customer.first_name = "Jane".to_string();
        assert_eq!(greeting_name(&payload), "Jane");
    }

    #[test]
    fn test_missing_email_is_a_validation_error() {
        let err = decode_with_recipient(br#"{"customer":{"email":"  "}}"#).unwrap_err();
        assert_eq!(err.to_string(), "Missing customer email.");
    }
}
