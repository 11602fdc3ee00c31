use actix_web::{web, HttpResponse};
use log::{debug, error, info};

use super::decode::decode_payload;
use super::models::InvoicePayload;
use super::view_model::build_invoice_view_model;
use crate::auth::AuthenticatedUser;
use crate::db::AppState;
use crate::document::RenderError;
use crate::error::AppError;
use crate::ErrorResponse;

/// Build the view model for `payload` and render it through the invoice template.
pub async fn render_invoice_html(
    state: &AppState,
    payload: &InvoicePayload,
) -> Result<String, AppError> {
    let view = build_invoice_view_model(payload);
    let templates = state.templates.clone();
    let path = templates.template_path().display().to_string();
    debug!("Rendering invoice {} with {} rows", view.invoice_no, view.rows.len());

    let rendered = web::block(move || templates.render(&view))
        .await
        .map_err(|e| RenderError::Execute(e.to_string()))
        .and_then(|result| result);

    rendered.map_err(|source| {
        error!("invoice templatePath: {}", path);
        error!("invoice render error ({}): {}", source.stage(), source);
        AppError::Render {
            source,
            path: Some(path),
        }
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice",
    post,
    path = "/invoice/preview",
    request_body(content = serde_json::Value, description = "Order payload", content_type = "application/json"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Rendered invoice", content_type = "text/html", body = String),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Failed to render invoice", body = ErrorResponse)
    )
)]
pub async fn preview_invoice(
    user: AuthenticatedUser,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Executing preview_invoice handler for {}", user.email);

    let payload: InvoicePayload = decode_payload(&body)?;
    let html = render_invoice_html(&data, &payload).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/invoice/preview").route(web::post().to(preview_invoice)));
}
