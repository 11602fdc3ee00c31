use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::{Local, Utc};
use log::{debug, error, info, warn};
use serde::Deserialize;
use utoipa::IntoParams;

use super::filter::{build_orders_filter, ExportParams};
use super::sheets::OrderExport;
use super::workbook::{write_workbook, XLSX_CONTENT_TYPE};
use super::MAX_ORDERS_EXPORT;
use crate::auth::AuthenticatedUser;
use crate::db::{AppState, EMAIL_LOGS_COLLECTION};
use crate::error::AppError;
use crate::store::StoreError;
use crate::ErrorResponse;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Export this single order; every other parameter is ignored.
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
    /// First day, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Last day, `YYYY-MM-DD`.
    pub to: Option<String>,
    #[serde(rename = "paymentStatus")]
    pub payment_status: Option<String>,
    #[serde(rename = "orderStatus")]
    pub order_status: Option<String>,
}

impl ExportQuery {
    fn params(&self) -> ExportParams {
        let clean = |v: &Option<String>| v.as_deref().unwrap_or("").trim().to_string();
        ExportParams {
            order_id: clean(&self.order_id),
            from: clean(&self.from),
            to: clean(&self.to),
            payment_status: clean(&self.payment_status),
            order_status: clean(&self.order_status),
        }
    }
}

fn query_failed(what: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |source| {
        error!("Failed to load {}: {}", what, source);
        AppError::Query { what, source }
    }
}

/// Query orders and their related records, joined for the workbook.
async fn load_order_export(
    data: &AppState,
    params: &ExportParams,
) -> Result<OrderExport, AppError> {
    let filter = build_orders_filter(params, Utc::now())
        .map_err(|e| AppError::Validation(e.to_string()))?;
    debug!("Export filter: {}", filter.to_expression());

    let orders = data
        .store
        .find_records("orders", Some(&filter), "-created", MAX_ORDERS_EXPORT + 1)
        .await
        .map_err(query_failed("orders"))?;
    if orders.len() > MAX_ORDERS_EXPORT {
        warn!("Export rejected: {} orders match", orders.len());
        return Err(AppError::LimitExceeded(orders.len()));
    }

    let (mut export, frame_item_ids, paperweight_ids) = OrderExport::from_orders(orders);
    let order_ids = export.order_ids();

    let customers = data
        .fetch_records_by_field("customers", "orderId", &order_ids)
        .await
        .map_err(query_failed("customers"))?;
    export.set_customers(&customers);

    export.frame_items = data
        .fetch_records_by_ids("order_frame_items", &frame_item_ids)
        .await
        .map_err(query_failed("frame items"))?;

    export.paperweights = data
        .fetch_records_by_ids("order_paperweight_items", &paperweight_ids)
        .await
        .map_err(query_failed("paperweight items"))?;

    export.email_logs = data
        .fetch_records_by_field(EMAIL_LOGS_COLLECTION, "orderId", &order_ids)
        .await
        .map_err(query_failed("email logs"))?;

    Ok(export)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Export",
    get,
    path = "/export/orders.xlsx",
    params(ExportQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "XLSX workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", body = Vec<u8>),
        (status = 400, description = "Invalid date or too many orders", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Query or workbook generation failed", body = ErrorResponse)
    )
)]
pub async fn export_orders_xlsx(
    _user: AuthenticatedUser,
    query: web::Query<ExportQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Executing export_orders_xlsx handler");
    let params = query.params();

    let export = load_order_export(&data, &params).await?;
    info!(
        "Exporting {} orders, {} frame items, {} paperweights, {} email logs",
        export.orders.len(),
        export.frame_items.len(),
        export.paperweights.len(),
        export.email_logs.len()
    );

    let sheets = export.to_sheets();
    let buffer = web::block(move || write_workbook(&sheets))
        .await
        .map_err(|e| AppError::Workbook(e.to_string()))?
        .map_err(|e| {
            error!("Failed to generate XLSX: {}", e);
            AppError::Workbook(e.to_string())
        })?;

    let filename = format!("orders-export-{}.xlsx", Local::now().format("%Y%m%d"));
    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .insert_header((header::PRAGMA, "no-cache"))
        .body(buffer))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/export/orders.xlsx").route(web::get().to(export_orders_xlsx)));
}
