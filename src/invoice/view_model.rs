//! Invoice view model: the payload mapped into formatted line items and totals.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::models::{FramePayload, InvoicePayload, Number};

pub const DEFAULT_INVOICE_NOTES: &str = "Please quote your invoice number in reference.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRow {
    pub item_label: String,
    pub description: String,
    pub amount: String,
    pub is_sub_item: bool,
}

impl InvoiceRow {
    fn item(label: String, description: String, amount: f64) -> Self {
        Self {
            item_label: label,
            description,
            amount: format_money(amount),
            is_sub_item: false,
        }
    }

    fn sub_item(description: String, amount: f64) -> Self {
        Self {
            item_label: String::new(),
            description,
            amount: format_money(amount),
            is_sub_item: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceViewModel {
    pub address: String,
    pub occasion_date: String,
    pub invoice_date: String,
    pub invoice_no: String,
    pub rows: Vec<InvoiceRow>,
    pub notes: String,
    pub sub_total: String,
    pub vat_total: String,
    pub grand_total: String,
    pub credits: String,
    pub balance_due: String,
}

pub fn format_money(value: f64) -> String {
    format!("£{:.2}", value)
}

/// `YYYY-MM-DD` becomes `DD/MM/YYYY`; slash dates and unparseable input pass through.
pub fn format_date(value: &str) -> String {
    if value.trim().is_empty() {
        return "-".to_string();
    }
    if value.contains('/') {
        return value.to_string();
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => value.to_string(),
    }
}

pub fn format_invoice_no(value: Option<f64>) -> String {
    match value {
        Some(no) => (no as i64).to_string(),
        None => "-".to_string(),
    }
}

fn quantity_suffix(qty: &Number) -> String {
    match qty.value() {
        Some(q) => format!(" - Qty {:.0}", q),
        None => String::new(),
    }
}

fn frame_description(frame: &FramePayload) -> String {
    let mut parts = vec!["Picture".to_string()];
    if !frame.size.is_empty() {
        parts.push(frame.size.clone());
    }
    if !frame.frame_type.is_empty() {
        parts.push(format!("{} frame", frame.frame_type));
    }
    if !frame.glass_type.is_empty() {
        parts.push(frame.glass_type.clone());
    }
    parts.join(", ")
}

fn push_frame_extras(rows: &mut Vec<InvoiceRow>, frame: &FramePayload) {
    let Some(extras) = &frame.extras else {
        return;
    };

    if let Some(price) = extras.mount_price.positive() {
        let colour = frame.mount_colour.trim();
        let mut label = if colour.is_empty() {
            "Mount".to_string()
        } else {
            format!("Mount - {}", colour)
        };
        if frame.inclusions == "Buttonhole" {
            label.push_str(" - Buttonhole");
        }
        rows.push(InvoiceRow::sub_item(label, price));
    }

    if let Some(price) = extras.glass_price.positive() {
        rows.push(InvoiceRow::sub_item(
            format!("Glass - {}", frame.glass_type),
            price,
        ));
    }

    if let Some(price) = extras.glass_engraving_price.positive() {
        let text = frame.glass_engraving.trim();
        let description = if text.is_empty() {
            "Glass engraving".to_string()
        } else {
            format!("Glass engraving - \"{}\"", text)
        };
        rows.push(InvoiceRow::sub_item(description, price));
    }
}

/// Line items in invoice order. Only frames and the paperweight take an item number.
pub fn build_invoice_rows(payload: &InvoicePayload) -> Vec<InvoiceRow> {
    let mut rows = Vec::new();
    let mut item_index = 1;

    for frame in &payload.frames {
        rows.push(InvoiceRow::item(
            format!("Item {}", item_index),
            frame_description(frame),
            frame.price.value().unwrap_or(0.0),
        ));
        push_frame_extras(&mut rows, frame);
        item_index += 1;
    }

    if let Some(paperweight) = payload.paperweight() {
        if let Some(price) = paperweight.price.value() {
            let qty = paperweight.quantity.positive().unwrap_or(1.0);
            rows.push(InvoiceRow::item(
                format!("Item {}", item_index),
                format!("Paperweight - Quantity {:.0}", qty),
                price,
            ));
        }
    }

    if let Some(extras) = &payload.order_extras {
        let mut push_other = |description: String, amount: &Number| {
            if let Some(amount) = amount.positive() {
                rows.push(InvoiceRow::item("Other".to_string(), description, amount));
            }
        };

        push_other(
            format!(
                "Replacement flowers{}",
                quantity_suffix(&extras.replacement_flowers_qty)
            ),
            &extras.replacement_flowers_price,
        );
        push_other(
            format!("Collection{}", quantity_suffix(&extras.collection_qty)),
            &extras.collection_price,
        );
        push_other(
            format!("Delivery{}", quantity_suffix(&extras.delivery_qty)),
            &extras.delivery_price,
        );
        push_other(
            "Return of unframed flowers charge".to_string(),
            &extras.return_unused_flowers_price,
        );
    }

    rows
}

fn build_address(payload: &InvoicePayload) -> String {
    let order = &payload.order;
    let lines = [
        payload.customer.display_name(),
        order.billing_address_line1.clone(),
        order.billing_address_line2.clone(),
        order.billing_town.clone(),
        order.billing_county.clone(),
        order.billing_postcode.clone(),
    ];
    let address = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    if address.trim().is_empty() {
        "-".to_string()
    } else {
        address.trim().to_string()
    }
}

/// Build the view model for `payload`, dated `today`.
pub fn build_invoice_view_model_on(payload: &InvoicePayload, today: NaiveDate) -> InvoiceViewModel {
    let notes = payload
        .order_extras
        .as_ref()
        .map(|extras| extras.notes.trim())
        .filter(|notes| !notes.is_empty())
        .unwrap_or(DEFAULT_INVOICE_NOTES)
        .to_string();

    let totals = &payload.totals;

    InvoiceViewModel {
        address: build_address(payload),
        occasion_date: format_date(payload.order.occasion_date.as_str()),
        invoice_date: format_date(&today.format("%Y-%m-%d").to_string()),
        invoice_no: format_invoice_no(payload.order.order_no.value()),
        rows: build_invoice_rows(payload),
        notes,
        sub_total: format_money(totals.sub_total),
        vat_total: format_money(totals.vat_total),
        grand_total: format_money(totals.grand_total),
        credits: format_money(totals.grand_total),
        balance_due: format_money(0.0),
    }
}

pub fn build_invoice_view_model(payload: &InvoicePayload) -> InvoiceViewModel {
    build_invoice_view_model_on(payload, Local::now().date_naive())
}
