//! Sheet layouts of the orders workbook.

use std::collections::HashMap;

use super::format::{export_date_dmy, export_extras_value, read_extras_map, stringify_json};
use crate::store::Record;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    Empty,
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<CellValue>>,
}

pub const ORDERS_HEADERS: &[&str] = &[
    "orderId",
    "orderNo",
    "created",
    "updated",
    "occasionDate",
    "customerId",
    "customerName",
    "customerEmail",
    "billingAddressLine1",
    "billingAddressLine2",
    "billingTown",
    "billingCounty",
    "billingPostcode",
    "orderStatus",
    "payment_status",
    "replacementFlowers",
    "replacementFlowersQty",
    "replacementFlowersPrice",
    "collectionQty",
    "collectionPrice",
    "deliveryQty",
    "deliveryPrice",
    "returnUnusedFlowers",
    "returnUnusedFlowersPrice",
    "artistHours",
    "notes",
];

pub const FRAME_ITEMS_HEADERS: &[&str] = &[
    "orderId",
    "orderNo",
    "frameItemId",
    "sizeX",
    "sizeY",
    "frameType",
    "layout",
    "preservationType",
    "glassType",
    "frameMountColour",
    "inclusions",
    "glassEngraving",
    "artworkComplete",
    "framingComplete",
    "preservationDate",
    "price",
    "framePrice",
    "mountPrice",
    "glassEngravingPrice",
    "glassPrice",
    "measuredWidthIn",
    "measuredHeightIn",
    "recommendedSizeWidthIn",
    "recommendedSizeHeightIn",
    "created",
    "updated",
];

pub const PAPERWEIGHTS_HEADERS: &[&str] = &[
    "orderId",
    "orderNo",
    "paperweightItemId",
    "quantity",
    "price",
    "paperweightReceived",
    "created",
    "updated",
];

pub const EMAIL_LOGS_HEADERS: &[&str] = &[
    "emailLogId",
    "sentAt",
    "channel",
    "status",
    "emailType",
    "eventType",
    "eventNote",
    "templateKey",
    "toName",
    "toEmail",
    "subject",
    "sentBy",
    "orderId",
    "customerId",
    "frameItemId",
    "paperweightItemId",
    "error",
    "meta",
];

/// Frame extras keys flattened into their own columns, in column order.
const FRAME_EXTRAS_KEYS: &[&str] = &[
    "framePrice",
    "mountPrice",
    "glassEngravingPrice",
    "glassPrice",
    "measuredWidthIn",
    "measuredHeightIn",
    "recommendedSizeWidthIn",
    "recommendedSizeHeightIn",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl ExportCustomer {
    pub fn from_record(record: &Record) -> Self {
        let name = [
            record.get_string("title"),
            record.get_string("firstName"),
            record.get_string("surname"),
        ]
        .join(" ")
        .trim()
        .to_string();

        Self {
            id: record.id.clone(),
            name,
            email: record.get_string("email"),
        }
    }
}

/// Everything fetched for one export, plus the joins between the collections.
#[derive(Debug, Default)]
pub struct OrderExport {
    pub orders: Vec<Record>,
    pub frame_items: Vec<Record>,
    pub paperweights: Vec<Record>,
    pub email_logs: Vec<Record>,
    pub customer_by_order: HashMap<String, ExportCustomer>,
    pub order_by_frame_item: HashMap<String, String>,
    pub order_by_paperweight: HashMap<String, String>,
    pub order_no_by_id: HashMap<String, i64>,
}

impl OrderExport {
    /// Index `orders` and collect the ids of their related records.
    /// Returns the frame item ids and paperweight ids to fetch.
    pub fn from_orders(orders: Vec<Record>) -> (Self, Vec<String>, Vec<String>) {
        let mut export = OrderExport::default();
        let mut frame_item_ids = Vec::new();
        let mut paperweight_ids = Vec::new();

        for order in &orders {
            export
                .order_no_by_id
                .insert(order.id.clone(), order.get_int("orderNo"));

            for frame_id in order.get_string_slice("frameOrderId") {
                if frame_id.trim().is_empty() {
                    continue;
                }
                export
                    .order_by_frame_item
                    .insert(frame_id.clone(), order.id.clone());
                frame_item_ids.push(frame_id);
            }

            let paperweight_id = order.get_string("paperweightOrderId").trim().to_string();
            if !paperweight_id.is_empty() {
                export
                    .order_by_paperweight
                    .insert(paperweight_id.clone(), order.id.clone());
                paperweight_ids.push(paperweight_id);
            }
        }

        export.orders = orders;
        (export, frame_item_ids, paperweight_ids)
    }

    pub fn order_ids(&self) -> Vec<String> {
        self.orders.iter().map(|o| o.id.clone()).collect()
    }

    /// Attach customers to their orders; a later customer for the same order wins.
    pub fn set_customers(&mut self, customers: &[Record]) {
        for customer in customers {
            let order_id = customer.get_string("orderId").trim().to_string();
            if order_id.is_empty() {
                continue;
            }
            self.customer_by_order
                .insert(order_id, ExportCustomer::from_record(customer));
        }
    }

    fn order_no(&self, order_id: &str) -> i64 {
        self.order_no_by_id.get(order_id).copied().unwrap_or(0)
    }

    pub fn to_sheets(&self) -> Vec<Sheet> {
        vec![
            self.orders_sheet(),
            self.frame_items_sheet(),
            self.paperweights_sheet(),
            self.email_logs_sheet(),
        ]
    }

    fn orders_sheet(&self) -> Sheet {
        let empty = ExportCustomer::default();
        let rows: Vec<Vec<CellValue>> = self
            .orders
            .iter()
            .map(|order| {
                let customer = self.customer_by_order.get(&order.id).unwrap_or(&empty);
                vec![
                    order.id.as_str().into(),
                    order.get_int("orderNo").into(),
                    export_date_dmy(&order.get_string("created")).into(),
                    export_date_dmy(&order.get_string("updated")).into(),
                    export_date_dmy(&order.get_string("occasionDate")).into(),
                    customer.id.as_str().into(),
                    customer.name.as_str().into(),
                    customer.email.as_str().into(),
                    order.get_string("billingAddressLine1").into(),
                    order.get_string("billingAddressLine2").into(),
                    order.get_string("billingTown").into(),
                    order.get_string("billingCounty").into(),
                    order.get_string("billingPostcode").into(),
                    order.get_string("orderStatus").into(),
                    order.get_string("payment_status").into(),
                    order.get_bool("replacementFlowers").into(),
                    order.get_float("replacementFlowersQty").into(),
                    order.get_float("replacementFlowersPrice").into(),
                    order.get_float("collectionQty").into(),
                    order.get_float("collectionPrice").into(),
                    order.get_float("deliveryQty").into(),
                    order.get_float("deliveryPrice").into(),
                    order.get_bool("returnUnusedFlowers").into(),
                    order.get_float("returnUnusedFlowersPrice").into(),
                    order.get_string("artistHours").into(),
                    order.get_string("notes").into(),
                ]
            })
            .collect();

        Sheet {
            name: "Orders",
            headers: ORDERS_HEADERS,
            rows,
        }
    }

    fn frame_items_sheet(&self) -> Sheet {
        let rows: Vec<Vec<CellValue>> = self
            .frame_items
            .iter()
            .map(|frame| {
                let order_id = self
                    .order_by_frame_item
                    .get(&frame.id)
                    .cloned()
                    .unwrap_or_default();
                let extras = read_extras_map(frame.get("extras"));

                let mut row: Vec<CellValue> = vec![
                    order_id.as_str().into(),
                    self.order_no(&order_id).into(),
                    frame.id.as_str().into(),
                    frame.get_string("sizeX").into(),
                    frame.get_string("sizeY").into(),
                    frame.get_string("frameType").into(),
                    frame.get_string("layout").into(),
                    frame.get_string("preservationType").into(),
                    frame.get_string("glassType").into(),
                    frame.get_string("frameMountColour").into(),
                    frame.get_string("inclusions").into(),
                    frame.get_string("glassEngraving").into(),
                    frame.get_bool("artworkComplete").into(),
                    frame.get_bool("framingComplete").into(),
                    export_date_dmy(&frame.get_string("preservationDate")).into(),
                    frame.get_float("price").into(),
                ];
                row.extend(
                    FRAME_EXTRAS_KEYS
                        .iter()
                        .map(|key| export_extras_value(key, extras.get(*key))),
                );
                row.push(export_date_dmy(&frame.get_string("created")).into());
                row.push(export_date_dmy(&frame.get_string("updated")).into());
                row
            })
            .collect();

        Sheet {
            name: "Frame Items",
            headers: FRAME_ITEMS_HEADERS,
            rows,
        }
    }

    fn paperweights_sheet(&self) -> Sheet {
        let rows: Vec<Vec<CellValue>> = self
            .paperweights
            .iter()
            .map(|pw| {
                let order_id = self
                    .order_by_paperweight
                    .get(&pw.id)
                    .cloned()
                    .unwrap_or_default();
                vec![
                    order_id.as_str().into(),
                    self.order_no(&order_id).into(),
                    pw.id.as_str().into(),
                    pw.get_int("quantity").into(),
                    pw.get_float("price").into(),
                    pw.get_bool("paperweightReceived").into(),
                    export_date_dmy(&pw.get_string("created")).into(),
                    export_date_dmy(&pw.get_string("updated")).into(),
                ]
            })
            .collect();

        Sheet {
            name: "Paperweights",
            headers: PAPERWEIGHTS_HEADERS,
            rows,
        }
    }

    fn email_logs_sheet(&self) -> Sheet {
        let text_fields = [
            "channel",
            "status",
            "emailType",
            "eventType",
            "eventNote",
            "templateKey",
            "toName",
            "toEmail",
            "subject",
            "sentBy",
            "orderId",
            "customerId",
            "frameItemId",
            "paperweightItemId",
            "error",
        ];

        let rows: Vec<Vec<CellValue>> = self
            .email_logs
            .iter()
            .map(|log| {
                let mut row: Vec<CellValue> = vec![
                    log.id.as_str().into(),
                    export_date_dmy(&log.get_string("sentAt")).into(),
                ];
                row.extend(text_fields.iter().map(|f| log.get_string(f).into()));
                row.push(stringify_json(log.get("meta")).into());
                row
            })
            .collect();

        Sheet {
            name: "Email Logs",
            headers: EMAIL_LOGS_HEADERS,
            rows,
        }
    }
}
