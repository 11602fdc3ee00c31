//! Invoice payloads, the invoice view model and the preview route.

pub mod decode;
pub mod handlers;
pub mod models;
pub mod view_model;

pub use decode::{decode_payload, DecodeError};
pub use handlers::{config, render_invoice_html};
pub use models::InvoicePayload;
pub use view_model::{build_invoice_rows, build_invoice_view_model, InvoiceRow, InvoiceViewModel};
