//! Order export to XLSX.

pub mod filter;
pub mod format;
pub mod handlers;
pub mod sheets;
pub mod workbook;

pub use filter::{build_orders_filter, resolve_date_range, ExportParams};
pub use handlers::config;
pub use sheets::{CellValue, OrderExport, Sheet};
pub use workbook::write_workbook;

/// Most orders a single export may contain.
pub const MAX_ORDERS_EXPORT: usize = 2000;
