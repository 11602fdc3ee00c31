//! XLSX encoding of export sheets.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::sheets::{CellValue, Sheet};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Longest text, in characters, a single XLSX cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

/// `text` cut down to what a cell can hold.
fn fit_cell_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Encode `sheets` into an XLSX file, one worksheet per sheet in order.
/// Row 0 holds the headers.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (index, row) in sheet.rows.iter().enumerate() {
            let row_num = (index + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    CellValue::Text(text) if !text.is_empty() => {
                        let fitted = fit_cell_text(text);
                        if fitted.len() < text.len() {
                            log::warn!(
                                "Truncated {} cell at row {} col {} to {} characters",
                                sheet.name,
                                row_num,
                                col,
                                MAX_CELL_CHARS
                            );
                        }
                        worksheet.write_string(row_num, col, fitted)?;
                    }
                    CellValue::Number(number) => {
                        worksheet.write_number(row_num, col, *number)?;
                    }
                    CellValue::Int(number) => {
                        worksheet.write_number(row_num, col, *number as f64)?;
                    }
                    CellValue::Bool(value) => {
                        worksheet.write_boolean(row_num, col, *value)?;
                    }
                    CellValue::Text(_) | CellValue::Empty => {}
                }
            }
        }
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workbook_is_a_zip_container() {
        let sheets = vec![Sheet {
            name: "Orders",
            headers: &["orderId", "orderNo", "paid"],
            rows: vec![vec![
                CellValue::Text("o1".to_string()),
                CellValue::Int(17),
                CellValue::Bool(true),
            ]],
        }];

        let bytes = write_workbook(&sheets).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_oversized_text_is_truncated_not_fatal() {
        let notes = "é".repeat(40_000);
        let sheets = vec![Sheet {
            name: "Orders",
            headers: &["orderId", "notes"],
            rows: vec![vec![
                CellValue::Text("o1".to_string()),
                CellValue::Text(notes.clone()),
            ]],
        }];

        let bytes = write_workbook(&sheets).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let fitted = fit_cell_text(&notes);
        assert_eq!(fitted.chars().count(), MAX_CELL_CHARS);
        assert_eq!(fit_cell_text("short"), "short");
    }

    #[test]
    fn test_invalid_sheet_name_is_an_error() {
        let sheets = vec![Sheet {
            name: "Orders/2024",
            headers: &["orderId"],
            rows: Vec::new(),
        }];
        assert!(write_workbook(&sheets).is_err());
    }
}
