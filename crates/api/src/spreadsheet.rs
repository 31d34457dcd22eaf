//! Spreadsheet codec: first-sheet reading with calamine, writing with
//! rust_xlsxwriter. Cells cross this boundary as plain strings.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use examhall_core::error::CoreError;
use rust_xlsxwriter::Workbook;

/// Read the first worksheet of an `.xlsx`/`.xls` file as text rows.
///
/// Empty cells become empty strings; numbers and dates use their display
/// form.
pub fn read_first_sheet(bytes: Vec<u8>) -> Result<Vec<Vec<String>>, CoreError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CoreError::Validation(format!("Could not read spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CoreError::Validation("Spreadsheet contains no worksheets".to_string()))?
        .map_err(|e| CoreError::Validation(format!("Could not read first worksheet: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// Write a single-sheet workbook: `header` on the first row, then `rows`.
pub fn write_workbook<R, C>(sheet_name: &str, header: &[&str], rows: R) -> Result<Vec<u8>, CoreError>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| CoreError::Internal(format!("xlsx: {e}"));

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(xlsx_err)?;

    for (col, title) in header.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *title)
            .map_err(xlsx_err)?;
    }
    for (i, row) in rows.into_iter().enumerate() {
        let row_idx = u32::try_from(i + 1)
            .map_err(|_| CoreError::Internal("too many rows for one sheet".to_string()))?;
        for (col, cell) in row.into_iter().enumerate() {
            worksheet
                .write_string(row_idx, col as u16, cell.as_ref())
                .map_err(xlsx_err)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
