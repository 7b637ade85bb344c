use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, ToolError};
use crate::model::{CellValue, SheetTable, WorkbookData};
use crate::report;

/// Writes the provided workbook data to the given path.
///
/// The workbook is saved to a temporary sibling file first and then renamed
/// over `path`, so a failed write leaves any previous file in place.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        write_sheet(worksheet, table).map_err(|err| write_error(path, err))?;
    }

    save_staged(path, |staging| workbook_writer.save(staging))
}

/// Adds the sheets of `workbook` to the existing workbook at `path` and
/// returns the names they were stored under.
///
/// Existing sheets are edited in place, so their cells, formulas, number
/// formats and tables survive. Sheet names already taken get a numeric
/// suffix. The result is staged and renamed like [`write_workbook`].
pub fn append_workbook(path: &Path, workbook: &WorkbookData) -> Result<Vec<String>> {
    let mut book = umya_spreadsheet::reader::xlsx::read(path).map_err(|err| {
        write_error(path, format!("existing report could not be read: {err}"))
    })?;

    let existing: Vec<String> = book
        .get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .collect();
    debug!(existing_sheets = existing.len(), "appending to existing report");
    let renamed = report::rename_for_append(existing.iter().map(String::as_str), workbook.clone());

    for table in &renamed.tables {
        let worksheet = book
            .new_sheet(table.sheet_name.as_str())
            .map_err(|err| write_error(path, err))?;
        fill_appended_sheet(worksheet, table);
    }

    save_staged(path, |staging| {
        umya_spreadsheet::writer::xlsx::write(&book, staging)
    })?;
    Ok(renamed.sheet_names().into_iter().map(String::from).collect())
}

fn write_sheet(worksheet: &mut Worksheet, table: &SheetTable) -> std::result::Result<(), XlsxError> {
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    let first_data_row = u32::from(!table.columns.is_empty());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = first_data_row + row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match cell {
                CellValue::Text(value) => {
                    worksheet.write_string(row_num, col_num, value)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(row_num, col_num, *value)?;
                }
                CellValue::Bool(value) => {
                    worksheet.write_boolean(row_num, col_num, *value)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    // Excel tables need a header and at least one data row.
    if !table.columns.is_empty() && !table.rows.is_empty() {
        let mut excel_table = rust_xlsxwriter::Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    }

    Ok(())
}

// umya addresses cells as 1-based (column, row).
fn fill_appended_sheet(worksheet: &mut umya_spreadsheet::Worksheet, table: &SheetTable) {
    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet
            .get_cell_mut((col_idx as u32 + 1, 1))
            .set_value_string(header.as_str());
    }

    let first_data_row = 1 + u32::from(!table.columns.is_empty());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = first_data_row + row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let target = worksheet.get_cell_mut((col_idx as u32 + 1, row_num));
            match cell {
                CellValue::Text(value) => {
                    target.set_value_string(value.as_str());
                }
                CellValue::Number(value) => {
                    target.set_value_number(*value);
                }
                CellValue::Bool(value) => {
                    target.set_value_bool(*value);
                }
                CellValue::Empty => {}
            }
        }
    }
}

fn save_staged<E: ToString>(
    path: &Path,
    save: impl FnOnce(&Path) -> std::result::Result<(), E>,
) -> Result<()> {
    let staging = staging_path(path);
    debug!(staging = %staging.display(), "saving workbook");
    if let Err(err) = save(&staging) {
        let _ = fs::remove_file(&staging);
        return Err(write_error(path, err));
    }
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(write_error(path, err));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
}

fn write_error(path: &Path, reason: impl ToString) -> ToolError {
    ToolError::ReportWrite {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
