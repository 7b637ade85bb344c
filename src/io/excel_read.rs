use std::path::Path;

use calamine::{DataType, Range, Reader, open_workbook_auto};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, Row, Table};

/// Reads the first worksheet of an `.xlsx`, `.xlsm`, `.xls` or `.ods` file.
///
/// No header row is assumed. Cells keep their absolute column position, so a
/// sheet whose data starts in column `C` still exposes it at index 2.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|err| source_error(path, err))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| source_error(path, "workbook contains no worksheets"))?
        .map_err(|err| source_error(path, err))?;

    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<DataType>) -> Table {
    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let rows = range
        .rows()
        .enumerate()
        .map(|(offset, cells)| {
            let mut values = vec![CellValue::Empty; start_col];
            values.extend(cells.iter().map(cell_to_value));
            Row::new(start_row + offset, values)
        })
        .collect();

    Table { rows }
}

fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

fn source_error(path: &Path, reason: impl ToString) -> ToolError {
    ToolError::SourceRead {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
