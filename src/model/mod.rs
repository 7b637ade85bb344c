/// Represents a raw spreadsheet cell as loaded from a source table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Plain text cell. Cell kinds without a variant of their own (dates,
    /// error values) are read as their spreadsheet display text.
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Blank cell, or a position past the end of a ragged row.
    #[default]
    Empty,
}

impl CellValue {
    /// Renders the cell the way it reads in the spreadsheet. Whole numbers
    /// drop their fractional part and blank cells render as the empty string.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Bool(value) => value.to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Number(value as f64)
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A single data row with its zero-based position in the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: usize,
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Creates a row at the given position.
    pub fn new(index: usize, cells: Vec<CellValue>) -> Self {
        Self { index, cells }
    }

    /// Returns the cell in `column`, treating positions past the end of the
    /// row as blank.
    pub fn cell(&self, column: usize) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }
}

/// An ordered sequence of rows loaded from one worksheet. Row 0 is data;
/// no header row is assumed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    /// Builds a table from plain cell vectors, numbering rows from zero.
    pub fn from_cells(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(index, cells)| Row::new(index, cells))
                .collect(),
        }
    }

    /// Number of columns spanned by the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

impl WorkbookData {
    /// Names of all sheets in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.tables
            .iter()
            .map(|table| table.sheet_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(42.0).display_text(), "42");
        assert_eq!(CellValue::Number(-3.0).display_text(), "-3");
        assert_eq!(CellValue::Number(1.5).display_text(), "1.5");
    }

    #[test]
    fn blank_and_boolean_cells_render_as_text() {
        assert_eq!(CellValue::Empty.display_text(), "");
        assert_eq!(CellValue::Bool(true).display_text(), "true");
    }

    #[test]
    fn ragged_rows_read_blank_past_their_end() {
        let table = Table::from_cells(vec![
            vec!["Ali".into()],
            vec!["Ayşe".into(), "Kaya".into(), CellValue::Empty],
        ]);

        assert_eq!(table.width(), 3);
        assert_eq!(table.rows[0].cell(2), &CellValue::Empty);
        assert_eq!(table.rows[1].index, 1);
    }

    #[test]
    fn empty_table_has_no_width() {
        assert_eq!(Table::default().width(), 0);
    }
}
