//! Raw sheet grids and workbooks.
//!
//! A [`RawSheet`] is a rectangular grid of [`Cell`]s. It is built once by a
//! reader and consumed read-only by every later stage.

use serde::{Deserialize, Serialize};
use sheetwise_foundation::{CellValue, PrimitiveKind, Warning};

use crate::format::FileFormat;

static EMPTY_CELL: Cell = Cell {
    value: CellValue::Empty,
    formula: None,
    style: CellStyle { bold: false },
    merged: None,
};

/// Presentation hints that help header detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    /// Bold or otherwise emphasized text.
    pub bold: bool,
}

/// A single cell of a raw sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cached or literal value.
    pub value: CellValue,
    /// Formula source text including the leading `=`, if any.
    pub formula: Option<String>,
    /// Style hints.
    pub style: CellStyle,
    /// Index into [`RawSheet::merged`] when the cell belongs to a merged range.
    pub merged: Option<usize>,
}

impl Cell {
    /// Creates a plain cell holding a value.
    #[must_use]
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            formula: None,
            style: CellStyle::default(),
            merged: None,
        }
    }

    /// Creates an empty cell.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(CellValue::Empty)
    }

    /// Attaches formula text, normalizing the leading `=`.
    #[must_use]
    pub fn with_formula(mut self, formula: impl AsRef<str>) -> Self {
        let text = formula.as_ref().trim();
        self.formula = Some(if text.starts_with('=') {
            text.to_string()
        } else {
            format!("={text}")
        });
        self
    }

    /// Marks the cell bold.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    /// Primitive kind of the cell value.
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        self.value.kind()
    }

    /// True if the cell has no value. Formula cells without a cached value are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A merged cell range, zero-based and inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRange {
    /// First row.
    pub start_row: usize,
    /// First column.
    pub start_col: usize,
    /// Last row.
    pub end_row: usize,
    /// Last column.
    pub end_col: usize,
}

impl MergedRange {
    /// Creates a merged range from inclusive corners.
    #[must_use]
    pub const fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    /// True if the range covers the cell.
    #[must_use]
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    /// True if the range spans more than one column.
    #[must_use]
    pub const fn spans_columns(&self) -> bool {
        self.end_col > self.start_col
    }
}

/// A formula found on a sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormulaCell<'a> {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
    /// Formula text including the leading `=`.
    pub formula: &'a str,
}

/// One sheet (or one CSV file) as a rectangular cell grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSheet {
    /// Sheet name.
    pub name: String,
    /// Zero-based position in the workbook.
    pub index: usize,
    rows: Vec<Vec<Cell>>,
    width: usize,
    /// Merged ranges on this sheet.
    pub merged: Vec<MergedRange>,
    #[serde(default)]
    styled: bool,
}

impl RawSheet {
    /// Creates an empty sheet.
    #[must_use]
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            rows: Vec::new(),
            width: 0,
            merged: Vec::new(),
            styled: false,
        }
    }

    /// Builds a sheet from rows of values; shorter rows are padded.
    #[must_use]
    pub fn from_rows<I, R>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = CellValue>,
    {
        let mut sheet = Self::new(name, 0);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                if !value.is_empty() {
                    sheet.set_cell(r, c, Cell::new(value));
                }
            }
            sheet.ensure_size(r + 1, 0);
        }
        sheet
    }

    /// Sets the workbook position.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// True if the sheet has no non-empty cell.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.rows.iter().flatten().all(Cell::is_empty)
    }

    /// Returns the cell at the given coordinates, or an empty cell when out of bounds.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Returns the value at the given coordinates.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        &self.cell(row, col).value
    }

    /// Returns a full row, or an empty slice when out of bounds.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map_or(&[], Vec::as_slice)
    }

    /// True if every cell of the row within `[start_col, end_col]` is empty.
    #[must_use]
    pub fn is_row_empty(&self, row: usize, start_col: usize, end_col: usize) -> bool {
        (start_col..=end_col).all(|c| self.cell(row, c).is_empty())
    }

    /// Columns of the first and last non-empty cells of a row.
    #[must_use]
    pub fn row_span(&self, row: usize) -> Option<(usize, usize)> {
        let cells = self.row(row);
        let first = cells.iter().position(|c| !c.is_empty())?;
        let last = cells.iter().rposition(|c| !c.is_empty())?;
        Some((first, last))
    }

    /// Stores a cell, growing the grid as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.ensure_size(row + 1, col + 1);
        self.styled |= cell.style.bold;
        self.rows[row][col] = cell;
    }

    /// True if any cell carries style hints.
    ///
    /// The XLSX/XLS readers cannot see cell formats, so sheets they build
    /// report false; only sheets assembled with [`Cell::bold`] report true.
    #[must_use]
    pub fn has_style_hints(&self) -> bool {
        self.styled
    }

    /// Attaches formula text to a cell, growing the grid as needed.
    pub fn set_formula(&mut self, row: usize, col: usize, formula: &str) {
        self.ensure_size(row + 1, col + 1);
        let cell = std::mem::replace(&mut self.rows[row][col], Cell::empty());
        self.rows[row][col] = cell.with_formula(formula);
    }

    /// Records a merged range and marks member cells.
    pub fn add_merged(&mut self, range: MergedRange) {
        let index = self.merged.len();
        self.ensure_size(range.end_row + 1, range.end_col + 1);
        for row in &mut self.rows[range.start_row..=range.end_row] {
            for cell in &mut row[range.start_col..=range.end_col] {
                cell.merged = Some(index);
            }
        }
        self.merged.push(range);
    }

    /// Returns the merged range a cell belongs to.
    #[must_use]
    pub fn merged_range(&self, row: usize, col: usize) -> Option<&MergedRange> {
        self.cell(row, col).merged.and_then(|i| self.merged.get(i))
    }

    /// Iterates over all formula cells in row-major order.
    pub fn formulas(&self) -> impl Iterator<Item = FormulaCell<'_>> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().filter_map(move |(c, cell)| {
                cell.formula.as_deref().map(|formula| FormulaCell {
                    row: r,
                    col: c,
                    formula,
                })
            })
        })
    }

    fn ensure_size(&mut self, height: usize, width: usize) {
        if width > self.width {
            self.width = width;
            for row in &mut self.rows {
                row.resize_with(width, Cell::empty);
            }
        }
        while self.rows.len() < height {
            self.rows.push(vec![Cell::empty(); self.width]);
        }
    }
}

/// A workbook-level defined name such as `TaxRates` → `Rates!$A$1:$B$5`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    /// Defined name.
    pub name: String,
    /// Referenced range text.
    pub reference: String,
}

/// Every sheet read from one input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    /// File name the workbook was read from.
    pub source_name: String,
    /// Detected container format.
    pub format: FileFormat,
    /// Successfully parsed sheets in workbook order.
    pub sheets: Vec<RawSheet>,
    /// Defined names.
    pub named_ranges: Vec<NamedRange>,
    /// Problems that did not prevent loading.
    pub warnings: Vec<Warning>,
}

impl Workbook {
    /// Returns the sheet with the given name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&RawSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sheet names in workbook order.
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
