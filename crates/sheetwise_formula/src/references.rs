//! A1-style references and the cross-sheet relationships they imply.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sheetwise_foundation::naming::{column_index, column_letter};
use sheetwise_schema::{
    Cardinality, DetectionMethod, ReferentialAction, Relationship, RelationshipKind,
    RelationshipMetadata,
};

use crate::lexer::Lexer;
use crate::translate::{FormulaSite, WorkbookContext};

/// Last column Excel addresses (`XFD`).
const MAX_COLUMN: usize = 16_383;

static CELL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(\$?)([A-Za-z]{1,3})(\$?)([0-9]{1,7})$"));
static COLUMN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})$"));
static ROW: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\$?([0-9]{1,7})$"));

/// A single cell address with absolute markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
    /// `$` before the row.
    pub row_absolute: bool,
    /// `$` before the column.
    pub col_absolute: bool,
}

impl CellAddress {
    fn parse(text: &str) -> Option<Self> {
        let Ok(ref cell) = *CELL else {
            return None;
        };
        let caps = cell.captures(text)?;
        let col = column_index(&caps[2]).filter(|&c| c <= MAX_COLUMN)?;
        let row = caps[4].parse::<usize>().ok().filter(|&r| r >= 1)? - 1;
        Some(Self {
            row,
            col,
            row_absolute: !caps[3].is_empty(),
            col_absolute: !caps[1].is_empty(),
        })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col_mark = if self.col_absolute { "$" } else { "" };
        let row_mark = if self.row_absolute { "$" } else { "" };
        write!(
            f,
            "{col_mark}{}{row_mark}{}",
            column_letter(self.col),
            self.row + 1
        )
    }
}

/// The cells a reference covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Area {
    /// One cell.
    Cell(CellAddress),
    /// Rectangle between two cells.
    Range {
        /// Top-left corner as written.
        start: CellAddress,
        /// Bottom-right corner as written.
        end: CellAddress,
    },
    /// Whole columns, zero-based and inclusive.
    Columns {
        /// First column.
        start: usize,
        /// Last column.
        end: usize,
    },
    /// Whole rows, zero-based and inclusive.
    Rows {
        /// First row.
        start: usize,
        /// Last row.
        end: usize,
    },
}

/// A possibly sheet-qualified reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Sheet name without quotes, if qualified.
    pub sheet: Option<String>,
    /// Covered cells.
    pub area: Area,
}

impl Reference {
    /// Parses `E2`, `$A$1:B9`, `A:D`, `1:3`, `Products!A:D` or `'Order Lines'!A2`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (sheet, area) = split_sheet(text)?;
        let area = match area.split_once(':') {
            None => Area::Cell(CellAddress::parse(area)?),
            Some((a, b)) => parse_pair(a, b)?,
        };
        Some(Self { sheet, area })
    }

    /// Returns true for anything wider than one cell.
    #[must_use]
    pub const fn is_range(&self) -> bool {
        !matches!(self.area, Area::Cell(_))
    }

    /// Leftmost column, if the reference covers columns.
    #[must_use]
    pub fn first_column(&self) -> Option<usize> {
        match self.area {
            Area::Cell(c) => Some(c.col),
            Area::Range { start, end } => Some(start.col.min(end.col)),
            Area::Columns { start, end } => Some(start.min(end)),
            Area::Rows { .. } => None,
        }
    }

    /// Writes the reference with relative rows expressed as offsets from
    /// `origin_row`, so the same formula filled down compares equal.
    #[must_use]
    pub fn shape(&self, origin_row: usize) -> String {
        let cell = |c: CellAddress| {
            let col = if c.col_absolute {
                format!("${}", column_letter(c.col))
            } else {
                column_letter(c.col)
            };
            if c.row_absolute {
                format!("{col}${}", c.row + 1)
            } else {
                #[allow(clippy::cast_possible_wrap)]
                let offset = c.row as i64 - origin_row as i64;
                format!("{col}[{offset:+}]")
            }
        };
        let area = match self.area {
            Area::Cell(c) => cell(c),
            Area::Range { start, end } => format!("{}:{}", cell(start), cell(end)),
            Area::Columns { .. } | Area::Rows { .. } => self.area_text(),
        };
        match &self.sheet {
            Some(sheet) => format!("{}!{area}", quote_sheet(sheet)),
            None => area,
        }
    }

    fn area_text(&self) -> String {
        match self.area {
            Area::Cell(c) => c.to_string(),
            Area::Range { start, end } => format!("{start}:{end}"),
            Area::Columns { start, end } => {
                format!("{}:{}", column_letter(start), column_letter(end))
            }
            Area::Rows { start, end } => format!("{}:{}", start + 1, end + 1),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", quote_sheet(sheet))?;
        }
        f.write_str(&self.area_text())
    }
}

fn quote_sheet(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

fn split_sheet(text: &str) -> Option<(Option<String>, &str)> {
    if let Some(quoted) = text.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if chars.peek().is_some_and(|&(_, n)| n == '\'') {
                    chars.next();
                    name.push('\'');
                    continue;
                }
                let rest = quoted.get(i + 1..)?.strip_prefix('!')?;
                return Some((Some(name), rest));
            }
            name.push(c);
        }
        return None;
    }
    match text.rsplit_once('!') {
        Some((sheet, area)) if !sheet.is_empty() => Some((Some(sheet.to_string()), area)),
        Some(_) => None,
        None => Some((None, text)),
    }
}

fn parse_pair(a: &str, b: &str) -> Option<Area> {
    if let (Some(start), Some(end)) = (CellAddress::parse(a), CellAddress::parse(b)) {
        return Some(Area::Range { start, end });
    }
    let (Ok(column), Ok(row)) = (&*COLUMN, &*ROW) else {
        return None;
    };
    if let (Some(x), Some(y)) = (column.captures(a), column.captures(b)) {
        let start = column_index(&x[1]).filter(|&c| c <= MAX_COLUMN)?;
        let end = column_index(&y[1]).filter(|&c| c <= MAX_COLUMN)?;
        return Some(Area::Columns { start, end });
    }
    if let (Some(x), Some(y)) = (row.captures(a), row.captures(b)) {
        let start = x[1].parse::<usize>().ok().filter(|&r| r >= 1)? - 1;
        let end = y[1].parse::<usize>().ok().filter(|&r| r >= 1)? - 1;
        return Some(Area::Rows { start, end });
    }
    None
}

// =============================================================================
// Cross-sheet relationships
// =============================================================================

/// Relationships implied by formulas that read other sheets.
///
/// One relationship per `(from_entity, to_entity)` pair in first-seen order.
/// Confidence is 0.9 when both ends resolve to columns, 0.8 otherwise. Ids are
/// left empty for the caller to number.
#[must_use]
pub fn formula_references(sites: &[FormulaSite], context: &WorkbookContext) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for site in sites {
        let Some(from_entity) = context.entity(&site.sheet) else {
            continue;
        };
        let from_column = context.field(&site.sheet, site.col);
        for token in Lexer::tokenize_all(&site.formula) {
            let Some(reference) = token.kind.reference() else {
                continue;
            };
            let Some(sheet) = &reference.sheet else {
                continue;
            };
            let Some(to_entity) = context.entity(sheet) else {
                continue;
            };
            if to_entity == from_entity
                || !seen.insert((from_entity.to_string(), to_entity.to_string()))
            {
                continue;
            }
            let to_column = reference
                .first_column()
                .and_then(|col| context.field(sheet, col));
            let resolved = from_column.is_some() && to_column.is_some();
            let confidence = if resolved { 0.9 } else { 0.8 };
            let (on_delete, on_update) = ReferentialAction::defaults(Cardinality::ManyToOne);
            found.push(Relationship {
                id: String::new(),
                from_entity: from_entity.to_string(),
                from_column: from_column.map_or_else(
                    || column_letter(site.col),
                    ToString::to_string,
                ),
                to_entity: to_entity.to_string(),
                to_column: to_column.map_or_else(|| reference.to_string(), ToString::to_string),
                kind: RelationshipKind::FormulaReference,
                cardinality: Cardinality::ManyToOne,
                confidence,
                description: format!(
                    "formula in {}!{} reads {reference}",
                    site.sheet,
                    sheetwise_foundation::naming::cell_reference(site.row, site.col)
                ),
                on_delete,
                on_update,
                metadata: RelationshipMetadata {
                    detection_method: DetectionMethod::FormulaReference,
                    value_overlap: 0.0,
                    name_similarity: 0.0,
                    type_compatibility: 0.0,
                },
            });
        }
    }
    found
}
