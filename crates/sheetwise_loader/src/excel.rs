//! XLSX and XLS readers built on calamine.

use std::collections::HashMap;
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

use calamine::{Data, Dimensions, Range, Reader, Xls, Xlsx};
use chrono::NaiveTime;
use sheetwise_foundation::{CellValue, Error, Result, Warning, parse_temporal};
use tracing::{debug, warn};

use crate::format::FileFormat;
use crate::sheet::{Cell, MergedRange, NamedRange, RawSheet, Workbook};

/// Reads an Office Open XML workbook.
pub(crate) fn load_xlsx(bytes: &[u8], source_name: &str) -> Result<Workbook> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| Error::corrupted_file(format!("{source_name}: {e}")))?;

    let mut warnings = Vec::new();
    let mut merged: HashMap<String, Vec<Dimensions>> = HashMap::new();
    match workbook.load_merged_regions() {
        Ok(()) => {
            for name in workbook.sheet_names() {
                match workbook.worksheet_merge_cells(&name) {
                    Some(Ok(regions)) => {
                        merged.insert(name, regions);
                    }
                    Some(Err(e)) => {
                        warn!(sheet = %name, error = %e, "merged cells unreadable");
                    }
                    None => {}
                }
            }
        }
        Err(e) => {
            warn!(source = source_name, error = %e, "merged cells unreadable");
            warnings.push(Warning::low(format!(
                "merged cells in '{source_name}' could not be read: {e}"
            )));
        }
    }

    read_workbook(&mut workbook, source_name, FileFormat::Xlsx, &merged, warnings)
}

/// Reads a legacy binary workbook. Merged ranges are not available for this format.
pub(crate) fn load_xls(bytes: &[u8], source_name: &str) -> Result<Workbook> {
    let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
        .map_err(|e: calamine::XlsError| Error::corrupted_file(format!("{source_name}: {e}")))?;
    read_workbook(
        &mut workbook,
        source_name,
        FileFormat::Xls,
        &HashMap::new(),
        Vec::new(),
    )
}

fn read_workbook<RS, R>(
    workbook: &mut R,
    source_name: &str,
    format: FileFormat,
    merged: &HashMap<String, Vec<Dimensions>>,
    mut warnings: Vec<Warning>,
) -> Result<Workbook>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(Error::corrupted_file(format!(
            "{source_name}: workbook has no sheets"
        )));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let range = match workbook.worksheet_range(name) {
            Ok(range) => range,
            Err(e) => {
                warn!(sheet = %name, error = %e, "skipping unreadable sheet");
                warnings.push(
                    Warning::high(format!("sheet '{name}' could not be parsed: {e}"))
                        .with_suggestion("repair or remove the sheet and upload again"),
                );
                continue;
            }
        };

        let mut sheet = RawSheet::new(name.clone(), index);
        fill_values(&mut sheet, &range);

        match workbook.worksheet_formula(name) {
            Ok(formulas) => fill_formulas(&mut sheet, &formulas),
            Err(e) => {
                warn!(sheet = %name, error = %e, "formulas unreadable");
                warnings.push(Warning::low(format!(
                    "formulas on sheet '{name}' could not be read: {e}"
                )));
            }
        }

        for region in merged.get(name).into_iter().flatten() {
            sheet.add_merged(MergedRange::new(
                region.start.0 as usize,
                region.start.1 as usize,
                region.end.0 as usize,
                region.end.1 as usize,
            ));
        }

        debug!(
            sheet = %name,
            rows = sheet.height(),
            cols = sheet.width(),
            merged = sheet.merged.len(),
            "loaded sheet"
        );
        sheets.push(sheet);
    }

    if sheets.is_empty() {
        return Err(Error::corrupted_file(format!(
            "{source_name}: none of {} sheet(s) could be parsed",
            names.len()
        )));
    }

    let named_ranges = workbook
        .defined_names()
        .iter()
        .map(|(name, reference)| NamedRange {
            name: name.clone(),
            reference: reference.clone(),
        })
        .collect();

    Ok(Workbook {
        source_name: source_name.to_string(),
        format,
        sheets,
        named_ranges,
        warnings,
    })
}

fn fill_values(sheet: &mut RawSheet, range: &Range<Data>) {
    let Some((row0, col0)) = range.start() else {
        return;
    };
    for (r, c, data) in range.cells() {
        let value = convert(data);
        if !value.is_empty() {
            sheet.set_cell(row0 as usize + r, col0 as usize + c, Cell::new(value));
        }
    }
}

fn fill_formulas(sheet: &mut RawSheet, formulas: &Range<String>) {
    let Some((row0, col0)) = formulas.start() else {
        return;
    };
    for (r, c, formula) in formulas.cells() {
        if !formula.trim().is_empty() {
            sheet.set_formula(row0 as usize + r, col0 as usize + c, formula);
        }
    }
}

/// Converts a calamine cell into a [`CellValue`].
///
/// Excel stores every number as a double, so integral values become `Int`.
#[allow(clippy::cast_possible_truncation)]
fn convert(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => CellValue::Int(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == NaiveTime::MIN => CellValue::Date(ndt.date()),
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_temporal(s).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}
