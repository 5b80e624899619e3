//! Delimited text reader.

use std::path::Path;

use sheetwise_foundation::{CellValue, Error, Result, Warning};
use tracing::{debug, warn};

use crate::LoadOptions;
use crate::delimiter::detect_delimiter;
use crate::encoding::{EncodingGuess, decode, detect_encoding};
use crate::format::FileFormat;
use crate::sheet::{Cell, RawSheet, Workbook};

/// Reads delimited text as a single-sheet workbook named after the file.
pub(crate) fn load_csv(bytes: &[u8], source_name: &str, options: &LoadOptions) -> Result<Workbook> {
    let mut warnings = Vec::new();

    let guess = options.encoding.map_or_else(
        || detect_encoding(bytes),
        |encoding| EncodingGuess {
            encoding,
            confidence: 1.0,
        },
    );
    let (text, had_errors) = decode(bytes, guess);
    debug!(
        source = source_name,
        encoding = guess.encoding.name(),
        confidence = guess.confidence,
        "decoded delimited text"
    );
    if had_errors {
        warn!(source = source_name, "replaced malformed byte sequences");
        warnings.push(
            Warning::low(format!(
                "'{source_name}' contains bytes that are not valid {}; they were replaced",
                guess.encoding.name()
            ))
            .with_suggestion("re-save the file as UTF-8"),
        );
    }

    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(&text, options.delimiter_sample_lines));
    debug!(
        source = source_name,
        delimiter = %char::from(delimiter).escape_default(),
        "detected delimiter"
    );

    let mut sheet = RawSheet::new(sheet_name(source_name), 0);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = 0usize;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if rows == 0 => {
                return Err(Error::corrupted_file(format!("{source_name}: {e}")));
            }
            Err(e) => {
                warn!(source = source_name, row = rows + 1, error = %e, "stopped reading");
                warnings.push(Warning::medium(format!(
                    "'{source_name}' could not be read past row {rows}: {e}"
                )));
                break;
            }
        };
        for (col, field) in record.iter().enumerate() {
            let value = CellValue::infer(field);
            if !value.is_empty() {
                sheet.set_cell(rows, col, Cell::new(value));
            }
        }
        rows += 1;
    }

    Ok(Workbook {
        source_name: source_name.to_string(),
        format: FileFormat::Csv,
        sheets: vec![sheet],
        named_ranges: Vec::new(),
        warnings,
    })
}

/// The implicit sheet name of a delimited file: its file stem.
fn sheet_name(source_name: &str) -> String {
    Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .map_or_else(|| "Sheet1".to_string(), str::to_string)
}
