//! Spreadsheet loading for sheetwise.
//!
//! This crate turns raw file bytes into a [`Workbook`] of [`RawSheet`] grids:
//! - [`FileFormat`] - Content-based container detection
//! - [`encoding`] - Character encoding detection for delimited text
//! - [`delimiter`] - Delimiter detection by frequency analysis
//! - [`Loader`] - Reads XLSX, XLS and delimited text into raw sheets
//!
//! # Example
//!
//! ```
//! use sheetwise_loader::Loader;
//!
//! let workbook = Loader::new().load(b"Product ID,Name\n1,Widget\n", "Products.csv").unwrap();
//! assert_eq!(workbook.sheet_names(), vec!["Products"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod delimiter;
mod delimited;
pub mod encoding;
mod excel;
pub mod format;
pub mod sheet;

use std::path::Path;

use encoding_rs::Encoding;
use sheetwise_foundation::{Error, ErrorContext, Result};
use tracing::{info, warn};

pub use encoding::EncodingGuess;
pub use format::FileFormat;
pub use sheet::{Cell, CellStyle, FormulaCell, MergedRange, NamedRange, RawSheet, Workbook};

/// Options for reading delimited text.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Non-empty lines inspected when detecting the delimiter.
    pub delimiter_sample_lines: usize,
    /// Delimiter to use instead of detecting one.
    pub delimiter: Option<u8>,
    /// Encoding to use instead of detecting one.
    pub encoding: Option<&'static Encoding>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter_sample_lines: 20,
            delimiter: None,
            encoding: None,
        }
    }
}

impl LoadOptions {
    /// Forces a delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Forces an encoding by WHATWG label (`"utf-8"`, `"windows-1252"`, ...).
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown label.
    pub fn with_encoding_label(mut self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| Error::invalid_config(format!("unknown encoding '{label}'")))?;
        self.encoding = Some(encoding);
        Ok(self)
    }

    /// Sets the delimiter sample size.
    #[must_use]
    pub fn with_delimiter_sample_lines(mut self, lines: usize) -> Self {
        self.delimiter_sample_lines = lines;
        self
    }
}

/// Reads spreadsheet files into raw sheets.
#[derive(Clone, Debug, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    /// Creates a loader with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader with the given options.
    #[must_use]
    pub fn with_options(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Loads a workbook from bytes. `source_name` is the original file name.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` when the content is not a workbook or delimited
    /// text; `CorruptedFile` when no sheet can be parsed.
    pub fn load(&self, bytes: &[u8], source_name: &str) -> Result<Workbook> {
        let context = ErrorContext::new().with_source(source_name);
        let format = FileFormat::detect(bytes).map_err(|e| e.with_context(context.clone()))?;
        if let Some(hinted) = FileFormat::from_extension(source_name) {
            if hinted != format {
                warn!(
                    source = source_name,
                    extension = %hinted,
                    detected = %format,
                    "file extension does not match content"
                );
            }
        }

        let workbook = match format {
            FileFormat::Xlsx => excel::load_xlsx(bytes, source_name),
            FileFormat::Xls => excel::load_xls(bytes, source_name),
            FileFormat::Csv => delimited::load_csv(bytes, source_name, &self.options),
        }
        .map_err(|e| e.with_context(context))?;

        info!(
            source = source_name,
            format = %format,
            sheets = workbook.sheets.len(),
            warnings = workbook.warnings.len(),
            "loaded workbook"
        );
        Ok(workbook)
    }

    /// Loads a workbook from a file path.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, otherwise as [`Loader::load`].
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Workbook> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::from(e).with_context(ErrorContext::new().with_source(path.display().to_string()))
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.load(&bytes, &name)
    }
}
