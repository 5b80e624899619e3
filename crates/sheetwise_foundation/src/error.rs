//! Error types for the sheetwise engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Only conditions that abort a whole analysis are errors; everything the
//! pipeline can recover from is reported as a [`Warning`](crate::Warning).

use std::fmt;

use thiserror::Error;

/// The main error type for sheetwise operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an unsupported format error.
    #[must_use]
    pub fn unsupported_format(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFormat(detail.into()))
    }

    /// Creates a corrupted file error.
    #[must_use]
    pub fn corrupted_file(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptedFile(detail.into()))
    }

    /// Creates a no-region-detected error for a sheet.
    #[must_use]
    pub fn no_region_detected(sheet: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoRegionDetected(sheet.into()))
    }

    /// Creates the error raised when no sheet yields usable data.
    #[must_use]
    pub fn no_usable_data(sheets: usize) -> Self {
        Self::new(ErrorKind::NoUsableData { sheets })
    }

    /// Creates a formula syntax error.
    #[must_use]
    pub fn formula_syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::new(ErrorKind::FormulaSyntax {
            message: message.into(),
            offset,
        })
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig(message.into()))
    }

    /// Returns true if this error aborts the whole analysis.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self.kind,
            ErrorKind::NoRegionDetected(_)
                | ErrorKind::FormulaSyntax { .. }
                | ErrorKind::NodeLimitExceeded { .. }
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Input matches none of the XLSX, XLS or delimited-text signatures.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The container was recognized but could not be parsed.
    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    /// No data region could be found on a sheet.
    #[error("no data region detected on sheet '{0}'")]
    NoRegionDetected(String),

    /// Every sheet was skipped, so there is nothing to analyze.
    #[error("no usable data in any of {sheets} sheet(s)")]
    NoUsableData {
        /// Number of sheets that were examined.
        sheets: usize,
    },

    /// A formula could not be tokenized or parsed.
    #[error("formula syntax error at offset {offset}: {message}")]
    FormulaSyntax {
        /// Description of the problem.
        message: String,
        /// Byte offset into the formula text.
        offset: usize,
    },

    /// A formula produced more AST nodes than the configured limit.
    #[error("formula exceeds the node limit of {limit}")]
    NodeLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Thresholds or options failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file name.
    pub source: Option<String>,
    /// Sheet name.
    pub sheet: Option<String>,
    /// Cell reference such as `G2`.
    pub cell: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the sheet.
    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Sets the cell reference.
    #[must_use]
    pub fn with_cell(mut self, cell: impl Into<String>) -> Self {
        self.cell = Some(cell.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
        }
        if let Some(sheet) = &self.sheet {
            write!(f, " [{sheet}")?;
            if let Some(cell) = &self.cell {
                write!(f, "!{cell}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err.to_string()))
    }
}

/// Result type alias for sheetwise operations.
pub type Result<T> = std::result::Result<T, Error>;
