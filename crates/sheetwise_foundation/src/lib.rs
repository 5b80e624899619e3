//! Core types shared by every sheetwise layer.
//!
//! This crate provides:
//! - [`CellValue`] - The value type for all spreadsheet data
//! - [`DataType`] and [`SemanticType`] - Column classifications
//! - [`DetectionThresholds`] - Every tunable threshold and weight
//! - [`Warning`] - Non-fatal findings surfaced for review
//! - [`Error`] - Rich error types with context
//! - [`naming`] - snake_case, singularization and column letters

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod naming;
pub mod types;
pub mod value;
pub mod warning;

pub use config::{DetectionThresholds, HeaderWeights, OverallWeights, RelationshipWeights};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use types::{DataType, SemanticType};
pub use value::{CellValue, PrimitiveKind, parse_number_lenient, parse_temporal};
pub use warning::{Severity, Warning};
