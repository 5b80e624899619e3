//! Analysis pipeline for sheetwise.
//!
//! This crate wires the layers together:
//! - [`Analyzer`] - Loading, region detection, schema inference and formula translation
//! - [`Validator`] - Weighted [`ConfidenceScore`] and review warnings
//! - [`AnalysisResult`] - Everything inferred from one workbook

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod pipeline;
pub mod validator;

pub use pipeline::{AnalysisResult, Analyzer, formula_sites};
pub use validator::{ConfidenceScore, NEUTRAL_SCORE, Validator};
