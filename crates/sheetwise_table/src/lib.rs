//! Region detection and normalization for sheetwise.
//!
//! This crate finds tables on raw sheets and turns them into typed records:
//! - [`RegionDetector`] - Header scoring and region extent
//! - [`normalize`] - Typed [`Table`]s with cleaned column names

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod normalize;
pub mod region;

pub use normalize::{ColumnKind, NameDeduper, Table, TableColumn, normalize};
pub use region::{DataRegion, HeaderSignals, RegionDetector};
