//! Schema inference for sheetwise.
//!
//! This crate turns typed tables into a relational model:
//! - [`ColumnClassifier`] - Ordered [`TypeDetector`] cascade plus name-based semantics
//! - [`EntityExtractor`] - One [`Entity`] per table, with primary-key selection
//! - [`RelationshipFinder`] - Scored foreign-key [`Relationship`]s between entities

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod entity;
pub mod profile;
pub mod relationship;
pub mod vocabulary;

pub use classifier::{
    BooleanDetector, ColumnClassifier, ColumnMetadata, ColumnStats, DateDetector, Detection,
    EnumDetector, IdDetector, NumericDetector, PatternDetector, TextDetector, TypeDetector,
    default_detectors,
};
pub use entity::{
    Entity, EntityExtractor, Extraction, PrimaryKeyRule, entity_names, missing_key_warning,
    select_primary_key,
};
pub use profile::ColumnProfile;
pub use relationship::{
    Cardinality, DetectionMethod, ReferentialAction, Relationship, RelationshipFinder,
    RelationshipKind, RelationshipMetadata, ValueIndex, deduplicate, renumber,
};
