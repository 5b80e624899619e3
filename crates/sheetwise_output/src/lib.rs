//! Output documents for sheetwise.
//!
//! This crate provides:
//! - [`OutputGenerator`] - The four documents built from an [`AnalysisResult`](sheetwise_engine::AnalysisResult)
//! - [`OutputBundle`] - The documents as one unit, written to or read from a directory
//! - [`sql`] - Data type to SQL type mapping
//! - [`snapshot`] - `MessagePack` snapshots of a whole analysis

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bundle;
pub mod documents;
pub mod generator;
pub mod snapshot;
pub mod sql;

pub use bundle::{
    AUTOMATION_RULES_FILE, CONFIRMATION_UI_FILE, OutputBundle, RELATIONSHIPS_FILE, SCHEMA_FILE,
    to_pretty_json,
};
pub use documents::{
    AutomationRulesDocument, ColumnItem, ColumnSchema, ColumnSchemaMetadata, ColumnValidation,
    ConfidenceLevel, ConfirmationUi, ConstraintKind, ConstraintSpec, DOCUMENT_VERSION, Diagram,
    DiagramEdge, DiagramNode, EdgeStyle, EntityItem, EntitySchema, ForeignKeySpec, IndexKind,
    IndexSpec, NodeMetadata, Position, RelationshipItem, RelationshipsDocument, RuleItem,
    SchemaDocument, SchemaMetadata, Size, StepAction, Summary, UiAction, UiSection, WarningItem,
    Workflow, WorkflowStep, WorkflowTrigger,
};
pub use generator::{OutputGenerator, generate};
