//! Sheetwise - Spreadsheet schema auto-detection
//!
//! This crate re-exports all layers of the sheetwise system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: sheetwise_output     - JSON documents, MessagePack snapshots
//! Layer 4: sheetwise_engine     - Analysis pipeline, confidence scoring
//! Layer 3: sheetwise_formula    - Formula parser, rule translation
//! Layer 2: sheetwise_schema     - Column classifier, entities, relationships
//! Layer 1: sheetwise_table      - Region detection, normalization
//!          sheetwise_loader     - CSV/XLSX/XLS reading
//! Layer 0: sheetwise_foundation - Core types (CellValue, thresholds, Error)
//! ```

pub use sheetwise_engine as engine;
pub use sheetwise_formula as formula;
pub use sheetwise_foundation as foundation;
pub use sheetwise_loader as loader;
pub use sheetwise_output as output;
pub use sheetwise_schema as schema;
pub use sheetwise_table as table;
