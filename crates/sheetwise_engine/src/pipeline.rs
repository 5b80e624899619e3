//! The end-to-end analysis pipeline.
//!
//! Sheets are processed independently up to normalization, in parallel.
//! Entity extraction, relationship finding and formula translation then run
//! over the collected tables, and the validator scores the result.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sheetwise_foundation::{DetectionThresholds, Error, ErrorContext, Result, Warning};
use sheetwise_formula::{AutomationRule, FormulaSite, FormulaTranslator, WorkbookContext};
use sheetwise_loader::{FileFormat, LoadOptions, Loader, RawSheet, Workbook};
use sheetwise_schema::{
    Entity, EntityExtractor, Relationship, RelationshipFinder, deduplicate, renumber,
};
use sheetwise_table::{DataRegion, RegionDetector, Table, normalize};
use tracing::{debug, info, warn};

use crate::validator::{ConfidenceScore, Validator};

/// Everything inferred from one workbook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Original file name.
    pub source_file: String,
    /// Detected container format.
    pub format: FileFormat,
    /// Sheet names in workbook order.
    pub sheets: Vec<String>,
    /// Every candidate region, best first within each sheet.
    pub regions: Vec<DataRegion>,
    /// One entity per analyzed sheet.
    pub entities: Vec<Entity>,
    /// Foreign-key relationships followed by formula references.
    pub relationships: Vec<Relationship>,
    /// One rule per formula group.
    pub rules: Vec<AutomationRule>,
    /// Confidence and review warnings.
    pub score: ConfidenceScore,
    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Returns an entity by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Rules owned by an entity.
    pub fn rules_for<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a AutomationRule> {
        self.rules.iter().filter(move |r| r.entity == entity)
    }
}

/// Output of the per-sheet stage.
#[derive(Debug, Default)]
struct SheetOutcome {
    regions: Vec<DataRegion>,
    table: Option<Table>,
    warnings: Vec<Warning>,
}

/// Runs the full analysis.
///
/// # Example
///
/// ```
/// use sheetwise_engine::Analyzer;
///
/// let csv = b"Product ID,Name,Price\n1,Widget,9.99\n2,Gadget,19.50\n3,Gizmo,4.25\n";
/// let result = Analyzer::new().analyze(csv, "Products.csv").unwrap();
/// assert_eq!(result.entities[0].table_name, "products");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    thresholds: DetectionThresholds,
    load_options: LoadOptions,
}

impl Analyzer {
    /// Creates an analyzer with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: DetectionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replaces the delimited-text options.
    #[must_use]
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// The thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }

    /// Analyzes file bytes. `source_name` is the original file name.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for bad thresholds, `UnsupportedFormat` and
    /// `CorruptedFile` from loading, and `NoUsableData` when no sheet yields
    /// a table.
    pub fn analyze(&self, bytes: &[u8], source_name: &str) -> Result<AnalysisResult> {
        self.thresholds.validate()?;
        let workbook = Loader::with_options(self.load_options.clone()).load(bytes, source_name)?;
        self.analyze_workbook(&workbook)
    }

    /// Analyzes a file on disk.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, otherwise as [`Analyzer::analyze`].
    pub fn analyze_path(&self, path: impl AsRef<Path>) -> Result<AnalysisResult> {
        self.thresholds.validate()?;
        let workbook = Loader::with_options(self.load_options.clone()).load_path(path)?;
        self.analyze_workbook(&workbook)
    }

    /// Analyzes an already loaded workbook.
    ///
    /// # Errors
    ///
    /// `NoUsableData` when no sheet yields a table.
    pub fn analyze_workbook(&self, workbook: &Workbook) -> Result<AnalysisResult> {
        let started = Instant::now();

        let outcomes: Vec<SheetOutcome> = workbook
            .sheets
            .par_iter()
            .map(|sheet| self.analyze_sheet(sheet))
            .collect();

        let mut regions = Vec::new();
        let mut tables = Vec::new();
        let mut upstream = workbook.warnings.clone();
        for outcome in outcomes {
            regions.extend(outcome.regions);
            tables.extend(outcome.table);
            upstream.extend(outcome.warnings);
        }
        if tables.is_empty() {
            return Err(Error::no_usable_data(workbook.sheets.len())
                .with_context(ErrorContext::new().with_source(workbook.source_name.clone())));
        }

        let extraction = EntityExtractor::new(&self.thresholds).extract(&tables);
        upstream.extend(extraction.warnings);
        let entities = extraction.entities;

        let mut relationships =
            RelationshipFinder::new(&self.thresholds).find(&entities, &extraction.values);

        let context = WorkbookContext::from_entities(&entities);
        let sites = formula_sites(workbook);
        let translation = FormulaTranslator::new(&self.thresholds).translate_all(&sites, &context);
        // One relationship per source column across foreign keys and formula references.
        relationships.extend(translation.relationships);
        let mut relationships = deduplicate(relationships);
        renumber(&mut relationships, 1);
        let rules = translation.rules;

        let score = Validator::new(&self.thresholds).score(
            &entities,
            &relationships,
            &rules,
            &regions,
            &upstream,
        );

        info!(
            source = %workbook.source_name,
            entities = entities.len(),
            relationships = relationships.len(),
            rules = rules.len(),
            overall = score.overall,
            elapsed_ms = started.elapsed().as_millis(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            source_file: workbook.source_name.clone(),
            format: workbook.format,
            sheets: workbook.sheets.iter().map(|s| s.name.clone()).collect(),
            regions,
            entities,
            relationships,
            rules,
            score,
            generated_at: Utc::now(),
        })
    }

    /// Detects regions on one sheet and normalizes the best one.
    fn analyze_sheet(&self, sheet: &RawSheet) -> SheetOutcome {
        let regions = RegionDetector::new(&self.thresholds).detect(sheet);
        let Some(primary) = regions.first() else {
            let reason = Error::no_region_detected(&sheet.name);
            warn!(sheet = %sheet.name, "{reason}");
            return SheetOutcome {
                warnings: vec![
                    Warning::medium(format!("{reason}; the sheet was skipped"))
                        .with_suggestion("put the data in a table with a header row"),
                ],
                ..SheetOutcome::default()
            };
        };

        let table = normalize(primary, sheet, &self.thresholds);
        if table.columns.is_empty() || table.row_count() == 0 {
            debug!(sheet = %sheet.name, "best region normalized to an empty table");
            return SheetOutcome {
                warnings: vec![Warning::medium(format!(
                    "{}; the sheet was skipped",
                    Error::no_region_detected(&sheet.name)
                ))],
                regions,
                table: None,
            };
        }
        debug!(
            sheet = %sheet.name,
            regions = regions.len(),
            columns = table.columns.len(),
            rows = table.row_count(),
            "normalized sheet"
        );
        SheetOutcome {
            regions,
            table: Some(table),
            warnings: Vec::new(),
        }
    }
}

/// Every formula cell in the workbook, in sheet then row-major order.
#[must_use]
pub fn formula_sites(workbook: &Workbook) -> Vec<FormulaSite> {
    workbook
        .sheets
        .iter()
        .flat_map(|sheet| {
            sheet
                .formulas()
                .map(|f| FormulaSite::new(sheet.name.clone(), f.row, f.col, f.formula))
        })
        .collect()
}
