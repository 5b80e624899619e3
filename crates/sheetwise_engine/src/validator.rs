//! Confidence scoring and warning collection.
//!
//! The validator reads the finished analysis and reports how far to trust
//! it. It never changes entities, relationships or rules.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use sheetwise_foundation::{DetectionThresholds, Severity, Warning};
use sheetwise_formula::{AutomationRule, RuleType};
use sheetwise_schema::{Entity, Relationship, missing_key_warning};
use sheetwise_table::DataRegion;
use tracing::debug;

/// Score used for a dimension with nothing to measure.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Overall and per-dimension confidence plus review warnings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Weighted blend of structure, entities and relationships.
    pub overall: f64,
    /// Mean quality of the best region on each sheet.
    pub structure: f64,
    /// Mean entity confidence.
    pub entities: f64,
    /// Mean relationship confidence; neutral without relationships.
    pub relationships: f64,
    /// Mean rule confidence; neutral without rules. Not part of `overall`.
    pub formulas: f64,
    /// Findings for review, most severe first.
    pub warnings: Vec<Warning>,
}

impl ConfidenceScore {
    /// Number of warnings at or above a severity.
    #[must_use]
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.warnings.iter().filter(|w| w.severity >= severity).count()
    }
}

/// Computes [`ConfidenceScore`]s.
#[derive(Debug)]
pub struct Validator<'a> {
    thresholds: &'a DetectionThresholds,
}

impl<'a> Validator<'a> {
    /// Creates a validator.
    #[must_use]
    pub const fn new(thresholds: &'a DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Scores an analysis.
    ///
    /// `regions` holds every candidate region found, best first within each
    /// sheet. `upstream` carries warnings from earlier stages; they are kept
    /// and merged with the validator's own, duplicates removed.
    #[must_use]
    pub fn score(
        &self,
        entities: &[Entity],
        relationships: &[Relationship],
        rules: &[AutomationRule],
        regions: &[DataRegion],
        upstream: &[Warning],
    ) -> ConfidenceScore {
        let by_sheet = group_by_sheet(regions);
        let structure = mean(by_sheet.values().map(|r| r[0].quality)).unwrap_or(0.0);
        let entity_score = mean(entities.iter().map(|e| e.confidence)).unwrap_or(0.0);
        let relationship_score =
            mean(relationships.iter().map(|r| r.confidence)).unwrap_or(NEUTRAL_SCORE);
        let formulas = mean(rules.iter().map(|r| r.confidence)).unwrap_or(NEUTRAL_SCORE);

        let w = &self.thresholds.overall_weights;
        let overall = (w.structure * structure
            + w.entities * entity_score
            + w.relationships * relationship_score)
            .clamp(0.0, 1.0);

        let mut warnings = upstream.to_vec();
        self.region_warnings(&by_sheet, &mut warnings);
        self.entity_warnings(entities, relationships, &mut warnings);
        self.rule_warnings(rules, &mut warnings);
        let warnings = finalize(warnings);

        debug!(
            overall,
            structure,
            entities = entity_score,
            relationships = relationship_score,
            formulas,
            warnings = warnings.len(),
            "scored analysis"
        );
        ConfidenceScore {
            overall,
            structure,
            entities: entity_score,
            relationships: relationship_score,
            formulas,
            warnings,
        }
    }

    // =========================================================================
    // Warning sources
    // =========================================================================

    #[allow(clippy::unused_self)]
    fn region_warnings(&self, by_sheet: &BTreeMap<&str, Vec<&DataRegion>>, out: &mut Vec<Warning>) {
        for (sheet, regions) in by_sheet {
            if regions.len() > 1 {
                out.push(
                    Warning::medium(format!(
                        "sheet '{sheet}' has {} candidate tables; only the best one was used",
                        regions.len()
                    ))
                    .with_suggestion("split the tables onto separate sheets"),
                );
            }
            let primary = regions[0];
            if primary.pseudo_header {
                out.push(
                    Warning::medium(format!(
                        "sheet '{sheet}' has no header row; column names were generated"
                    ))
                    .with_suggestion("add a header row naming each column"),
                );
            } else {
                for note in &primary.warnings {
                    out.push(Warning::low(format!("sheet '{sheet}': {note}")));
                }
            }
        }
    }

    fn entity_warnings(
        &self,
        entities: &[Entity],
        relationships: &[Relationship],
        out: &mut Vec<Warning>,
    ) {
        for entity in entities {
            if entity.primary_key.is_none() {
                out.push(missing_key_warning(&entity.id));
            }
            if entity.confidence < self.thresholds.low_confidence {
                out.push(
                    Warning::low(format!(
                        "entity '{}' has low confidence ({:.2})",
                        entity.id, entity.confidence
                    ))
                    .with_suggestion("review the column types and key")
                    .with_entity(entity.id.clone()),
                );
            }
        }

        let connected: HashSet<&str> = relationships
            .iter()
            .flat_map(|r| [r.from_entity.as_str(), r.to_entity.as_str()])
            .collect();
        let isolated: Vec<&Entity> = entities
            .iter()
            .filter(|e| !connected.contains(e.id.as_str()))
            .collect();
        if entities.len() >= 3 && isolated.len() > 1 {
            for entity in isolated {
                out.push(
                    Warning::low(format!("entity '{}' has no relationships", entity.id))
                        .with_suggestion("check for a missing foreign-key column")
                        .with_entity(entity.id.clone()),
                );
            }
        }
    }

    fn rule_warnings(&self, rules: &[AutomationRule], out: &mut Vec<Warning>) {
        for rule in rules {
            if rule.rule_type == RuleType::Formula {
                out.push(
                    Warning::low(format!(
                        "formula at {} was not recognized and needs manual handling",
                        rule.source.location
                    ))
                    .with_entity(rule.entity.clone()),
                );
            } else if rule.confidence < self.thresholds.low_confidence {
                out.push(
                    Warning::low(format!(
                        "rule '{}' has low confidence ({:.2})",
                        rule.id, rule.confidence
                    ))
                    .with_suggestion("confirm the referenced columns")
                    .with_entity(rule.entity.clone()),
                );
            }
        }
    }
}

fn group_by_sheet(regions: &[DataRegion]) -> BTreeMap<&str, Vec<&DataRegion>> {
    let mut by_sheet: BTreeMap<&str, Vec<&DataRegion>> = BTreeMap::new();
    for region in regions {
        by_sheet.entry(region.sheet.as_str()).or_default().push(region);
    }
    for list in by_sheet.values_mut() {
        list.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    }
    by_sheet
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Drops duplicates and orders by severity, most severe first.
fn finalize(warnings: Vec<Warning>) -> Vec<Warning> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Warning> = warnings
        .into_iter()
        .filter(|w| seen.insert((w.severity, w.message.clone(), w.entity.clone())))
        .collect();
    unique.sort_by(|a, b| b.severity.cmp(&a.severity));
    unique
}
