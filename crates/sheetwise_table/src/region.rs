//! Data region detection.
//!
//! A region is a header row plus the rectangular block of records beneath
//! it. Every row is scored as a header candidate from six weighted signals;
//! candidates above the threshold grow into regions, and the best region per
//! sheet becomes the primary one.

use serde::{Deserialize, Serialize};
use sheetwise_foundation::naming::{generated_column_name, snake_case};
use sheetwise_foundation::{DetectionThresholds, PrimitiveKind};
use sheetwise_loader::RawSheet;
use tracing::debug;

/// Words that make a row look like a header.
pub const HEADER_KEYWORDS: &[&str] = &[
    "id", "name", "date", "total", "status", "type", "code", "description", "qty", "quantity",
    "price", "amount", "email", "phone", "address", "category", "number", "no", "count", "sku",
    "title", "created", "updated", "cost", "value", "unit", "supplier", "customer", "order",
];

/// Style signal for sheets without style hints, neither for nor against a row.
const NEUTRAL_STYLE: f64 = 0.5;

/// Labels in the first two cells of a row that, next to values, end a region.
pub const SUMMARY_KEYWORDS: &[&str] = &[
    "grand total",
    "subtotal",
    "total",
    "summary",
    "average",
    "count",
];

/// A rectangular table found on a sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataRegion {
    /// Sheet the region was found on.
    pub sheet: String,
    /// Header row index.
    pub header_row: usize,
    /// First record row.
    pub data_start_row: usize,
    /// Last record row, inclusive.
    pub data_end_row: usize,
    /// First column, inclusive.
    pub start_col: usize,
    /// Last column, inclusive.
    pub end_col: usize,
    /// Header text per column; generated for blank header cells.
    pub column_names: Vec<String>,
    /// Quality in [0, 1].
    pub quality: f64,
    /// Header candidate score of the header row.
    pub header_score: f64,
    /// True when no header was found and the first row is a pseudo-header.
    pub pseudo_header: bool,
    /// Problems noticed while building the region.
    pub warnings: Vec<String>,
}

impl DataRegion {
    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    /// Number of rows in the data block.
    #[must_use]
    pub fn data_rows(&self) -> usize {
        self.data_end_row - self.data_start_row + 1
    }

    /// Rows holding records. A pseudo-header row is itself a record.
    #[must_use]
    pub fn record_rows(&self) -> std::ops::RangeInclusive<usize> {
        if self.pseudo_header {
            self.header_row..=self.data_end_row
        } else {
            self.data_start_row..=self.data_end_row
        }
    }

    /// True if the cell lies inside the region, header included.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.header_row
            && row <= self.data_end_row
            && col >= self.start_col
            && col <= self.end_col
    }

    fn overlaps(&self, row: usize, start_col: usize, end_col: usize) -> bool {
        row >= self.header_row
            && row <= self.data_end_row
            && start_col <= self.end_col
            && end_col >= self.start_col
    }
}

/// The six header signals of one row, each in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeaderSignals {
    /// Earlier rows score higher.
    pub position: f64,
    /// Share of text cells.
    pub text_ratio: f64,
    /// Share of non-empty cells over the span.
    pub fill_ratio: f64,
    /// Share of bold cells, or 0.5 when the sheet carries no style hints.
    pub style: f64,
    /// 1.0 if any cell holds a header keyword.
    pub keywords: f64,
    /// Share of columns whose next rows agree on one kind.
    pub consistency: f64,
}

/// Finds data regions on raw sheets.
#[derive(Clone, Copy, Debug)]
pub struct RegionDetector<'a> {
    thresholds: &'a DetectionThresholds,
}

impl<'a> RegionDetector<'a> {
    /// Creates a detector using the given thresholds.
    #[must_use]
    pub fn new(thresholds: &'a DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Detects regions on a sheet, best first.
    ///
    /// Falls back to a pseudo-header region when no row qualifies as a
    /// header. Returns an empty list for sheets with fewer than two
    /// populated rows and no header.
    #[must_use]
    pub fn detect(&self, sheet: &RawSheet) -> Vec<DataRegion> {
        let mut regions: Vec<DataRegion> = Vec::new();

        for row in 0..sheet.height() {
            let Some((first, last)) = sheet.row_span(row) else {
                continue;
            };
            if regions.iter().any(|r| r.overlaps(row, first, last)) {
                continue;
            }
            if is_summary_row(sheet, row, first, last) || self.is_title_row(sheet, row, first, last)
            {
                debug!(sheet = %sheet.name, row, "skipping title or summary row");
                continue;
            }
            let signals = self.header_signals(sheet, row);
            // Headers name columns, so a row without text never qualifies.
            if signals.text_ratio < f64::EPSILON {
                continue;
            }
            let score = self.weighted(&signals);
            if score <= self.thresholds.header_candidate {
                continue;
            }
            if let Some(region) = self.build_region(sheet, row, first, last, score) {
                debug!(
                    sheet = %sheet.name,
                    header_row = row,
                    score,
                    quality = region.quality,
                    "header candidate produced a region"
                );
                regions.push(region);
            }
        }

        if regions.is_empty() {
            regions.extend(self.fallback_region(sheet));
        }

        // Stable sort keeps sheet order among equal qualities.
        regions.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        regions
    }

    /// Weighted header score of a row.
    #[must_use]
    pub fn header_score(&self, sheet: &RawSheet, row: usize) -> f64 {
        self.weighted(&self.header_signals(sheet, row))
    }

    fn weighted(&self, s: &HeaderSignals) -> f64 {
        let w = &self.thresholds.header_weights;
        w.position * s.position
            + w.text_ratio * s.text_ratio
            + w.fill_ratio * s.fill_ratio
            + w.style * s.style
            + w.keywords * s.keywords
            + w.consistency * s.consistency
    }

    /// Computes the six header signals of a row.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn header_signals(&self, sheet: &RawSheet, row: usize) -> HeaderSignals {
        let Some((first, last)) = sheet.row_span(row) else {
            return HeaderSignals::default();
        };
        let cells = &sheet.row(row)[first..=last];
        let non_empty: Vec<_> = cells.iter().filter(|c| !c.is_empty()).collect();
        let populated = non_empty.len() as f64;

        let window = self.thresholds.header_position_window.max(1) as f64;
        let position = (1.0 - row as f64 / window).max(0.0);
        let text_ratio = non_empty
            .iter()
            .filter(|c| c.kind() == PrimitiveKind::Text)
            .count() as f64
            / populated;
        let fill_ratio = populated / cells.len() as f64;
        let style = if sheet.has_style_hints() {
            non_empty.iter().filter(|c| c.style.bold).count() as f64 / populated
        } else {
            NEUTRAL_STYLE
        };
        let keywords = if non_empty
            .iter()
            .filter_map(|c| c.value.as_text())
            .any(has_header_keyword)
        {
            1.0
        } else {
            0.0
        };
        let consistency = self.consistency(sheet, row, first, last);

        HeaderSignals {
            position,
            text_ratio,
            fill_ratio,
            style,
            keywords,
            consistency,
        }
    }

    /// Share of columns whose next `consistency_window` cells mostly share one kind.
    #[allow(clippy::cast_precision_loss)]
    fn consistency(&self, sheet: &RawSheet, row: usize, first: usize, last: usize) -> f64 {
        let below = row + 1..=row + self.thresholds.consistency_window;
        let mut consistent = 0usize;
        for col in first..=last {
            let mut counts = [0usize; 6];
            let mut total = 0usize;
            for r in below.clone() {
                let kind = sheet.cell(r, col).kind();
                if kind != PrimitiveKind::Empty {
                    counts[kind as usize] += 1;
                    total += 1;
                }
            }
            let top = counts.iter().copied().max().unwrap_or(0);
            if total > 0 && top as f64 / total as f64 >= self.thresholds.consistency_ratio {
                consistent += 1;
            }
        }
        consistent as f64 / (last - first + 1) as f64
    }

    /// Title banners: every populated cell sits in a horizontally merged
    /// range, or a lone text cell sits above a wider all-text row.
    fn is_title_row(&self, sheet: &RawSheet, row: usize, first: usize, last: usize) -> bool {
        let populated: Vec<usize> = (first..=last)
            .filter(|&c| !sheet.cell(row, c).is_empty())
            .collect();
        let all_merged = populated.iter().all(|&c| {
            sheet
                .merged_range(row, c)
                .is_some_and(|m| m.spans_columns())
        });
        if all_merged {
            return true;
        }
        if populated.len() != 1 || sheet.cell(row, populated[0]).kind() != PrimitiveKind::Text {
            return false;
        }
        let next = (row + 1..sheet.height().min(row + 1 + self.thresholds.empty_row_run))
            .find_map(|r| sheet.row_span(r).map(|span| (r, span)));
        next.is_some_and(|(r, (f, l))| {
            let kinds: Vec<PrimitiveKind> = (f..=l)
                .map(|c| sheet.cell(r, c).kind())
                .filter(|k| *k != PrimitiveKind::Empty)
                .collect();
            kinds.len() > 1 && kinds.iter().all(|k| *k == PrimitiveKind::Text)
        })
    }

    fn build_region(
        &self,
        sheet: &RawSheet,
        header_row: usize,
        start_col: usize,
        end_col: usize,
        header_score: f64,
    ) -> Option<DataRegion> {
        let data_end_row = self.terminal_row(sheet, header_row, start_col, end_col)?;
        let mut generated = 0usize;
        let column_names = (start_col..=end_col)
            .map(|c| {
                let value = sheet.value(header_row, c);
                if value.is_empty() {
                    generated += 1;
                    generated_column_name(c)
                } else {
                    value.key()
                }
            })
            .collect();

        let mut region = DataRegion {
            sheet: sheet.name.clone(),
            header_row,
            data_start_row: header_row + 1,
            data_end_row,
            start_col,
            end_col,
            column_names,
            quality: 1.0,
            header_score,
            pseudo_header: false,
            warnings: Vec::new(),
        };
        self.score_quality(sheet, &mut region, generated);
        Some(region)
    }

    /// Last record row below `header_row`, or `None` if there is none.
    ///
    /// Scanning stops at a run of `empty_row_run` empty rows, or at a
    /// summary row such as `Total,30`.
    fn terminal_row(
        &self,
        sheet: &RawSheet,
        header_row: usize,
        start_col: usize,
        end_col: usize,
    ) -> Option<usize> {
        let run_limit = self.thresholds.empty_row_run.max(1);
        let mut last_populated = None;
        let mut empty_run = 0usize;
        for row in header_row + 1..sheet.height() {
            if sheet.is_row_empty(row, start_col, end_col) {
                empty_run += 1;
                if empty_run >= run_limit {
                    break;
                }
                continue;
            }
            empty_run = 0;
            if is_summary_row(sheet, row, start_col, end_col) {
                break;
            }
            last_populated = Some(row);
        }
        last_populated
    }

    #[allow(clippy::cast_precision_loss)]
    fn score_quality(&self, sheet: &RawSheet, region: &mut DataRegion, generated: usize) {
        let mut quality = 1.0;
        let width = region.width();

        let mut seen = std::collections::HashSet::new();
        let duplicates: Vec<&String> = region
            .column_names
            .iter()
            .filter(|n| !seen.insert(snake_case(n)))
            .collect();
        if !duplicates.is_empty() {
            quality -= 0.2;
            region.warnings.push(format!(
                "duplicate column names: {}",
                duplicates
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if generated > 0 {
            quality -= 0.1 * generated as f64 / width as f64;
            region
                .warnings
                .push(format!("{generated} column(s) have no header text"));
        }

        let cells = region.data_rows() * width;
        let filled = (region.data_start_row..=region.data_end_row)
            .flat_map(|r| (region.start_col..=region.end_col).map(move |c| (r, c)))
            .filter(|&(r, c)| !sheet.cell(r, c).is_empty())
            .count();
        let density = filled as f64 / cells as f64;
        if density < 0.3 {
            quality -= 0.3;
            region
                .warnings
                .push(format!("sparse region: {:.0}% of cells filled", density * 100.0));
        } else if density < 0.5 {
            quality -= 0.1;
        }

        if region.data_rows() < 2 {
            quality -= 0.3;
        }
        if width < 2 {
            quality -= 0.2;
        }
        region.quality = f64::clamp(quality, 0.0, 1.0);
    }

    /// Treats the first populated row as a pseudo-header with generated names.
    fn fallback_region(&self, sheet: &RawSheet) -> Option<DataRegion> {
        let header_row = (0..sheet.height()).find(|&r| sheet.row_span(r).is_some())?;
        let last_col = sheet.width().checked_sub(1)?;
        let data_end_row = self.terminal_row(sheet, header_row, 0, last_col)?;

        let (start_col, end_col) = (header_row..=data_end_row)
            .filter_map(|r| sheet.row_span(r))
            .fold((usize::MAX, 0), |(lo, hi), (f, l)| (lo.min(f), hi.max(l)));

        let mut region = DataRegion {
            sheet: sheet.name.clone(),
            header_row,
            data_start_row: header_row + 1,
            data_end_row,
            start_col,
            end_col,
            column_names: (start_col..=end_col).map(generated_column_name).collect(),
            quality: 1.0,
            header_score: self.header_score(sheet, header_row),
            pseudo_header: true,
            warnings: vec!["no header row detected; using generated column names".to_string()],
        };
        self.score_quality(sheet, &mut region, 0);
        region.quality = region.quality.min(self.thresholds.fallback_quality_cap);
        debug!(sheet = %sheet.name, header_row, "using pseudo-header region");
        Some(region)
    }
}

fn has_header_keyword(text: &str) -> bool {
    snake_case(text)
        .split('_')
        .any(|word| HEADER_KEYWORDS.contains(&word))
}

/// A summary keyword in the first two cells followed by at least one
/// non-text value. All-text rows such as `Total Sales,Region` stay headers.
fn is_summary_row(sheet: &RawSheet, row: usize, start_col: usize, end_col: usize) -> bool {
    let labeled = (start_col..=end_col.min(start_col + 1)).any(|c| {
        sheet
            .value(row, c)
            .as_text()
            .is_some_and(is_summary_label)
    });
    labeled
        && (start_col..=end_col).any(|c| {
            !matches!(
                sheet.cell(row, c).kind(),
                PrimitiveKind::Empty | PrimitiveKind::Text
            )
        })
}

fn is_summary_label(text: &str) -> bool {
    let label = text.trim().trim_end_matches(':').to_lowercase();
    SUMMARY_KEYWORDS.iter().any(|k| {
        label == *k
            || label
                .strip_prefix(k)
                .is_some_and(|rest| rest.starts_with(' '))
    })
}
