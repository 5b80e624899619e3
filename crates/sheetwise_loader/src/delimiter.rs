//! Delimiter detection by per-line frequency analysis.

use std::collections::HashMap;

/// Delimiters considered, in tie-break order.
pub const CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Picks the delimiter whose per-line count is most consistent.
///
/// Each candidate is counted outside double quotes on the first
/// `sample_lines` non-empty lines. Its score is the share of lines whose
/// count equals the modal count, times the modal count capped at 10.
/// Comma wins ties and is returned when no candidate occurs at all.
#[must_use]
pub fn detect_delimiter(text: &str, sample_lines: usize) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(sample_lines.max(1))
        .collect();
    if lines.is_empty() {
        return b',';
    }

    let mut best = (b',', 0.0_f64);
    for &candidate in &CANDIDATES {
        let score = score(&lines, candidate);
        if score > best.1 {
            best = (candidate, score);
        }
    }
    best.0
}

#[allow(clippy::cast_precision_loss)]
fn score(lines: &[&str], delimiter: u8) -> f64 {
    let counts: Vec<usize> = lines
        .iter()
        .map(|l| count_unquoted(l, delimiter))
        .collect();

    let mut frequency: HashMap<usize, usize> = HashMap::new();
    for &c in &counts {
        *frequency.entry(c).or_default() += 1;
    }
    // Highest frequency, larger count on ties.
    let Some((&mode, &agreeing)) = frequency
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)))
    else {
        return 0.0;
    };
    if mode == 0 {
        return 0.0;
    }
    let consistency = agreeing as f64 / counts.len() as f64;
    consistency * mode.min(10) as f64
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &b in line.as_bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}
