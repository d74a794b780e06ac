//! Raw joint-table format (`.inp`).
//!
//! ```text
//! variables: Sickness, Test   # optional, defaults to A, B, ...
//! 00: 0.9306
//! 01: 0.0594
//! 10: 0.0005
//! 11: 0.0095
//! ```

use probs_common::format::{strip_comment, strip_variables_header};
use probs_common::FileFormatError;
use probs_config::EngineConfig;
use probs_math::{approx_eq, normalize_within, stable_sum};
use std::collections::HashSet;

use crate::catalog::{default_names, is_identifier, VariableCatalog};
use crate::distribution::JointDistribution;

struct Entry {
    line: usize,
    pattern: String,
    value: f64,
}

/// Parse a probability value in `[0, 1]`.
pub(crate) fn parse_probability(line: usize, raw: &str) -> Result<f64, FileFormatError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && (0.0..=1.0).contains(p))
        .ok_or_else(|| FileFormatError::InvalidProbabilityValue {
            line,
            value: raw.trim().to_string(),
        })
}

pub(crate) fn split_names(line: usize, raw: &str) -> Result<Vec<String>, FileFormatError> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !is_identifier(name) {
            return Err(FileFormatError::InvalidDeclaration {
                line,
                message: format!("invalid variable name '{}'", name),
            });
        }
        if !seen.insert(name) {
            return Err(FileFormatError::DuplicateVariable {
                line,
                name: name.to_string(),
            });
        }
        names.push(name.to_string());
    }
    Ok(names)
}

/// Parse and normalize a joint table.
///
/// `names` overrides the header; a count mismatch in either falls back to the
/// default names.
pub fn parse(
    text: &str,
    names: Option<&[String]>,
    config: &EngineConfig,
) -> Result<JointDistribution, FileFormatError> {
    let mut header: Option<Vec<String>> = None;
    let mut entries: Vec<Entry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let Some(content) = strip_comment(raw) else {
            continue;
        };

        if let Some(rest) = strip_variables_header(content) {
            if header.is_some() {
                return Err(FileFormatError::Syntax {
                    line,
                    message: "duplicate 'variables:' header".to_string(),
                });
            }
            header = Some(split_names(line, rest)?);
            continue;
        }

        let (pattern, value) =
            content
                .split_once(':')
                .ok_or_else(|| FileFormatError::Syntax {
                    line,
                    message: format!("expected '<pattern>: <probability>', got '{}'", content),
                })?;
        let pattern = pattern.trim();

        if pattern.is_empty() || !pattern.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(FileFormatError::InvalidPattern {
                line,
                pattern: pattern.to_string(),
            });
        }
        if let Some(first) = entries.first() {
            if pattern.len() != first.pattern.len() {
                return Err(FileFormatError::InconsistentPatternLength {
                    line,
                    expected: first.pattern.len(),
                    found: pattern.len(),
                });
            }
        }
        let value = parse_probability(line, value)?;
        if !seen.insert(pattern.to_string()) {
            return Err(FileFormatError::DuplicatePattern {
                line,
                pattern: pattern.to_string(),
            });
        }
        entries.push(Entry {
            line,
            pattern: pattern.to_string(),
            value,
        });
    }

    let width = match entries.first() {
        Some(first) => first.pattern.len(),
        None => return Err(FileFormatError::NoEntries),
    };

    let names = choose_names(width, names, header.as_deref());
    let catalog = VariableCatalog::boolean(&names, config.max_assignment_space)?;
    let size = catalog.size();

    let mut probs = vec![0.0; size];
    let mut present = vec![false; size];
    for entry in &entries {
        let linear = usize::from_str_radix(&entry.pattern, 2).map_err(|_| {
            FileFormatError::InvalidPattern {
                line: entry.line,
                pattern: entry.pattern.clone(),
            }
        })?;
        probs[linear] = entry.value;
        present[linear] = true;
    }

    let missing = size - entries.len();
    match missing {
        0 => {}
        1 => {
            let given = stable_sum(&probs);
            let residual = 1.0 - given;
            if residual < -config.tolerances.sum {
                return Err(FileFormatError::NegativeResidual {
                    sum: given,
                    residual,
                });
            }
            if let Some(slot) = present.iter().position(|p| !p) {
                tracing::debug!(
                    pattern = %pattern_of(slot, width),
                    inferred = residual.max(0.0),
                    "inferred the single missing entry"
                );
                probs[slot] = residual.max(0.0);
            }
        }
        n => {
            tracing::debug!(missing = n, "sparse table; missing entries set to zero");
        }
    }

    normalize_table(&mut probs, config)?;
    Ok(JointDistribution::from_parts(catalog, probs))
}

fn pattern_of(linear: usize, width: usize) -> String {
    format!("{:0width$b}", linear, width = width)
}

fn choose_names(width: usize, names: Option<&[String]>, header: Option<&[String]>) -> Vec<String> {
    match names.or(header) {
        Some(given) if given.len() == width => given.to_vec(),
        Some(given) => {
            tracing::warn!(
                expected = width,
                got = given.len(),
                "variable name count does not match pattern width; using default names"
            );
            default_names(width)
        }
        None => default_names(width),
    }
}

/// Rescale when the total is within the normalization band, otherwise reject.
fn normalize_table(probs: &mut [f64], config: &EngineConfig) -> Result<(), FileFormatError> {
    let total = normalize_within(probs, config.tolerances.normalization_band).map_err(|total| {
        if total > 1.0 {
            FileFormatError::SumExceedsTolerance { sum: total }
        } else {
            FileFormatError::SumBelowTolerance { sum: total }
        }
    })?;
    if !approx_eq(total, 1.0, config.tolerances.sum) {
        tracing::warn!(sum = total, "joint probabilities auto-normalized to 1");
    }
    Ok(())
}
