//! Bayesian-network format (`.net`).
//!
//! Two declaration styles are accepted, and either block-header style may be
//! used with either of them:
//!
//! ```text
//! variables: Burglary, Alarm        variable Age {Child, Teen, Adult}
//! Burglary: None                    variable Car {Budget, Standard}
//! 1: 0.01                           Age <- None
//! Alarm: Burglary                   Child: 0.4
//! 0: 0.05                           Teen: 0.35
//! 1: 0.94                           Adult: 0.25
//!                                   Car <- (Age)
//!                                   (Budget | Child): 0.01
//!                                   (Standard | Child): 0.99
//!                                   ...
//! ```
//!
//! Boolean shorthand lines (`bits: p`) give `P(child = true | parents = bits)`
//! and the complement is derived. Bits map to each variable's designated
//! true/false states, so shorthand needs labels such as `0`/`1` or `No`/`Yes`. Full-notation lines
//! (`(state | parent states): p`) must cover every row exactly once and each
//! row must sum to 1.

use probs_common::format::{strip_comment, strip_variables_header, VARIABLE_KEYWORD};
use probs_common::FileFormatError;
use probs_config::EngineConfig;
use probs_math::{approx_eq, stable_sum};
use std::collections::HashMap;

use super::cpt::{CptNode, Network};
use super::joint_table::{parse_probability, split_names};
use crate::catalog::{is_identifier, Variable, VariableCatalog};
use crate::distribution::JointDistribution;

struct CptLine<'a> {
    line: usize,
    key: &'a str,
    value: &'a str,
}

struct Block<'a> {
    child: usize,
    parents: Vec<usize>,
    header_line: usize,
    lines: Vec<CptLine<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notation {
    Full,
    Shorthand,
}

#[derive(Default)]
struct Declarations {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl Declarations {
    fn declare(&mut self, line: usize, variable: Variable) -> Result<(), FileFormatError> {
        if self.index.contains_key(variable.name()) {
            return Err(FileFormatError::DuplicateVariable {
                line,
                name: variable.name().to_string(),
            });
        }
        self.index
            .insert(variable.name().to_string(), self.variables.len());
        self.variables.push(variable);
        Ok(())
    }

    fn lookup(&self, line: usize, name: &str) -> Result<usize, FileFormatError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| FileFormatError::UnknownVariable {
                line,
                name: name.to_string(),
            })
    }
}

/// Parse, expand and optionally rename a network.
pub fn parse(
    text: &str,
    names: Option<&[String]>,
    config: &EngineConfig,
) -> Result<JointDistribution, FileFormatError> {
    let network = parse_network(text, config)?;
    let count = network.catalog().len();
    let mut dist = network.expand(config)?;
    match names {
        Some(names) if names.len() == count => dist.catalog_mut().rename(names)?,
        Some(names) => tracing::warn!(
            expected = count,
            got = names.len(),
            "variable name count does not match the network; keeping declared names"
        ),
        None => {}
    }
    Ok(dist)
}

/// Parse network text into its CPT graph without expanding it.
pub fn parse_network(text: &str, config: &EngineConfig) -> Result<Network, FileFormatError> {
    let mut decls = Declarations::default();
    let mut blocks: Vec<Block<'_>> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let Some(content) = strip_comment(raw) else {
            continue;
        };

        if let Some(rest) = strip_variables_header(content) {
            ensure_declaring(line, &blocks)?;
            for name in split_names(line, rest)? {
                decls.declare(line, Variable::boolean(name))?;
            }
            continue;
        }

        if let Some(variable) = parse_declaration(line, content)? {
            ensure_declaring(line, &blocks)?;
            decls.declare(line, variable)?;
            continue;
        }

        if decls.variables.is_empty() {
            return Err(FileFormatError::HeaderMissing);
        }

        if let Some((child, parents)) = parse_header(line, content, &decls)? {
            if blocks.iter().any(|b| b.child == child) {
                return Err(FileFormatError::DuplicateVariable {
                    line,
                    name: decls.variables[child].name().to_string(),
                });
            }
            blocks.push(Block {
                child,
                parents,
                header_line: line,
                lines: Vec::new(),
            });
            continue;
        }

        let Some(block) = blocks.last_mut() else {
            return Err(FileFormatError::Syntax {
                line,
                message: format!("'{}' is not a block header and no block is open", content),
            });
        };
        let (key, value) = content
            .split_once(':')
            .ok_or_else(|| FileFormatError::Syntax {
                line,
                message: format!("expected '<entry>: <probability>', got '{}'", content),
            })?;
        block.lines.push(CptLine {
            line,
            key: key.trim(),
            value: value.trim(),
        });
    }

    if decls.variables.is_empty() {
        return Err(FileFormatError::HeaderMissing);
    }

    let catalog = VariableCatalog::new(decls.variables, config.max_assignment_space)?;
    for variable in catalog.variables() {
        if !blocks.iter().any(|b| b.child == variable.index()) {
            return Err(FileFormatError::MissingCpt {
                variable: variable.name().to_string(),
            });
        }
    }

    let nodes = blocks
        .iter()
        .map(|block| build_node(block, &catalog, config))
        .collect::<Result<Vec<_>, _>>()?;
    let network = Network::new(catalog, nodes)?;
    tracing::debug!(variables = network.catalog().len(), "parsed network");
    Ok(network)
}

fn ensure_declaring(line: usize, blocks: &[Block<'_>]) -> Result<(), FileFormatError> {
    if blocks.is_empty() {
        Ok(())
    } else {
        Err(FileFormatError::InvalidDeclaration {
            line,
            message: "variables must be declared before the first CPT block".to_string(),
        })
    }
}

/// `variable Name` or `variable Name {S1, S2, ...}`.
fn parse_declaration(line: usize, content: &str) -> Result<Option<Variable>, FileFormatError> {
    let Some(rest) = content.strip_prefix(VARIABLE_KEYWORD) else {
        return Ok(None);
    };
    if !rest.starts_with(char::is_whitespace) || content.contains("<-") || content.contains(':') {
        return Ok(None);
    }
    let rest = rest.trim();

    let (name, states) = match rest.find('{') {
        Some(open) => {
            let body = rest[open + 1..]
                .trim_end()
                .strip_suffix('}')
                .ok_or_else(|| FileFormatError::InvalidDeclaration {
                    line,
                    message: "missing closing '}'".to_string(),
                })?;
            let mut states: Vec<String> = Vec::new();
            for state in body.split(',').map(str::trim) {
                if state.is_empty() {
                    return Err(FileFormatError::InvalidDeclaration {
                        line,
                        message: "empty state label".to_string(),
                    });
                }
                if states.iter().any(|s| s == state) {
                    return Err(FileFormatError::InvalidDeclaration {
                        line,
                        message: format!("state '{}' listed twice", state),
                    });
                }
                states.push(state.to_string());
            }
            if states.len() < 2 {
                return Err(FileFormatError::InvalidDeclaration {
                    line,
                    message: "a variable needs at least two states".to_string(),
                });
            }
            (rest[..open].trim(), states)
        }
        None => (rest, vec!["0".to_string(), "1".to_string()]),
    };

    if !is_identifier(name) {
        return Err(FileFormatError::InvalidDeclaration {
            line,
            message: format!("invalid variable name '{}'", name),
        });
    }
    Ok(Some(Variable::new(name, states)))
}

/// `None`, empty, `P1, P2` or `(P1, P2)`.
fn parent_names(raw: &str) -> Vec<&str> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    let raw = raw
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(raw);
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn resolve_parents(
    line: usize,
    child: usize,
    names: &[&str],
    decls: &Declarations,
) -> Result<Vec<usize>, FileFormatError> {
    let mut parents = Vec::with_capacity(names.len());
    for name in names {
        let parent = decls.lookup(line, name)?;
        if parents.contains(&parent) {
            return Err(FileFormatError::InvalidDeclaration {
                line,
                message: format!(
                    "parent '{}' listed twice for '{}'",
                    name,
                    decls.variables[child].name()
                ),
            });
        }
        parents.push(parent);
    }
    Ok(parents)
}

/// A block header, or `None` when the line is a CPT entry.
///
/// `L: R` is a header only when `L` is a declared variable and `R` is `None`,
/// empty, or a list of declared variables.
fn parse_header(
    line: usize,
    content: &str,
    decls: &Declarations,
) -> Result<Option<(usize, Vec<usize>)>, FileFormatError> {
    if let Some((left, right)) = content.split_once("<-") {
        let child = decls.lookup(line, left.trim())?;
        let parents = resolve_parents(line, child, &parent_names(right), decls)?;
        return Ok(Some((child, parents)));
    }

    let Some((left, right)) = content.split_once(':') else {
        return Ok(None);
    };
    let Some(&child) = decls.index.get(left.trim()) else {
        return Ok(None);
    };
    let names = parent_names(right);
    if !names.iter().all(|n| decls.index.contains_key(*n)) {
        return Ok(None);
    }
    let parents = resolve_parents(line, child, &names, decls)?;
    Ok(Some((child, parents)))
}

fn classify(block: &Block<'_>, child: &Variable) -> Result<Notation, FileFormatError> {
    if block.parents.is_empty() {
        let single_bit = block.lines.len() == 1 && matches!(block.lines[0].key, "0" | "1");
        return Ok(if single_bit && child.is_binary() {
            Notation::Shorthand
        } else {
            Notation::Full
        });
    }

    let Some(first) = block.lines.first() else {
        return Ok(Notation::Full);
    };
    let full = first.key.starts_with('(');
    if let Some(mixed) = block.lines.iter().find(|l| l.key.starts_with('(') != full) {
        return Err(FileFormatError::MixedCptNotation {
            line: mixed.line,
            variable: child.name().to_string(),
        });
    }
    Ok(if full {
        Notation::Full
    } else {
        Notation::Shorthand
    })
}

fn build_node(
    block: &Block<'_>,
    catalog: &VariableCatalog,
    config: &EngineConfig,
) -> Result<CptNode, FileFormatError> {
    let child = &catalog.variables()[block.child];
    let table = match classify(block, child)? {
        Notation::Full => full_table(block, catalog, config)?,
        Notation::Shorthand => shorthand_table(block, catalog)?,
    };
    Ok(CptNode {
        variable: block.child,
        parents: block.parents.clone(),
        table,
    })
}

fn row_count(block: &Block<'_>, catalog: &VariableCatalog) -> usize {
    block
        .parents
        .iter()
        .map(|&p| catalog.variables()[p].cardinality())
        .product()
}

fn unknown_state(line: usize, variable: &Variable, state: &str) -> FileFormatError {
    FileFormatError::Syntax {
        line,
        message: format!("unknown state '{}' for variable '{}'", state, variable.name()),
    }
}

/// `Parent=state, ...` for one CPT row.
fn describe_row(block: &Block<'_>, catalog: &VariableCatalog, mut row: usize) -> String {
    if block.parents.is_empty() {
        return "no parents".to_string();
    }
    let mut parts = Vec::with_capacity(block.parents.len());
    for &p in block.parents.iter().rev() {
        let parent = &catalog.variables()[p];
        let state = row % parent.cardinality();
        row /= parent.cardinality();
        parts.push(format!(
            "{}={}",
            parent.name(),
            parent.state_label(state).unwrap_or("?")
        ));
    }
    parts.reverse();
    parts.join(", ")
}

fn full_table(
    block: &Block<'_>,
    catalog: &VariableCatalog,
    config: &EngineConfig,
) -> Result<Vec<f64>, FileFormatError> {
    let child = &catalog.variables()[block.child];
    let cardinality = child.cardinality();
    let rows = row_count(block, catalog);
    let mut table = vec![0.0; rows * cardinality];
    let mut seen = vec![false; rows * cardinality];

    for entry in &block.lines {
        let inner = if entry.key.starts_with('(') {
            entry
                .key
                .strip_prefix('(')
                .and_then(|k| k.strip_suffix(')'))
                .ok_or_else(|| FileFormatError::Syntax {
                    line: entry.line,
                    message: format!("unbalanced parentheses in '{}'", entry.key),
                })?
        } else {
            entry.key
        };

        let (child_label, parent_labels): (&str, Vec<&str>) = match inner.split_once('|') {
            Some((c, p)) => (c.trim(), p.split(',').map(str::trim).collect()),
            None => (inner.trim(), Vec::new()),
        };
        if parent_labels.len() != block.parents.len() {
            return Err(FileFormatError::Syntax {
                line: entry.line,
                message: format!(
                    "expected {} parent state(s) for '{}', got {}",
                    block.parents.len(),
                    child.name(),
                    parent_labels.len()
                ),
            });
        }

        let state = child
            .resolve_state(child_label)
            .ok_or_else(|| unknown_state(entry.line, child, child_label))?;
        let mut row = 0;
        for (&p, label) in block.parents.iter().zip(&parent_labels) {
            let parent = &catalog.variables()[p];
            let s = parent
                .resolve_state(label)
                .ok_or_else(|| unknown_state(entry.line, parent, label))?;
            row = row * parent.cardinality() + s;
        }

        let value = parse_probability(entry.line, entry.value)?;
        let slot = row * cardinality + state;
        if seen[slot] {
            return Err(FileFormatError::DuplicateCptPattern {
                line: entry.line,
                variable: child.name().to_string(),
                pattern: entry.key.to_string(),
            });
        }
        seen[slot] = true;
        table[slot] = value;
    }

    let found = seen.iter().filter(|s| **s).count();
    if found != table.len() {
        return Err(FileFormatError::IncompleteCptCoverage {
            variable: child.name().to_string(),
            expected: table.len(),
            found,
        });
    }

    for (row, probs) in table.chunks(cardinality).enumerate() {
        let sum = stable_sum(probs);
        if !approx_eq(sum, 1.0, config.tolerances.sum) {
            return Err(FileFormatError::CptNotStochastic {
                variable: child.name().to_string(),
                context: describe_row(block, catalog, row),
                sum,
            });
        }
    }
    Ok(table)
}

fn shorthand_table(block: &Block<'_>, catalog: &VariableCatalog) -> Result<Vec<f64>, FileFormatError> {
    let child = &catalog.variables()[block.child];
    let mut defaults = Vec::with_capacity(block.parents.len() + 1);
    for v in std::iter::once(block.child).chain(block.parents.iter().copied()) {
        let variable = &catalog.variables()[v];
        let message = if !variable.is_binary() {
            format!(
                "shorthand CPT for '{}' needs two-state variables, but '{}' has {} states",
                child.name(),
                variable.name(),
                variable.cardinality()
            )
        } else if let Some(states) = variable.default_states() {
            defaults.push(states);
            continue;
        } else {
            format!(
                "shorthand CPT for '{}' needs true/false states, but '{}' is labelled {{{}}}",
                child.name(),
                variable.name(),
                variable.states().join(", ")
            )
        };
        return Err(FileFormatError::Syntax {
            line: block.header_line,
            message,
        });
    }
    let own = defaults[0];
    let parent_defaults = &defaults[1..];

    let rows = row_count(block, catalog);
    let mut table = vec![0.0; rows * 2];

    if block.parents.is_empty() {
        let entry = &block.lines[0];
        let value = parse_probability(entry.line, entry.value)?;
        let p_true = if entry.key == "1" { value } else { 1.0 - value };
        table[own.false_state] = 1.0 - p_true;
        table[own.true_state] = p_true;
        return Ok(table);
    }

    let mut seen = vec![false; rows];
    for entry in &block.lines {
        let bits_ok = entry.key.len() == block.parents.len()
            && entry.key.bytes().all(|b| b == b'0' || b == b'1');
        if !bits_ok {
            return Err(FileFormatError::InvalidPattern {
                line: entry.line,
                pattern: entry.key.to_string(),
            });
        }
        let row = entry
            .key
            .bytes()
            .zip(parent_defaults)
            .fold(0, |row, (bit, states)| {
                let state = if bit == b'1' {
                    states.true_state
                } else {
                    states.false_state
                };
                row * 2 + state
            });
        let value = parse_probability(entry.line, entry.value)?;
        if seen[row] {
            return Err(FileFormatError::DuplicateCptPattern {
                line: entry.line,
                variable: child.name().to_string(),
                pattern: entry.key.to_string(),
            });
        }
        seen[row] = true;
        table[row * 2 + own.false_state] = 1.0 - value;
        table[row * 2 + own.true_state] = value;
    }

    let found = seen.iter().filter(|s| **s).count();
    if found != rows {
        return Err(FileFormatError::IncompleteCptCoverage {
            variable: child.name().to_string(),
            expected: rows,
            found,
        });
    }
    Ok(table)
}
