//! Variable metadata and mixed-radix assignment encoding.
//!
//! A [`VariableCatalog`] fixes the variable order of a joint distribution.
//! Variable 0 is the most significant digit of the linear index, so for
//! boolean variables the linear index equals the big-endian reading of the
//! `0`/`1` pattern.

use probs_common::FileFormatError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label pairs recognised as (false, true), compared case-insensitively.
const BOOLEAN_LABEL_PAIRS: &[(&str, &str)] = &[
    ("0", "1"),
    ("false", "true"),
    ("no", "yes"),
    ("off", "on"),
    ("f", "t"),
    ("n", "y"),
    ("absent", "present"),
    ("negative", "positive"),
];

/// Canonical false/true states of a variable that has them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultStates {
    pub false_state: usize,
    pub true_state: usize,
}

/// A discrete random variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    index: usize,
    states: Vec<String>,
    defaults: Option<DefaultStates>,
}

impl Variable {
    /// A variable with the given state labels. The index is assigned when the
    /// variable is placed in a catalog.
    pub fn new(name: impl Into<String>, states: Vec<String>) -> Self {
        let defaults = designated_defaults(&states);
        Self {
            name: name.into(),
            index: 0,
            states,
            defaults,
        }
    }

    /// A boolean variable with states `0` and `1`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, vec!["0".to_string(), "1".to_string()])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn state_label(&self, state: usize) -> Option<&str> {
        self.states.get(state).map(String::as_str)
    }

    /// Two states, whatever their labels.
    pub fn is_binary(&self) -> bool {
        self.states.len() == 2
    }

    /// Labelled exactly `0`, `1` in that order.
    pub fn is_boolean(&self) -> bool {
        self.states.len() == 2 && self.states[0] == "0" && self.states[1] == "1"
    }

    /// The designated false/true states, if the labels define them.
    pub fn default_states(&self) -> Option<DefaultStates> {
        self.defaults
    }

    /// Resolve a state by exact label, then by decimal index.
    pub fn resolve_state(&self, state: &str) -> Option<usize> {
        if let Some(pos) = self.states.iter().position(|s| s == state) {
            return Some(pos);
        }
        state
            .parse::<usize>()
            .ok()
            .filter(|&idx| idx < self.states.len())
    }
}

fn designated_defaults(states: &[String]) -> Option<DefaultStates> {
    if states.len() != 2 {
        return None;
    }
    let (first, second) = (states[0].as_str(), states[1].as_str());
    for (f, t) in BOOLEAN_LABEL_PAIRS {
        if first.eq_ignore_ascii_case(f) && second.eq_ignore_ascii_case(t) {
            return Some(DefaultStates {
                false_state: 0,
                true_state: 1,
            });
        }
        if first.eq_ignore_ascii_case(t) && second.eq_ignore_ascii_case(f) {
            return Some(DefaultStates {
                false_state: 1,
                true_state: 0,
            });
        }
    }
    None
}

/// A name the query language can refer to.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Default variable names: `A`..`Z`, then `V26`, `V27`, ...
pub fn default_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i < 26 {
                char::from(b'A' + i as u8).to_string()
            } else {
                format!("V{}", i)
            }
        })
        .collect()
}

/// Ordered variables plus the stride table of the linear encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableCatalog {
    variables: Vec<Variable>,
    strides: Vec<usize>,
    size: usize,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl VariableCatalog {
    /// Build a catalog, rejecting assignment spaces larger than `cap`.
    ///
    /// Names must be unique identifiers; callers that read names from text
    /// report bad names with line numbers before getting here.
    pub fn new(mut variables: Vec<Variable>, cap: u64) -> Result<Self, FileFormatError> {
        let mut size: u128 = 1;
        for var in &variables {
            size = size.saturating_mul(var.cardinality() as u128);
        }
        if size > cap as u128 || size > usize::MAX as u128 {
            return Err(FileFormatError::AssignmentSpaceTooLarge { size, cap });
        }

        let mut by_name = HashMap::with_capacity(variables.len());
        for (index, var) in variables.iter_mut().enumerate() {
            if !is_identifier(&var.name) {
                return Err(FileFormatError::InvalidDeclaration {
                    line: 0,
                    message: format!("invalid variable name '{}'", var.name),
                });
            }
            if by_name.insert(var.name.clone(), index).is_some() {
                return Err(FileFormatError::DuplicateVariable {
                    line: 0,
                    name: var.name.clone(),
                });
            }
            var.index = index;
        }

        let mut strides = vec![1usize; variables.len()];
        for i in (0..variables.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * variables[i + 1].cardinality();
        }

        Ok(Self {
            variables,
            strides,
            size: size as usize,
            by_name,
        })
    }

    /// Boolean variables with the given names.
    pub fn boolean(names: &[String], cap: u64) -> Result<Self, FileFormatError> {
        Self::new(names.iter().map(Variable::boolean).collect(), cap)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn get(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Variable> {
        self.index_of(name).map(|i| &self.variables[i])
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(Variable::name).collect()
    }

    /// Number of global assignments, `∏ cardinalities`.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Linear index of a full assignment (one state per variable, catalog order).
    pub fn encode(&self, assignment: &[usize]) -> usize {
        assignment
            .iter()
            .zip(&self.strides)
            .map(|(state, stride)| state * stride)
            .sum()
    }

    /// Assignment for a linear index.
    pub fn decode(&self, linear: usize) -> Vec<usize> {
        let mut out = vec![0; self.len()];
        self.decode_into(linear, &mut out);
        out
    }

    /// Decode into a caller-provided buffer of length `len()`.
    pub fn decode_into(&self, linear: usize, out: &mut [usize]) {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.state_of(linear, i);
        }
    }

    /// State of one variable within a linear index.
    pub fn state_of(&self, linear: usize, variable: usize) -> usize {
        (linear / self.strides[variable]) % self.variables[variable].cardinality()
    }

    /// Replace every variable name, keeping states and order.
    pub(crate) fn rename(&mut self, names: &[String]) -> Result<(), FileFormatError> {
        let mut by_name = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if !is_identifier(name) {
                return Err(FileFormatError::InvalidDeclaration {
                    line: 0,
                    message: format!("invalid variable name '{}'", name),
                });
            }
            if by_name.insert(name.clone(), index).is_some() {
                return Err(FileFormatError::DuplicateVariable {
                    line: 0,
                    name: name.clone(),
                });
            }
        }
        for (var, name) in self.variables.iter_mut().zip(names) {
            var.name = name.clone();
        }
        self.by_name = by_name;
        Ok(())
    }

    /// `Name=label` for each fixed variable, comma separated.
    pub fn describe(&self, fixed: &[(usize, usize)]) -> String {
        fixed
            .iter()
            .map(|&(var, state)| {
                let v = &self.variables[var];
                format!("{}={}", v.name(), v.state_label(state).unwrap_or("?"))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn mixed() -> VariableCatalog {
        VariableCatalog::new(
            vec![
                Variable::new("Age", labels(&["Child", "Teen", "Adult"])),
                Variable::boolean("Rain"),
                Variable::new("Car", labels(&["Budget", "Standard"])),
            ],
            1 << 22,
        )
        .unwrap()
    }

    #[test]
    fn default_names_roll_over() {
        let names = default_names(28);
        assert_eq!(names[0], "A");
        assert_eq!(names[25], "Z");
        assert_eq!(names[26], "V26");
        assert_eq!(names[27], "V27");
    }

    #[test]
    fn strides_are_big_endian() {
        let cat = mixed();
        assert_eq!(cat.size(), 12);
        assert_eq!(cat.strides(), &[4, 2, 1]);
        assert_eq!(cat.get(1).unwrap().index(), 1);
    }

    #[test]
    fn encode_decode_agree() {
        let cat = mixed();
        for linear in 0..cat.size() {
            let assignment = cat.decode(linear);
            assert_eq!(cat.encode(&assignment), linear);
            for (var, state) in assignment.iter().enumerate() {
                assert_eq!(cat.state_of(linear, var), *state);
            }
        }
        assert_eq!(cat.decode(11), vec![2, 1, 1]);
    }

    #[test]
    fn boolean_linear_index_is_pattern() {
        let cat = VariableCatalog::boolean(&default_names(3), 1 << 22).unwrap();
        assert_eq!(cat.encode(&[1, 0, 1]), 0b101);
    }

    #[test]
    fn designated_defaults_recognise_pairs() {
        assert_eq!(
            Variable::boolean("A").default_states(),
            Some(DefaultStates {
                false_state: 0,
                true_state: 1
            })
        );
        let yes_no = Variable::new("S", labels(&["Yes", "No"]));
        assert_eq!(
            yes_no.default_states(),
            Some(DefaultStates {
                false_state: 1,
                true_state: 0
            })
        );
        let weather = Variable::new("W", labels(&["Sunny", "Rainy"]));
        assert!(weather.is_binary());
        assert_eq!(weather.default_states(), None);
        let three = Variable::new("T", labels(&["0", "1", "2"]));
        assert_eq!(three.default_states(), None);
    }

    #[test]
    fn resolve_state_prefers_labels() {
        let odd = Variable::new("X", labels(&["1", "0"]));
        assert_eq!(odd.resolve_state("1"), Some(0));
        let age = Variable::new("Age", labels(&["Child", "Teen", "Adult"]));
        assert_eq!(age.resolve_state("Teen"), Some(1));
        assert_eq!(age.resolve_state("2"), Some(2));
        assert_eq!(age.resolve_state("3"), None);
        assert_eq!(age.resolve_state("teen"), None);
    }

    #[test]
    fn cap_is_enforced() {
        let err = VariableCatalog::boolean(&default_names(5), 16).unwrap_err();
        assert_eq!(
            err,
            FileFormatError::AssignmentSpaceTooLarge { size: 32, cap: 16 }
        );
    }

    #[test]
    fn duplicate_names_rejected() {
        let names = labels(&["A", "A"]);
        let err = VariableCatalog::boolean(&names, 1 << 22).unwrap_err();
        assert!(matches!(err, FileFormatError::DuplicateVariable { .. }));
    }

    #[test]
    fn rename_keeps_states() {
        let mut cat = mixed();
        cat.rename(&labels(&["X", "Y", "Z"])).unwrap();
        assert_eq!(cat.index_of("Y"), Some(1));
        assert_eq!(cat.index_of("Rain"), None);
        assert_eq!(cat.get(0).unwrap().cardinality(), 3);
        assert_eq!(cat.describe(&[(0, 2), (2, 0)]), "X=Adult, Z=Budget");
    }

    #[test]
    fn rename_rejects_names_queries_cannot_spell() {
        let mut cat = mixed();
        let err = cat.rename(&labels(&["X", "Has Flu", "Z"])).unwrap_err();
        assert!(matches!(err, FileFormatError::InvalidDeclaration { line: 0, .. }));
        assert_eq!(cat.index_of("X"), None);
        assert!(matches!(
            VariableCatalog::boolean(&labels(&["ok", "not-ok"]), 1 << 22),
            Err(FileFormatError::InvalidDeclaration { .. })
        ));
        assert!(is_identifier("_x9"));
        assert!(!is_identifier("9x"));
        assert!(!is_identifier(""));
    }
}
