//! The immutable joint distribution.

use probs_common::{Error, QueryError, StatsError};
use probs_math::stable_sum_iter;
use serde::Serialize;

use crate::catalog::{Variable, VariableCatalog};

/// A normalized joint probability table over a fixed variable catalog.
///
/// Built once by the distribution builder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointDistribution {
    catalog: VariableCatalog,
    probs: Vec<f64>,
}

impl JointDistribution {
    /// Callers guarantee `probs.len() == catalog.size()` and a unit total.
    pub(crate) fn from_parts(catalog: VariableCatalog, probs: Vec<f64>) -> Self {
        debug_assert_eq!(catalog.size(), probs.len());
        Self { catalog, probs }
    }

    pub(crate) fn catalog_mut(&mut self) -> &mut VariableCatalog {
        &mut self.catalog
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn variables(&self) -> &[Variable] {
        self.catalog.variables()
    }

    pub fn num_variables(&self) -> usize {
        self.catalog.len()
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// The dense table in linear-index order.
    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    pub fn get(&self, linear: usize) -> Option<f64> {
        self.probs.get(linear).copied()
    }

    pub fn total(&self) -> f64 {
        stable_sum_iter(self.probs.iter().copied())
    }

    /// `(assignment, probability)` pairs in linear order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<usize>, f64)> + '_ {
        self.probs
            .iter()
            .enumerate()
            .map(move |(linear, &p)| (self.catalog.decode(linear), p))
    }

    /// Total mass of assignments consistent with every `(variable, state)`
    /// pair. Indices must already be valid.
    pub(crate) fn mass(&self, fixed: &[(usize, usize)]) -> f64 {
        if fixed.is_empty() {
            return self.total();
        }
        stable_sum_iter(
            self.probs
                .iter()
                .enumerate()
                .filter(|(linear, _)| {
                    fixed
                        .iter()
                        .all(|&(var, state)| self.catalog.state_of(*linear, var) == state)
                })
                .map(|(_, &p)| p),
        )
    }

    fn check(&self, fixed: &[(usize, usize)]) -> Result<(), Error> {
        for &(var, state) in fixed {
            let variable = self
                .catalog
                .get(var)
                .ok_or(StatsError::VariableOutOfRange {
                    index: var,
                    count: self.num_variables(),
                })?;
            if state >= variable.cardinality() {
                return Err(QueryError::UnknownState {
                    variable: variable.name().to_string(),
                    state: state.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Probability of a partial assignment given as `(variable, state)` indices.
    pub fn probability(&self, fixed: &[(usize, usize)]) -> Result<f64, Error> {
        self.check(fixed)?;
        Ok(self.mass(fixed))
    }

    /// `P(targets | conditions)`; conditioning on a zero-probability event is
    /// an error rather than a silent zero.
    pub fn conditional_probability(
        &self,
        targets: &[(usize, usize)],
        conditions: &[(usize, usize)],
    ) -> Result<f64, Error> {
        self.check(targets)?;
        self.check(conditions)?;
        Ok(self.conditional_mass(targets, conditions)?)
    }

    pub(crate) fn conditional_mass(
        &self,
        targets: &[(usize, usize)],
        conditions: &[(usize, usize)],
    ) -> Result<f64, QueryError> {
        let mut joint = Vec::with_capacity(targets.len() + conditions.len());
        joint.extend_from_slice(targets);
        joint.extend_from_slice(conditions);
        let numerator = self.mass(&joint);
        if conditions.is_empty() {
            return Ok(numerator);
        }
        let denominator = self.mass(conditions);
        if denominator == 0.0 {
            return Err(QueryError::DivisionByZero {
                condition: self.catalog.describe(conditions),
            });
        }
        Ok(numerator / denominator)
    }

    fn resolve_named(&self, named: &[(&str, &str)]) -> Result<Vec<(usize, usize)>, QueryError> {
        named
            .iter()
            .map(|&(name, state)| {
                let variable =
                    self.catalog
                        .by_name(name)
                        .ok_or_else(|| QueryError::UnknownVariable {
                            name: name.to_string(),
                        })?;
                let idx =
                    variable
                        .resolve_state(state)
                        .ok_or_else(|| QueryError::UnknownState {
                            variable: name.to_string(),
                            state: state.to_string(),
                        })?;
                Ok((variable.index(), idx))
            })
            .collect()
    }

    /// [`probability`](Self::probability) keyed by name and state label.
    pub fn probability_of(&self, named: &[(&str, &str)]) -> Result<f64, Error> {
        let fixed = self.resolve_named(named)?;
        Ok(self.mass(&fixed))
    }

    /// [`conditional_probability`](Self::conditional_probability) keyed by name.
    pub fn conditional_probability_of(
        &self,
        targets: &[(&str, &str)],
        conditions: &[(&str, &str)],
    ) -> Result<f64, Error> {
        let targets = self.resolve_named(targets)?;
        let conditions = self.resolve_named(conditions)?;
        Ok(self.conditional_mass(&targets, &conditions)?)
    }

    /// Probability of one full assignment; every variable must be named.
    pub fn joint_probability_of(&self, named: &[(&str, &str)]) -> Result<f64, Error> {
        let fixed = self.resolve_named(named)?;
        let mut assignment: Vec<Option<usize>> = vec![None; self.num_variables()];
        for (var, state) in fixed {
            match assignment[var] {
                Some(prev) if prev != state => {
                    return Err(QueryError::ConflictingAssignment {
                        variable: self.variables()[var].name().to_string(),
                    }
                    .into())
                }
                _ => assignment[var] = Some(state),
            }
        }
        let mut full = Vec::with_capacity(assignment.len());
        for (var, state) in assignment.into_iter().enumerate() {
            let variable = &self.variables()[var];
            let state = state.ok_or_else(|| QueryError::MissingExplicitState {
                variable: variable.name().to_string(),
                cardinality: variable.cardinality(),
            })?;
            full.push(state);
        }
        Ok(self.probs[self.catalog.encode(&full)])
    }
}
