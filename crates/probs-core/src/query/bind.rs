//! Name resolution: [`Expr`] + [`VariableCatalog`] → [`Query`].

use probs_common::QueryError;

use super::ast::{BoundSpec, Expr, Query, StateSelector, VarSpec};
use crate::catalog::{Variable, VariableCatalog};

/// Resolve every name and state in `expr` against `catalog`.
pub fn bind(expr: &Expr, catalog: &VariableCatalog) -> Result<Query, QueryError> {
    match expr {
        Expr::Probability {
            targets,
            conditions,
        } => Ok(Query::Probability {
            targets: bind_side(targets, catalog)?,
            conditions: bind_side(conditions, catalog)?,
        }),
        Expr::Independence { a, b } => Ok(Query::Independence {
            a: lookup(catalog, a)?.index(),
            b: lookup(catalog, b)?.index(),
        }),
        Expr::CondIndependence { a, b, given } => Ok(Query::CondIndependence {
            a: lookup(catalog, a)?.index(),
            b: lookup(catalog, b)?.index(),
            given: lookup(catalog, given)?.index(),
        }),
        Expr::Binary { op, left, right } => Ok(Query::Binary {
            op: *op,
            left: Box::new(bind(left, catalog)?),
            right: Box::new(bind(right, catalog)?),
        }),
        Expr::Negate(inner) => Ok(Query::Negate(Box::new(bind(inner, catalog)?))),
        Expr::Number(v) => Ok(Query::Number(*v)),
    }
}

fn lookup<'a>(catalog: &'a VariableCatalog, name: &str) -> Result<&'a Variable, QueryError> {
    catalog
        .by_name(name)
        .ok_or_else(|| QueryError::UnknownVariable {
            name: name.to_string(),
        })
}

/// Bind one side of `|`. Repeating a variable with the same state is
/// harmless and collapses to one constraint.
fn bind_side(specs: &[VarSpec], catalog: &VariableCatalog) -> Result<Vec<BoundSpec>, QueryError> {
    let mut bound: Vec<BoundSpec> = Vec::with_capacity(specs.len());
    for spec in specs {
        let next = bind_spec(spec, catalog)?;
        match bound.iter().find(|b| b.variable == next.variable) {
            Some(prev) if prev.state != next.state => {
                return Err(QueryError::ConflictingAssignment {
                    variable: spec.name.clone(),
                })
            }
            Some(_) => {}
            None => bound.push(next),
        }
    }
    Ok(bound)
}

fn bind_spec(spec: &VarSpec, catalog: &VariableCatalog) -> Result<BoundSpec, QueryError> {
    let variable = lookup(catalog, &spec.name)?;
    let missing_default = || QueryError::MissingExplicitState {
        variable: spec.name.clone(),
        cardinality: variable.cardinality(),
    };

    let explicit = spec
        .state
        .as_deref()
        .map(|label| {
            variable
                .resolve_state(label)
                .ok_or_else(|| QueryError::UnknownState {
                    variable: spec.name.clone(),
                    state: label.to_string(),
                })
        })
        .transpose()?;

    let (state, selector) = match (spec.negated, explicit) {
        (false, Some(state)) => (state, StateSelector::Explicit),
        (false, None) => {
            let defaults = variable.default_states().ok_or_else(missing_default)?;
            (defaults.true_state, StateSelector::DefaultTrue)
        }
        (true, explicit) => {
            let defaults = variable.default_states().ok_or_else(missing_default)?;
            if explicit.is_some_and(|s| s != defaults.false_state) {
                return Err(QueryError::ConflictingAssignment {
                    variable: spec.name.clone(),
                });
            }
            (defaults.false_state, StateSelector::DefaultFalse)
        }
    };

    Ok(BoundSpec {
        variable: variable.index(),
        state,
        selector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_query;

    fn catalog() -> VariableCatalog {
        VariableCatalog::new(
            vec![
                Variable::boolean("Rain"),
                Variable::new("Wet", vec!["no".into(), "yes".into()]),
                Variable::new(
                    "Weather",
                    vec!["Sunny".into(), "Cloudy".into(), "Rainy".into()],
                ),
            ],
            1 << 20,
        )
        .unwrap()
    }

    fn bind_str(src: &str) -> Result<Query, QueryError> {
        bind(&parse_query(src).unwrap(), &catalog())
    }

    fn targets(query: Query) -> Vec<(usize, usize)> {
        match query {
            Query::Probability { targets, .. } => {
                targets.iter().map(|b| (b.variable, b.state)).collect()
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bare_and_negated_use_defaults() {
        assert_eq!(targets(bind_str("P(Rain, ~Wet)").unwrap()), vec![(0, 1), (1, 0)]);
        assert_eq!(targets(bind_str("P(Not(Rain), Wet)").unwrap()), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn explicit_labels_and_indices() {
        assert_eq!(
            targets(bind_str("P(Weather=Rainy, Wet=yes)").unwrap()),
            vec![(2, 2), (1, 1)]
        );
        assert_eq!(targets(bind_str("P(Weather=1)").unwrap()), vec![(2, 1)]);
    }

    #[test]
    fn multivalued_needs_explicit_state() {
        assert_eq!(
            bind_str("P(Weather)").unwrap_err(),
            QueryError::MissingExplicitState {
                variable: "Weather".into(),
                cardinality: 3
            }
        );
        assert!(matches!(
            bind_str("P(~Weather)").unwrap_err(),
            QueryError::MissingExplicitState { .. }
        ));
    }

    #[test]
    fn negation_with_explicit_state() {
        assert_eq!(targets(bind_str("P(~Rain=0)").unwrap()), vec![(0, 0)]);
        assert_eq!(
            bind_str("P(~Rain=1)").unwrap_err(),
            QueryError::ConflictingAssignment {
                variable: "Rain".into()
            }
        );
    }

    #[test]
    fn repeated_variable_on_one_side() {
        assert_eq!(targets(bind_str("P(Rain, Rain=1)").unwrap()), vec![(0, 1)]);
        assert!(matches!(
            bind_str("P(Rain, ~Rain)").unwrap_err(),
            QueryError::ConflictingAssignment { .. }
        ));
        // opposite sides are legal
        assert!(bind_str("P(Rain | ~Rain)").is_ok());
    }

    #[test]
    fn unknown_names_and_states() {
        assert_eq!(
            bind_str("P(Snow)").unwrap_err(),
            QueryError::UnknownVariable {
                name: "Snow".into()
            }
        );
        assert_eq!(
            bind_str("IsIndep(Rain, Snow)").unwrap_err(),
            QueryError::UnknownVariable {
                name: "Snow".into()
            }
        );
        assert_eq!(
            bind_str("P(Weather=Foggy)").unwrap_err(),
            QueryError::UnknownState {
                variable: "Weather".into(),
                state: "Foggy".into()
            }
        );
        assert!(matches!(
            bind_str("P(Weather=3)").unwrap_err(),
            QueryError::UnknownState { .. }
        ));
    }

    #[test]
    fn predicates_bind_to_indices() {
        assert_eq!(
            bind_str("IsCondIndep(Rain, Weather | Wet)").unwrap(),
            Query::CondIndependence {
                a: 0,
                b: 2,
                given: 1
            }
        );
    }
}
