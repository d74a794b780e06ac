//! Query evaluation against a joint distribution.
//!
//! Evaluation is a pure function of the bound query and the distribution.

use probs_common::QueryError;
use probs_config::Tolerances;
use std::fmt;

use crate::catalog::VariableCatalog;
use crate::distribution::JointDistribution;
use crate::query::{bind, parse_query, BinOp, BoundSpec, Query};

/// Result of a query: probability terms and arithmetic give numbers,
/// independence predicates give booleans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn as_number(self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(v),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Evaluate with the default tolerances.
pub fn evaluate(query: &Query, dist: &JointDistribution) -> Result<Value, QueryError> {
    evaluate_with(query, dist, &Tolerances::default())
}

pub fn evaluate_with(
    query: &Query,
    dist: &JointDistribution,
    tolerances: &Tolerances,
) -> Result<Value, QueryError> {
    check_indices(query, dist.catalog())?;
    let evaluator = Evaluator {
        dist,
        tolerance: tolerances.independence,
    };
    if query.is_predicate() {
        evaluator.predicate(query).map(Value::Bool)
    } else {
        evaluator.number(query).map(Value::Number)
    }
}

/// Reject variable or state indices that `catalog` does not have, as when a
/// query bound against one distribution is evaluated against another.
fn check_indices(query: &Query, catalog: &VariableCatalog) -> Result<(), QueryError> {
    let variable = |index: usize| {
        catalog.get(index).ok_or_else(|| QueryError::UnknownVariable {
            name: format!("#{}", index),
        })
    };
    match query {
        Query::Probability {
            targets,
            conditions,
        } => {
            for spec in targets.iter().chain(conditions) {
                let v = variable(spec.variable)?;
                if spec.state >= v.cardinality() {
                    return Err(QueryError::UnknownState {
                        variable: v.name().to_string(),
                        state: spec.state.to_string(),
                    });
                }
            }
            Ok(())
        }
        Query::Independence { a, b } => {
            variable(*a)?;
            variable(*b)?;
            Ok(())
        }
        Query::CondIndependence { a, b, given } => {
            for v in [a, b, given] {
                variable(*v)?;
            }
            Ok(())
        }
        Query::Binary { left, right, .. } => {
            check_indices(left, catalog)?;
            check_indices(right, catalog)
        }
        Query::Negate(inner) => check_indices(inner, catalog),
        Query::Number(_) => Ok(()),
    }
}

/// Parse, bind and evaluate `text` in one step.
pub fn evaluate_str(text: &str, dist: &JointDistribution) -> Result<Value, QueryError> {
    let expr = parse_query(text)?;
    let query = bind(&expr, dist.catalog())?;
    evaluate(&query, dist)
}

struct Evaluator<'a> {
    dist: &'a JointDistribution,
    tolerance: f64,
}

impl Evaluator<'_> {
    fn number(&self, query: &Query) -> Result<f64, QueryError> {
        match query {
            Query::Number(v) => Ok(*v),
            Query::Negate(inner) => Ok(-self.number(inner)?),
            Query::Probability {
                targets,
                conditions,
            } => self
                .dist
                .conditional_mass(&pairs(targets), &pairs(conditions)),
            Query::Binary { op, left, right } => {
                let l = self.number(left)?;
                let r = self.number(right)?;
                match op {
                    BinOp::Add => Ok(l + r),
                    BinOp::Sub => Ok(l - r),
                    BinOp::Mul => Ok(l * r),
                    BinOp::Div if r == 0.0 => Err(QueryError::ArithmeticDivisionByZero),
                    BinOp::Div => Ok(l / r),
                }
            }
            Query::Independence { .. } | Query::CondIndependence { .. } => {
                Err(QueryError::Syntax {
                    position: 0,
                    message: "independence predicates cannot be combined with arithmetic"
                        .to_string(),
                })
            }
        }
    }

    fn predicate(&self, query: &Query) -> Result<bool, QueryError> {
        match query {
            Query::Independence { a, b } => Ok(self.independent(*a, *b)),
            Query::CondIndependence { a, b, given } => Ok(self.cond_independent(*a, *b, *given)),
            _ => Err(QueryError::Syntax {
                position: 0,
                message: "expected an independence predicate".to_string(),
            }),
        }
    }

    /// `|P(a,b) - P(a)P(b)| <= tol` for every state pair.
    fn independent(&self, a: usize, b: usize) -> bool {
        self.independent_within(a, b, None)
    }

    /// Independence within every context `given = z` with `P(z) > 0`.
    fn cond_independent(&self, a: usize, b: usize, given: usize) -> bool {
        let card = self.cardinality(given);
        let mut checked = 0usize;
        for z in 0..card {
            let pz = self.dist.mass(&[(given, z)]);
            if pz <= 0.0 {
                continue;
            }
            checked += 1;
            if !self.independent_within(a, b, Some((given, z, pz))) {
                return false;
            }
        }
        if checked == 0 {
            tracing::warn!(
                variable = self.dist.variables()[given].name(),
                "no state of the conditioning variable has positive probability; treating as independent"
            );
        }
        true
    }

    fn independent_within(&self, a: usize, b: usize, context: Option<(usize, usize, f64)>) -> bool {
        let prob = |fixed: &mut Vec<(usize, usize)>| -> f64 {
            match context {
                Some((g, z, pz)) => {
                    fixed.push((g, z));
                    self.dist.mass(fixed) / pz
                }
                None => self.dist.mass(fixed),
            }
        };
        let pa: Vec<f64> = (0..self.cardinality(a))
            .map(|i| prob(&mut vec![(a, i)]))
            .collect();
        let pb: Vec<f64> = (0..self.cardinality(b))
            .map(|j| prob(&mut vec![(b, j)]))
            .collect();
        for (i, &p_a) in pa.iter().enumerate() {
            for (j, &p_b) in pb.iter().enumerate() {
                let joint = prob(&mut vec![(a, i), (b, j)]);
                if (joint - p_a * p_b).abs() > self.tolerance {
                    tracing::trace!(a, b, i, j, joint, product = p_a * p_b, "dependence found");
                    return false;
                }
            }
        }
        true
    }

    fn cardinality(&self, variable: usize) -> usize {
        self.dist.variables()[variable].cardinality()
    }
}

fn pairs(specs: &[BoundSpec]) -> Vec<(usize, usize)> {
    specs.iter().map(|s| (s.variable, s.state)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_distribution;
    use probs_common::Format;

    const MEDICAL: &str = "variables: Sickness, Test\n\
                           00: 0.9405\n01: 0.0495\n10: 0.001\n11: 0.009\n";

    fn medical() -> JointDistribution {
        build_distribution(MEDICAL, Format::JointTable).unwrap()
    }

    fn number(src: &str, dist: &JointDistribution) -> f64 {
        evaluate_str(src, dist).unwrap().as_number().unwrap()
    }

    #[test]
    fn conditional_and_marginal() {
        let d = medical();
        assert!((number("P(Test)", &d) - 0.0585).abs() < 1e-12);
        assert!((number("P(Sickness | Test)", &d) - 0.009 / 0.0585).abs() < 1e-12);
        assert!((number("P(~Sickness | Test=1)", &d) - 0.0495 / 0.0585).abs() < 1e-12);
    }

    #[test]
    fn complement_rule() {
        let d = medical();
        let sum = number("P(Test) + P(~Test)", &d);
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((number("1 - P(Test)", &d) - number("P(Not(Test))", &d)).abs() < 1e-12);
    }

    #[test]
    fn arithmetic() {
        let d = medical();
        assert_eq!(number("1 + 2 * 3", &d), 7.0);
        assert_eq!(number("(1 + 2) * 3", &d), 9.0);
        assert_eq!(number("8 / 4 / 2", &d), 1.0);
        assert_eq!(number("-(2 - 5)", &d), 3.0);
        assert_eq!(
            evaluate_str("1 / (P(Test) - P(Test))", &d).unwrap_err(),
            QueryError::ArithmeticDivisionByZero
        );
    }

    #[test]
    fn zero_probability_condition() {
        let d = build_distribution("00: 0.5\n01: 0.5\n", Format::JointTable).unwrap();
        match evaluate_str("P(B | A)", &d).unwrap_err() {
            QueryError::DivisionByZero { condition } => assert_eq!(condition, "A=1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn same_variable_on_both_sides() {
        let d = medical();
        assert_eq!(number("P(Test | ~Test)", &d), 0.0);
        assert!((number("P(Test | Test)", &d) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn independence() {
        let d = medical();
        assert_eq!(evaluate_str("IsIndep(Sickness, Test)", &d).unwrap(), Value::Bool(false));

        let product = build_distribution(
            "variables: X, Y\n00: 0.42\n01: 0.18\n10: 0.28\n11: 0.12\n",
            Format::JointTable,
        )
        .unwrap();
        assert_eq!(evaluate_str("IsIndep(X, Y)", &product).unwrap(), Value::Bool(true));
        assert_eq!(evaluate_str("IsIndep(Y, X)", &product).unwrap(), Value::Bool(true));
    }

    #[test]
    fn conditional_independence_in_a_chain() {
        // A -> B -> C: A and C are dependent, but independent given B
        let d = build_distribution(
            "variables: A, B, C\nA: None\n1: 0.3\nB: A\n0: 0.2\n1: 0.9\nC: B\n0: 0.1\n1: 0.7\n",
            Format::Network,
        )
        .unwrap();
        assert_eq!(evaluate_str("IsIndep(A, C)", &d).unwrap(), Value::Bool(false));
        assert_eq!(evaluate_str("IsCondIndep(A, C | B)", &d).unwrap(), Value::Bool(true));
    }

    #[test]
    fn zero_probability_contexts_are_skipped() {
        let d = build_distribution("variables: A, B, C\n000: 1.0\n", Format::JointTable).unwrap();
        // C=1 has no mass and is not checked
        assert_eq!(evaluate_str("IsCondIndep(A, B | C)", &d).unwrap(), Value::Bool(true));
    }

    #[test]
    fn predicate_tolerance_is_configurable() {
        let d = build_distribution(
            "variables: X, Y\n00: 0.2501\n01: 0.2499\n10: 0.2499\n11: 0.2501\n",
            Format::JointTable,
        )
        .unwrap();
        let query = bind(&parse_query("IsIndep(X, Y)").unwrap(), d.catalog()).unwrap();
        assert_eq!(evaluate(&query, &d).unwrap(), Value::Bool(false));
        let loose = Tolerances {
            independence: 1e-3,
            ..Tolerances::default()
        };
        assert_eq!(evaluate_with(&query, &d, &loose).unwrap(), Value::Bool(true));
    }

    #[test]
    fn queries_bound_elsewhere_are_rejected() {
        let three =
            build_distribution("variables: A, B, C\n000: 0.5\n111: 0.5\n", Format::JointTable)
                .unwrap();
        let one = build_distribution("0: 0.5\n1: 0.5\n", Format::JointTable).unwrap();

        let query = bind(&parse_query("P(C)").unwrap(), three.catalog()).unwrap();
        assert_eq!(
            evaluate(&query, &one).unwrap_err(),
            QueryError::UnknownVariable { name: "#2".into() }
        );
        let query = bind(&parse_query("IsIndep(A, C)").unwrap(), three.catalog()).unwrap();
        assert!(matches!(
            evaluate(&query, &one),
            Err(QueryError::UnknownVariable { .. })
        ));

        let cars = build_distribution(
            "variable Age {Child, Teen, Adult}\nAge <- None\nChild: 0.4\nTeen: 0.35\nAdult: 0.25\n",
            Format::Network,
        )
        .unwrap();
        let query = bind(&parse_query("P(Age=Adult)").unwrap(), cars.catalog()).unwrap();
        assert_eq!(
            evaluate(&query, &one).unwrap_err(),
            QueryError::UnknownState {
                variable: "A".into(),
                state: "2".into()
            }
        );
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::Number(0.5).as_number(), Some(0.5));
        assert_eq!(Value::Number(0.5).as_bool(), None);
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
