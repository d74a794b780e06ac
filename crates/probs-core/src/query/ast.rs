//! Query syntax trees.
//!
//! [`Expr`] is what the parser produces: names and state labels as written,
//! with no knowledge of any distribution. [`Query`] is the bound form, with
//! every name and state resolved to catalog indices.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

/// One entry of a `P(...)` target or condition list, as written.
#[derive(Debug, Clone, PartialEq)]
pub struct VarSpec {
    pub name: String,
    /// Written as `~Name`, `~(Name)` or `Not(Name)`.
    pub negated: bool,
    /// The `state` of `Name=state`.
    pub state: Option<String>,
    /// Byte offset of the name in the query.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Probability {
        targets: Vec<VarSpec>,
        conditions: Vec<VarSpec>,
    },
    Independence {
        a: String,
        b: String,
    },
    CondIndependence {
        a: String,
        b: String,
        given: String,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Negate(Box<Expr>),
    Number(f64),
}

/// How a bound state was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSelector {
    Explicit,
    DefaultTrue,
    DefaultFalse,
}

/// A resolved `(variable, state)` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundSpec {
    pub variable: usize,
    pub state: usize,
    pub selector: StateSelector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Probability {
        targets: Vec<BoundSpec>,
        conditions: Vec<BoundSpec>,
    },
    Independence {
        a: usize,
        b: usize,
    },
    CondIndependence {
        a: usize,
        b: usize,
        given: usize,
    },
    Binary {
        op: BinOp,
        left: Box<Query>,
        right: Box<Query>,
    },
    Negate(Box<Query>),
    Number(f64),
}

impl Query {
    /// Whether evaluation yields a boolean rather than a number.
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            Query::Independence { .. } | Query::CondIndependence { .. }
        )
    }
}
