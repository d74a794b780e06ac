//! Epidemiological association measures on a 2×2 table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of an association measure; `Undefined` when a denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Association {
    Value(f64),
    Undefined,
}

impl Association {
    /// The numeric value, if defined.
    pub fn value(self) -> Option<f64> {
        match self {
            Association::Value(v) => Some(v),
            Association::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Association::Undefined)
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Association::Value(v) => write!(f, "{}", v),
            Association::Undefined => write!(f, "Undefined"),
        }
    }
}

/// Joint cells of a binary exposure `E` and outcome `D`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoByTwo {
    /// P(E=1, D=1)
    pub a: f64,
    /// P(E=1, D=0)
    pub b: f64,
    /// P(E=0, D=1)
    pub c: f64,
    /// P(E=0, D=0)
    pub d: f64,
}

/// `numerator / denominator`, or `Undefined` when the denominator is exactly zero.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Association {
    if denominator == 0.0 {
        Association::Undefined
    } else {
        Association::Value(numerator / denominator)
    }
}

impl TwoByTwo {
    /// Odds ratio `a·d / (b·c)`.
    pub fn odds_ratio(&self) -> Association {
        safe_ratio(self.a * self.d, self.b * self.c)
    }

    /// Relative risk `(a/(a+b)) / (c/(c+d))`.
    ///
    /// Undefined when either exposure group is empty or the baseline risk is zero.
    pub fn relative_risk(&self) -> Association {
        let exposed = match safe_ratio(self.a, self.a + self.b) {
            Association::Value(v) => v,
            Association::Undefined => return Association::Undefined,
        };
        let baseline = match safe_ratio(self.c, self.c + self.d) {
            Association::Value(v) => v,
            Association::Undefined => return Association::Undefined,
        };
        safe_ratio(exposed, baseline)
    }
}
