//! Probability engine.
//!
//! Builds a normalized joint distribution from a joint probability table or
//! a Bayesian network of conditional probability tables, then answers
//! queries against it:
//! - `P(...)` terms with negation, explicit states and conditioning
//! - arithmetic over those terms
//! - (conditional) independence predicates
//! - marginals, entropy measures, odds ratio / relative risk, sampling
//!
//! ```no_run
//! use probs_common::Format;
//! use probs_core::{build_distribution, evaluate_str};
//!
//! let dist = build_distribution("variables: Rain, Wet\n00: 0.5\n01: 0.1\n10: 0.05\n", Format::JointTable)?;
//! let p = evaluate_str("P(Rain | Wet)", &dist)?;
//! # Ok::<(), probs_common::Error>(())
//! ```

pub mod builder;
pub mod catalog;
pub mod distribution;
pub mod eval;
pub mod logging;
pub mod persist;
pub mod query;
pub mod session;
pub mod stats;

pub use builder::{build_distribution, load_file, DistributionBuilder};
pub use catalog::{default_names, DefaultStates, Variable, VariableCatalog};
pub use distribution::JointDistribution;
pub use eval::{evaluate, evaluate_str, evaluate_with, Value};
pub use logging::{init_logging, LogFormat};
pub use persist::{save_distribution, serialize_distribution};
pub use query::{bind, parse_query, Expr, Query};
pub use session::Session;
pub use stats::{
    conditional_entropy, entropy, marginal, mutual_information, mutual_information_with,
    odds_ratio, relative_risk, sample, Marginal, Sampler,
};

pub use probs_common::{Error, FileFormatError, Format, QueryError, Result, StatsError};
pub use probs_math::Association;
