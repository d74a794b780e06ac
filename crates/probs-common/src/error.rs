//! Error types for the probability engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while turning specification text into a joint distribution.
///
/// Line numbers are 1-based and refer to the input text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FileFormatError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("no probability entries found")]
    NoEntries,

    #[error("network must declare its variables before any CPT block")]
    HeaderMissing,

    #[error("line {line}: invalid binary pattern '{pattern}'")]
    InvalidPattern { line: usize, pattern: String },

    #[error("line {line}: pattern has length {found}, expected {expected}")]
    InconsistentPatternLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid probability value '{value}' (must be a number in [0, 1])")]
    InvalidProbabilityValue { line: usize, value: String },

    #[error("line {line}: duplicate entry for pattern '{pattern}'")]
    DuplicatePattern { line: usize, pattern: String },

    #[error("probabilities sum to {sum} before inferring the missing entry (residual {residual})")]
    NegativeResidual { sum: f64, residual: f64 },

    #[error("probabilities sum to {sum}; deviation too large for auto-normalization")]
    SumExceedsTolerance { sum: f64 },

    #[error("probabilities sum to {sum}; too far below 1 for auto-normalization")]
    SumBelowTolerance { sum: f64 },

    #[error("line {line}: unknown variable '{name}'")]
    UnknownVariable { line: usize, name: String },

    #[error("line {line}: variable '{name}' is defined more than once")]
    DuplicateVariable { line: usize, name: String },

    #[error("line {line}: invalid declaration: {message}")]
    InvalidDeclaration { line: usize, message: String },

    #[error("variable '{variable}' is declared but has no CPT")]
    MissingCpt { variable: String },

    #[error("line {line}: CPT for '{variable}' mixes full and shorthand notation")]
    MixedCptNotation { line: usize, variable: String },

    #[error("line {line}: duplicate CPT entry for '{variable}' at {pattern}")]
    DuplicateCptPattern {
        line: usize,
        variable: String,
        pattern: String,
    },

    #[error("incomplete CPT for '{variable}': expected {expected} entries, got {found}")]
    IncompleteCptCoverage {
        variable: String,
        expected: usize,
        found: usize,
    },

    #[error("CPT for '{variable}' given {context} sums to {sum}, expected 1")]
    CptNotStochastic {
        variable: String,
        context: String,
        sum: f64,
    },

    #[error("network contains a cycle through: {}", variables.join(", "))]
    CyclicNetwork { variables: Vec<String> },

    #[error("expanded network sums to {sum}; CPTs are not stochastic")]
    NetworkNotStochastic { sum: f64 },

    #[error("assignment space of {size} exceeds the configured cap of {cap}")]
    AssignmentSpaceTooLarge { size: u128, cap: u64 },

    #[error("variable '{variable}' is not boolean; the joint-table format only stores {{0,1}} variables")]
    NotBoolean { variable: String },
}

/// Failures while parsing, binding or evaluating a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unknown variable name: {name}")]
    UnknownVariable { name: String },

    #[error("variable '{variable}' has no state '{state}'")]
    UnknownState { variable: String, state: String },

    #[error("conflicting assignments for variable '{variable}'")]
    ConflictingAssignment { variable: String },

    #[error("variable '{variable}' has {cardinality} states; use {variable}=<state>")]
    MissingExplicitState { variable: String, cardinality: usize },

    #[error("conditioning event has zero probability: {condition}")]
    DivisionByZero { condition: String },

    #[error("division by zero in arithmetic expression")]
    ArithmeticDivisionByZero,
}

/// Failures in the statistics layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("variable index {index} out of range (distribution has {count} variables)")]
    VariableOutOfRange { index: usize, count: usize },

    #[error("variable '{variable}' has {cardinality} states; a binary variable is required")]
    NonBinaryVariable { variable: String, cardinality: usize },

    #[error("mutual information is {value}, below the tolerance of -{tolerance}")]
    NegativeMutualInformation { value: f64, tolerance: f64 },

    #[error("invalid logarithm base {base}")]
    InvalidBase { base: f64 },
}

/// Unified error type for the probability engine.
#[derive(Error, Debug)]
pub enum Error {
    // Specification errors (10-19)
    #[error("file format error: {0}")]
    FileFormat(#[from] FileFormatError),

    // Query errors (20-29)
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    // Statistics errors (30-39)
    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),

    // Configuration errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // Session errors (50-59)
    #[error("no distribution loaded")]
    NoDistribution,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            Error::FileFormat(e) => match e {
                FileFormatError::Syntax { .. }
                | FileFormatError::NoEntries
                | FileFormatError::HeaderMissing
                | FileFormatError::InvalidPattern { .. }
                | FileFormatError::InvalidDeclaration { .. } => 10,
                FileFormatError::InconsistentPatternLength { .. }
                | FileFormatError::DuplicatePattern { .. } => 11,
                FileFormatError::InvalidProbabilityValue { .. } => 12,
                FileFormatError::NegativeResidual { .. }
                | FileFormatError::SumExceedsTolerance { .. }
                | FileFormatError::SumBelowTolerance { .. } => 13,
                FileFormatError::UnknownVariable { .. }
                | FileFormatError::DuplicateVariable { .. }
                | FileFormatError::MissingCpt { .. } => 14,
                FileFormatError::MixedCptNotation { .. }
                | FileFormatError::DuplicateCptPattern { .. }
                | FileFormatError::IncompleteCptCoverage { .. }
                | FileFormatError::CptNotStochastic { .. } => 15,
                FileFormatError::CyclicNetwork { .. } => 16,
                FileFormatError::NetworkNotStochastic { .. } => 17,
                FileFormatError::AssignmentSpaceTooLarge { .. } => 18,
                FileFormatError::NotBoolean { .. } => 19,
            },
            Error::Query(e) => match e {
                QueryError::Syntax { .. } => 20,
                QueryError::UnknownVariable { .. } => 21,
                QueryError::UnknownState { .. } => 22,
                QueryError::ConflictingAssignment { .. } => 23,
                QueryError::MissingExplicitState { .. } => 24,
                QueryError::DivisionByZero { .. } => 25,
                QueryError::ArithmeticDivisionByZero => 26,
            },
            Error::Stats(e) => match e {
                StatsError::VariableOutOfRange { .. } => 30,
                StatsError::NonBinaryVariable { .. } => 31,
                StatsError::NegativeMutualInformation { .. } => 32,
                StatsError::InvalidBase { .. } => 33,
            },
            Error::Config(_) => 40,
            Error::NoDistribution => 50,
            Error::Io(_) => 60,
        }
    }
}
