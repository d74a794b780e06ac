//! Engine configuration types.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidationResult};

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tolerances: Tolerances,

    /// Logarithm base used by entropy measures when none is given.
    pub default_entropy_base: f64,

    /// Largest assignment space (∏ cardinalities) a build may enumerate.
    pub max_assignment_space: u64,

    #[serde(rename = "_comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Numeric tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Floating tolerance for "sums to one" checks (CPT rows, network totals).
    pub sum: f64,

    /// Relative band within which a joint table is silently rescaled.
    pub normalization_band: f64,

    /// Absolute tolerance for independence predicates.
    pub independence: f64,

    /// How far below zero mutual information may drift before it is an error.
    pub mutual_information: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            sum: 1e-6,
            normalization_band: 0.05,
            independence: 1e-9,
            mutual_information: 1e-9,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            default_entropy_base: 2.0,
            max_assignment_space: 1 << 22,
            comment: None,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse a configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Load, then reject anything that fails semantic validation.
    pub fn load_validated(path: &std::path::Path) -> Result<Self, ValidationError> {
        let config = Self::from_file(path)?;
        config.validate().into_result()?;
        Ok(config)
    }

    /// Check every field, collecting all problems rather than stopping at the first.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        let t = &self.tolerances;

        for (name, value) in [
            ("tolerances.sum", t.sum),
            ("tolerances.independence", t.independence),
            ("tolerances.mutual_information", t.mutual_information),
        ] {
            if !value.is_finite() || value <= 0.0 {
                result.push(name, format!("must be positive and finite, got {}", value));
            }
        }

        if !(t.normalization_band > 0.0 && t.normalization_band < 1.0) {
            result.push(
                "tolerances.normalization_band",
                format!("must lie in (0, 1), got {}", t.normalization_band),
            );
        } else if t.sum.is_finite() && t.sum >= t.normalization_band {
            result.push(
                "tolerances.sum",
                format!(
                    "must be smaller than normalization_band ({}), got {}",
                    t.normalization_band, t.sum
                ),
            );
        }

        let base = self.default_entropy_base;
        if !base.is_finite() || base <= 0.0 || base == 1.0 {
            result.push(
                "default_entropy_base",
                format!("must be positive, finite and not 1, got {}", base),
            );
        }

        if self.max_assignment_space < 2 {
            result.push(
                "max_assignment_space",
                format!("must be at least 2, got {}", self.max_assignment_space),
            );
        }

        result
    }
}
