//! Distribution builder: specification text → [`JointDistribution`].
//!
//! Builds are all-or-nothing. A failed build returns an error and produces no
//! distribution, so a caller holding a previous one keeps it unchanged.

pub mod cpt;
pub mod joint_table;
pub mod network;

pub use cpt::{CptNode, Network};

use probs_common::{Error, FileFormatError, Format};
use probs_config::EngineConfig;
use std::path::Path;

use crate::distribution::JointDistribution;

/// Builds joint distributions under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct DistributionBuilder {
    config: EngineConfig,
    names: Option<Vec<String>>,
}

impl DistributionBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            names: None,
        }
    }

    /// Override the variable names found in the text.
    pub fn with_variable_names(mut self, names: Vec<String>) -> Self {
        self.names = Some(names);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn build(&self, text: &str, format: Format) -> Result<JointDistribution, FileFormatError> {
        let names = self.names.as_deref();
        let dist = match format {
            Format::JointTable => joint_table::parse(text, names, &self.config)?,
            Format::Network => network::parse(text, names, &self.config)?,
        };
        tracing::debug!(
            %format,
            variables = dist.num_variables(),
            entries = dist.len(),
            "built joint distribution"
        );
        Ok(dist)
    }

    /// Read and build a file. The format comes from the extension; anything
    /// other than `.net` is read as a joint table.
    pub fn build_file(&self, path: &Path) -> Result<JointDistribution, Error> {
        let format = Format::from_path(path).unwrap_or_else(|| {
            tracing::debug!(path = %path.display(), "unrecognized extension; reading as joint table");
            Format::JointTable
        });
        let text = std::fs::read_to_string(path)?;
        Ok(self.build(&text, format)?)
    }
}

/// Build with the default configuration.
pub fn build_distribution(text: &str, format: Format) -> Result<JointDistribution, FileFormatError> {
    DistributionBuilder::default().build(text, format)
}

/// Read and build a file with the default configuration.
pub fn load_file(path: &Path) -> Result<JointDistribution, Error> {
    DistributionBuilder::default().build_file(path)
}
