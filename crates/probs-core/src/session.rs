//! The currently loaded distribution and the operations that act on it.

use probs_common::{Error, Format};
use probs_config::{resolve_config, ConfigPaths, EngineConfig};
use probs_math::Association;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;

use crate::builder::DistributionBuilder;
use crate::distribution::JointDistribution;
use crate::eval::{evaluate_with, Value};
use crate::query::{bind, parse_query};
use crate::stats::{self, Marginal};

/// Holds at most one distribution. A load replaces it only when the new
/// build succeeds.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: EngineConfig,
    current: Option<Arc<JointDistribution>>,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    /// Start a session under the configuration found via `paths`.
    pub fn from_config_paths(paths: &ConfigPaths) -> Result<Self, Error> {
        let resolved = resolve_config(paths).map_err(|e| Error::Config(e.to_string()))?;
        tracing::debug!(source = ?resolved.source, "engine configuration resolved");
        Ok(Self::new(resolved.config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn distribution(&self) -> Option<&Arc<JointDistribution>> {
        self.current.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Build from text and make it current.
    pub fn load(&mut self, text: &str, format: Format) -> Result<Arc<JointDistribution>, Error> {
        let dist = DistributionBuilder::new(self.config.clone()).build(text, format)?;
        Ok(self.replace(dist))
    }

    /// Build from a file and make it current.
    pub fn load_file(&mut self, path: &Path) -> Result<Arc<JointDistribution>, Error> {
        let dist = DistributionBuilder::new(self.config.clone()).build_file(path)?;
        tracing::info!(path = %path.display(), "loaded distribution");
        Ok(self.replace(dist))
    }

    /// Swap in an already built distribution.
    pub fn replace(&mut self, dist: JointDistribution) -> Arc<JointDistribution> {
        let dist = Arc::new(dist);
        if self.current.is_some() {
            tracing::info!(
                variables = dist.num_variables(),
                entries = dist.len(),
                "replaced current distribution"
            );
        }
        self.current = Some(Arc::clone(&dist));
        dist
    }

    fn current(&self) -> Result<&JointDistribution, Error> {
        self.current.as_deref().ok_or(Error::NoDistribution)
    }

    /// Parse, bind and evaluate a query against the current distribution.
    pub fn query(&self, text: &str) -> Result<Value, Error> {
        let dist = self.current()?;
        let expr = parse_query(text)?;
        let query = bind(&expr, dist.catalog())?;
        Ok(evaluate_with(&query, dist, &self.config.tolerances)?)
    }

    pub fn marginal(&self, variables: &[usize]) -> Result<Marginal, Error> {
        Ok(stats::marginal(self.current()?, variables)?)
    }

    /// Entropy in the configured default base; `None` means every variable.
    pub fn entropy(&self, variables: Option<&[usize]>) -> Result<f64, Error> {
        Ok(stats::entropy(
            self.current()?,
            variables,
            self.config.default_entropy_base,
        )?)
    }

    pub fn conditional_entropy(&self, target: &[usize], given: &[usize]) -> Result<f64, Error> {
        Ok(stats::conditional_entropy(
            self.current()?,
            target,
            given,
            self.config.default_entropy_base,
        )?)
    }

    /// Mutual information in the configured base; values below the negated
    /// configured tolerance are errors.
    pub fn mutual_information(&self, a: &[usize], b: &[usize]) -> Result<f64, Error> {
        Ok(stats::mutual_information_with(
            self.current()?,
            a,
            b,
            self.config.default_entropy_base,
            self.config.tolerances.mutual_information,
        )?)
    }

    pub fn odds_ratio(&self, exposure: usize, outcome: usize) -> Result<Association, Error> {
        Ok(stats::odds_ratio(self.current()?, exposure, outcome)?)
    }

    pub fn relative_risk(&self, exposure: usize, outcome: usize) -> Result<Association, Error> {
        Ok(stats::relative_risk(self.current()?, exposure, outcome)?)
    }

    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Vec<usize>>, Error> {
        Ok(stats::sample(self.current()?, n, rng))
    }
}
