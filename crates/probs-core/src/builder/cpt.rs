//! Conditional probability tables and their expansion to a joint table.

use probs_common::FileFormatError;
use probs_config::EngineConfig;
use probs_math::{approx_eq, normalize_within};

use crate::catalog::VariableCatalog;
use crate::distribution::JointDistribution;

/// One variable's CPT.
///
/// `table` is dense: row `r` (mixed-radix over the parent states, first
/// parent most significant) holds `cardinality` entries, one per own state.
#[derive(Debug, Clone, PartialEq)]
pub struct CptNode {
    pub variable: usize,
    pub parents: Vec<usize>,
    pub table: Vec<f64>,
}

impl CptNode {
    /// Row index for the parent states found in a full assignment.
    fn row(&self, catalog: &VariableCatalog, assignment: &[usize]) -> usize {
        self.parents.iter().fold(0, |row, &p| {
            row * catalog.variables()[p].cardinality() + assignment[p]
        })
    }

    fn check_shape(&self, catalog: &VariableCatalog) -> Result<(), FileFormatError> {
        let invalid = |message: String| FileFormatError::InvalidDeclaration { line: 0, message };
        let Some(variable) = catalog.get(self.variable) else {
            return Err(invalid(format!(
                "CPT for variable index {} outside a catalog of {}",
                self.variable,
                catalog.len()
            )));
        };
        let mut rows = 1usize;
        for &p in &self.parents {
            let parent = catalog.get(p).ok_or_else(|| {
                invalid(format!(
                    "parent index {} of '{}' outside a catalog of {}",
                    p,
                    variable.name(),
                    catalog.len()
                ))
            })?;
            rows = rows.saturating_mul(parent.cardinality());
        }
        let expected = rows.saturating_mul(variable.cardinality());
        if self.table.len() != expected {
            return Err(invalid(format!(
                "CPT for '{}' has {} entries, expected {}",
                variable.name(),
                self.table.len(),
                expected
            )));
        }
        Ok(())
    }

    fn local(&self, catalog: &VariableCatalog, assignment: &[usize]) -> f64 {
        let cardinality = catalog.variables()[self.variable].cardinality();
        let row = self.row(catalog, assignment);
        self.table[row * cardinality + assignment[self.variable]]
    }
}

/// A parsed Bayesian network; exists only until [`Network::expand`].
#[derive(Debug, Clone)]
pub struct Network {
    catalog: VariableCatalog,
    /// Indexed by variable.
    nodes: Vec<CptNode>,
}

impl Network {
    /// `nodes` must hold exactly one node per catalog variable, in any order,
    /// each with a table of `rows × cardinality` entries.
    pub fn new(catalog: VariableCatalog, mut nodes: Vec<CptNode>) -> Result<Self, FileFormatError> {
        for node in &nodes {
            node.check_shape(&catalog)?;
        }
        nodes.sort_by_key(|n| n.variable);
        if let Some(pair) = nodes.windows(2).find(|w| w[0].variable == w[1].variable) {
            return Err(FileFormatError::DuplicateVariable {
                line: 0,
                name: catalog.variables()[pair[0].variable].name().to_string(),
            });
        }
        for (i, variable) in catalog.variables().iter().enumerate() {
            if nodes.get(i).map(|n| n.variable) != Some(i) {
                return Err(FileFormatError::MissingCpt {
                    variable: variable.name().to_string(),
                });
            }
        }
        let network = Self { catalog, nodes };
        network.topological_order()?;
        Ok(network)
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn nodes(&self) -> &[CptNode] {
        &self.nodes
    }

    /// Parents before children, ties broken by declaration order.
    ///
    /// Fails with the variables left on a cycle when the graph is not a DAG.
    pub fn topological_order(&self) -> Result<Vec<usize>, FileFormatError> {
        let n = self.nodes.len();
        let mut indegree: Vec<usize> = self.nodes.iter().map(|node| node.parents.len()).collect();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        for node in &self.nodes {
            for &p in &node.parents {
                children[p].push(node.variable);
            }
        }

        let mut order = Vec::with_capacity(n);
        let mut done = vec![false; n];
        while order.len() < n {
            let Some(next) = (0..n).find(|&v| !done[v] && indegree[v] == 0) else {
                let variables = (0..n)
                    .filter(|&v| !done[v])
                    .map(|v| self.catalog.variables()[v].name().to_string())
                    .collect();
                return Err(FileFormatError::CyclicNetwork { variables });
            };
            done[next] = true;
            order.push(next);
            for &child in &children[next] {
                indegree[child] -= 1;
            }
        }
        Ok(order)
    }

    /// Multiply out every CPT over the full assignment space.
    pub fn expand(self, config: &EngineConfig) -> Result<JointDistribution, FileFormatError> {
        let order = self.topological_order()?;
        tracing::debug!(
            order = ?order
                .iter()
                .map(|&v| self.catalog.variables()[v].name())
                .collect::<Vec<_>>(),
            size = self.catalog.size(),
            "expanding network"
        );

        let size = self.catalog.size();
        let mut probs = vec![0.0; size];
        let mut assignment = vec![0usize; self.catalog.len()];
        for (linear, slot) in probs.iter_mut().enumerate() {
            self.catalog.decode_into(linear, &mut assignment);
            let mut p = 1.0;
            for &v in &order {
                p *= self.nodes[v].local(&self.catalog, &assignment);
                if p == 0.0 {
                    break;
                }
            }
            *slot = p;
        }

        let total = normalize_within(&mut probs, config.tolerances.normalization_band)
            .map_err(|sum| FileFormatError::NetworkNotStochastic { sum })?;
        if !approx_eq(total, 1.0, config.tolerances.sum) {
            tracing::warn!(sum = total, "expanded network auto-normalized to 1");
        }

        Ok(JointDistribution::from_parts(self.catalog, probs))
    }
}
