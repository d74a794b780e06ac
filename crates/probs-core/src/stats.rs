//! Statistics over a joint distribution: marginals, the entropy family,
//! 2×2 association measures and sampling.

use probs_common::StatsError;
use probs_config::Tolerances;
use probs_math::{cumulative_sums, is_valid_log_base, search_cumulative, Association, TwoByTwo};
use rand::Rng;
use serde::Serialize;

use crate::distribution::JointDistribution;

/// A marginal distribution over an ordered subset of variables.
///
/// Entries are stored densely, first listed variable most significant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marginal {
    variables: Vec<usize>,
    cardinalities: Vec<usize>,
    probs: Vec<f64>,
}

impl Marginal {
    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Probability of a sub-assignment given in `variables()` order.
    pub fn get(&self, states: &[usize]) -> Option<f64> {
        if states.len() != self.variables.len() {
            return None;
        }
        let mut idx = 0usize;
        for (&s, &card) in states.iter().zip(&self.cardinalities) {
            if s >= card {
                return None;
            }
            idx = idx * card + s;
        }
        self.probs.get(idx).copied()
    }

    /// `(sub-assignment, probability)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<usize>, f64)> + '_ {
        self.probs.iter().enumerate().map(move |(idx, &p)| {
            let mut states = vec![0; self.cardinalities.len()];
            let mut rest = idx;
            for (slot, &card) in states.iter_mut().zip(&self.cardinalities).rev() {
                *slot = rest % card;
                rest /= card;
            }
            (states, p)
        })
    }
}

fn check_variables(dist: &JointDistribution, variables: &[usize]) -> Result<(), StatsError> {
    let count = dist.num_variables();
    match variables.iter().find(|&&v| v >= count) {
        Some(&index) => Err(StatsError::VariableOutOfRange { index, count }),
        None => Ok(()),
    }
}

fn check_base(base: f64) -> Result<(), StatsError> {
    if is_valid_log_base(base) {
        Ok(())
    } else {
        Err(StatsError::InvalidBase { base })
    }
}

/// Sum out every variable not in `variables`. Repeated indices are kept once.
pub fn marginal(dist: &JointDistribution, variables: &[usize]) -> Result<Marginal, StatsError> {
    check_variables(dist, variables)?;
    let mut vars: Vec<usize> = Vec::with_capacity(variables.len());
    for &v in variables {
        if !vars.contains(&v) {
            vars.push(v);
        }
    }

    let catalog = dist.catalog();
    let cardinalities: Vec<usize> = vars
        .iter()
        .map(|&v| catalog.variables()[v].cardinality())
        .collect();
    let size: usize = cardinalities.iter().product();
    let mut probs = vec![0.0; size];

    for (linear, &p) in dist.probabilities().iter().enumerate() {
        if p == 0.0 {
            continue;
        }
        let idx = vars
            .iter()
            .zip(&cardinalities)
            .fold(0usize, |acc, (&v, &card)| {
                acc * card + catalog.state_of(linear, v)
            });
        probs[idx] += p;
    }

    Ok(Marginal {
        variables: vars,
        cardinalities,
        probs,
    })
}

/// Shannon entropy of the marginal over `variables`, or of the full joint
/// when `None`.
pub fn entropy(
    dist: &JointDistribution,
    variables: Option<&[usize]>,
    base: f64,
) -> Result<f64, StatsError> {
    check_base(base)?;
    match variables {
        None => Ok(probs_math::entropy(dist.probabilities(), base)),
        Some(vars) => {
            let m = marginal(dist, vars)?;
            Ok(probs_math::entropy(m.probabilities(), base))
        }
    }
}

/// `H(target | given) = H(target ∪ given) - H(given)`.
pub fn conditional_entropy(
    dist: &JointDistribution,
    target: &[usize],
    given: &[usize],
    base: f64,
) -> Result<f64, StatsError> {
    let union: Vec<usize> = target.iter().chain(given).copied().collect();
    let joint = entropy(dist, Some(&union), base)?;
    let cond = entropy(dist, Some(given), base)?;
    Ok(joint - cond)
}

/// `I(a; b) = H(a) + H(b) - H(a ∪ b)` under the default tolerance.
pub fn mutual_information(
    dist: &JointDistribution,
    a: &[usize],
    b: &[usize],
    base: f64,
) -> Result<f64, StatsError> {
    mutual_information_with(dist, a, b, base, Tolerances::default().mutual_information)
}

/// Mutual information; a value below `-tolerance` is reported, not clamped.
pub fn mutual_information_with(
    dist: &JointDistribution,
    a: &[usize],
    b: &[usize],
    base: f64,
    tolerance: f64,
) -> Result<f64, StatsError> {
    let union: Vec<usize> = a.iter().chain(b).copied().collect();
    let value = entropy(dist, Some(a), base)? + entropy(dist, Some(b), base)?
        - entropy(dist, Some(&union), base)?;
    if value < -tolerance {
        return Err(StatsError::NegativeMutualInformation { value, tolerance });
    }
    Ok(value)
}

/// 2×2 cells for a binary exposure and outcome. The "true" state is the
/// designated one when the labels define it, else index 1.
fn two_by_two(
    dist: &JointDistribution,
    exposure: usize,
    outcome: usize,
) -> Result<TwoByTwo, StatsError> {
    check_variables(dist, &[exposure, outcome])?;
    let (e_true, e_false) = binary_states(dist, exposure)?;
    let (d_true, d_false) = binary_states(dist, outcome)?;
    let cell = |e: usize, d: usize| dist.mass(&[(exposure, e), (outcome, d)]);
    Ok(TwoByTwo {
        a: cell(e_true, d_true),
        b: cell(e_true, d_false),
        c: cell(e_false, d_true),
        d: cell(e_false, d_false),
    })
}

fn binary_states(dist: &JointDistribution, variable: usize) -> Result<(usize, usize), StatsError> {
    let v = &dist.variables()[variable];
    if !v.is_binary() {
        return Err(StatsError::NonBinaryVariable {
            variable: v.name().to_string(),
            cardinality: v.cardinality(),
        });
    }
    Ok(v
        .default_states()
        .map(|d| (d.true_state, d.false_state))
        .unwrap_or((1, 0)))
}

/// Odds ratio `a·d / (b·c)`; `Undefined` on a zero denominator.
pub fn odds_ratio(
    dist: &JointDistribution,
    exposure: usize,
    outcome: usize,
) -> Result<Association, StatsError> {
    Ok(two_by_two(dist, exposure, outcome)?.odds_ratio())
}

/// Relative risk `(a/(a+b)) / (c/(c+d))`; `Undefined` on a zero denominator.
pub fn relative_risk(
    dist: &JointDistribution,
    exposure: usize,
    outcome: usize,
) -> Result<Association, StatsError> {
    Ok(two_by_two(dist, exposure, outcome)?.relative_risk())
}

/// Inverse-CDF sampler over the linear joint table.
#[derive(Debug, Clone)]
pub struct Sampler<'a> {
    dist: &'a JointDistribution,
    cumulative: Vec<f64>,
    last_positive: usize,
}

impl<'a> Sampler<'a> {
    pub fn new(dist: &'a JointDistribution) -> Self {
        let probs = dist.probabilities();
        let last_positive = probs.iter().rposition(|&p| p > 0.0).unwrap_or(0);
        Self {
            dist,
            cumulative: cumulative_sums(probs),
            last_positive,
        }
    }

    /// Draw one linear index.
    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        let target = rng.random::<f64>() * total;
        // rounding can leave the target at the very top of the table
        search_cumulative(&self.cumulative, target).unwrap_or(self.last_positive)
    }

    /// Draw one full assignment.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        self.dist.catalog().decode(self.sample_index(rng))
    }

    pub fn sample_n<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Vec<usize>> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}

/// Draw `n` independent assignments.
pub fn sample<R: Rng + ?Sized>(dist: &JointDistribution, n: usize, rng: &mut R) -> Vec<Vec<usize>> {
    let sampler = Sampler::new(dist);
    tracing::debug!(n, entries = dist.len(), "sampling joint distribution");
    sampler.sample_n(n, rng)
}
