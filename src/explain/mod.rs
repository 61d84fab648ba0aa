//! Explanations of a final score.
//!
//! Two methods are available:
//!
//! - **Decomposition**: exact per-factor delta between the seed and the
//!   final candidate. Deterministic; contributions sum to the score change.
//! - **Perturbation**: a kernel-weighted ridge surrogate fitted on random
//!   neighbours of the final candidate. Reproducible for a fixed seed.
//!
//! Both report a ranked list of [`Attribution`]s and a [`Narrative`].

mod decomposition;
mod narrative;
mod perturbation;

pub use decomposition::decompose;
pub use narrative::{
    counterfactual, narrate, utilization, Counterfactual, DecisionStep, Difficulty, Metric,
    Narrative, DISTANCE_TARGET_KM, TIME_TARGET_MIN, UTILIZATION_TARGET,
};
pub use perturbation::{perturbation, Surrogate};

use serde::{Deserialize, Serialize};

use crate::api::{ExplainMode, ExplainRequest};
use crate::error::ConfigError;
use crate::evaluation::FitnessEvaluator;
use crate::models::Candidate;
use crate::rl::Context;

/// Sign of a contribution to the score (lower score is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Raises the score, making the result worse.
    Increases,
    /// Lowers the score, making the result better.
    Decreases,
}

/// One feature and its signed effect on the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Factor or perturbation feature name.
    pub feature: String,
    /// Signed contribution.
    pub contribution: f64,
    /// Absolute contribution.
    pub magnitude: f64,
    /// Sign of the contribution.
    pub direction: Direction,
}

impl Attribution {
    /// Creates an attribution from a signed contribution.
    pub fn new(feature: impl Into<String>, contribution: f64) -> Self {
        Self {
            feature: feature.into(),
            contribution,
            magnitude: contribution.abs(),
            direction: if contribution > 0.0 {
                Direction::Increases
            } else {
                Direction::Decreases
            },
        }
    }
}

/// Orders by descending magnitude, ties by name.
fn rank(attributions: &mut [Attribution]) {
    attributions.sort_by(|a, b| {
        b.magnitude
            .total_cmp(&a.magnitude)
            .then_with(|| a.feature.cmp(&b.feature))
    });
}

/// Explanation payload attached to a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Method used.
    pub mode: ExplainMode,
    /// Score of the seed candidate.
    pub baseline_score: f64,
    /// Score of the final candidate.
    pub final_score: f64,
    /// `final_score - baseline_score`.
    pub total_delta: f64,
    /// Ranked attributions.
    pub attributions: Vec<Attribution>,
    /// Weighted R² of the surrogate; perturbation mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
    /// Neighbours evaluated; zero in decomposition mode.
    pub samples: usize,
    /// Text summary.
    pub narrative: Narrative,
}

/// Explainer defaults, overridable per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    /// Perturbed neighbours per explanation.
    pub samples: usize,
    /// Sampling seed when the request does not give one.
    pub seed: u64,
    /// Maximum random edits per neighbour.
    pub max_edits: usize,
    /// Kernel width over the normalized edit count.
    pub kernel_width: f64,
    /// Ridge penalty on the slope coefficients.
    pub ridge_lambda: f64,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            samples: 64,
            seed: 0,
            max_edits: 3,
            kernel_width: 0.75,
            ridge_lambda: 1e-3,
        }
    }
}

impl ExplainConfig {
    /// Sets the sample count.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Sets the default sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_edits == 0 {
            return Err(ConfigError::invalid("max_edits", "must be positive"));
        }
        if !(self.kernel_width > 0.0 && self.kernel_width.is_finite()) {
            return Err(ConfigError::invalid(
                "kernel_width",
                format!("must be positive, got {}", self.kernel_width),
            ));
        }
        if !(self.ridge_lambda >= 0.0 && self.ridge_lambda.is_finite()) {
            return Err(ConfigError::invalid(
                "ridge_lambda",
                format!("must be non-negative, got {}", self.ridge_lambda),
            ));
        }
        Ok(())
    }
}

/// Explains how `final_candidate` scores relative to `seed`.
///
/// # Examples
///
/// ```
/// use u_busroute::api::ExplainRequest;
/// use u_busroute::evaluation::{FitnessEvaluator, FitnessWeights};
/// use u_busroute::explain::{explain, ExplainConfig};
/// use u_busroute::models::{Bus, Candidate, ConstraintSet, GeoPoint, ProblemModel, Stop};
/// use u_busroute::rl::Context;
///
/// let stops = (0..3).map(|i| Stop::new(i, GeoPoint::new(0.0, 0.01 * i as f64), 2)).collect();
/// let model = ProblemModel::new(stops, vec![Bus::new(1, 10)], ConstraintSet::default(), None);
/// let fitness = FitnessEvaluator::new(&model, FitnessWeights::default());
///
/// let seed = Candidate::from_sequences(vec![vec![2, 0, 1]], vec![]);
/// let best = Candidate::from_sequences(vec![vec![0, 1, 2]], vec![]);
/// let e = explain(&fitness, &seed, &best, &ExplainRequest::default(), &ExplainConfig::default(), &Context::default());
/// let sum: f64 = e.attributions.iter().map(|a| a.contribution).sum();
/// assert!((sum - e.total_delta).abs() < 1e-9);
/// assert!(e.total_delta < 0.0);
/// ```
pub fn explain(
    fitness: &FitnessEvaluator<'_>,
    seed: &Candidate,
    final_candidate: &Candidate,
    request: &ExplainRequest,
    config: &ExplainConfig,
    context: &Context,
) -> Explanation {
    let before = fitness.evaluate(seed);
    let after = fitness.evaluate(final_candidate);
    let narrative = narrate(fitness.problem(), final_candidate, &after, context);

    let (attributions, r_squared, samples) = match request.mode {
        ExplainMode::Decomposition => (decompose(&before, &after), None, 0),
        ExplainMode::Perturbation => {
            let surrogate = perturbation(
                fitness,
                final_candidate,
                request.samples.unwrap_or(config.samples),
                request.seed.unwrap_or(config.seed),
                config,
            );
            (surrogate.attributions, surrogate.r_squared, surrogate.samples)
        }
    };

    Explanation {
        mode: request.mode,
        baseline_score: before.score.total,
        final_score: after.score.total,
        total_delta: after.score.total - before.score.total,
        attributions,
        r_squared,
        samples,
        narrative,
    }
}
