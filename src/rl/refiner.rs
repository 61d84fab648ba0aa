//! Policy-guided refinement of a finished candidate.
//!
//! Each step samples a handful of random edits, scores them with the
//! current [`PolicySnapshot`], and picks one ε-greedily. The chosen edit is
//! evaluated exactly and kept only if it does not worsen fitness beyond a
//! small tolerance. The best candidate seen is returned, and only when it
//! strictly beats the input.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::features::{features, Context, FEATURE_DIM};
use super::policy::{LearningRates, PolicySnapshot, ValueStore};
use super::replay::Experience;
use crate::error::{ConfigError, PartialReason};
use crate::evaluation::{FitnessEvaluator, Score};
use crate::hybrid::Budget;
use crate::local_search::{random_any_move, Move};
use crate::models::Candidate;

/// Whether applied edits update the shared policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    /// Read-only: the policy is never modified.
    #[default]
    Frozen,
    /// Every evaluated edit contributes one experience.
    Online,
}

/// Refiner parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    /// Maximum refinement steps.
    pub max_steps: usize,
    /// Edits sampled per step.
    pub candidates_per_step: usize,
    /// Relative worsening still accepted, as a fraction of the starting score.
    pub tolerance: f64,
    /// Steps without a new best before stopping; 0 disables.
    pub patience: usize,
    /// Learning mode.
    pub learning: LearningMode,
    /// Gradient step size.
    pub learning_rate: f64,
    /// Bound on the TD error per step.
    pub error_clip: f64,
    /// Replay minibatch size.
    pub batch_size: usize,
    /// Epsilon decay per replay update.
    pub epsilon_decay: f64,
    /// Epsilon floor.
    pub epsilon_min: f64,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            candidates_per_step: 8,
            tolerance: 1e-3,
            patience: 60,
            learning: LearningMode::Frozen,
            learning_rate: 0.001,
            error_clip: 1.0,
            batch_size: 32,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
        }
    }
}

impl RefinerConfig {
    /// Sets the step limit.
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    /// Sets the number of edits sampled per step.
    pub fn with_candidates_per_step(mut self, k: usize) -> Self {
        self.candidates_per_step = k;
        self
    }

    /// Sets the acceptance tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the learning mode.
    pub fn with_learning(mut self, mode: LearningMode) -> Self {
        self.learning = mode;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates_per_step == 0 {
            return Err(ConfigError::invalid("candidates_per_step", "must be positive"));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ConfigError::invalid(
                "tolerance",
                format!("must be finite and non-negative, got {}", self.tolerance),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::invalid("learning_rate", "must be positive"));
        }
        if self.error_clip.is_nan() || self.error_clip <= 0.0 {
            return Err(ConfigError::invalid("error_clip", "must be positive"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_decay) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(ConfigError::invalid(
                "epsilon_decay",
                "epsilon parameters must be in [0, 1]",
            ));
        }
        Ok(())
    }

    fn rates(&self) -> LearningRates {
        LearningRates {
            learning_rate: self.learning_rate,
            error_clip: self.error_clip,
            batch_size: self.batch_size,
            epsilon_decay: self.epsilon_decay,
            epsilon_min: self.epsilon_min,
        }
    }
}

/// Outcome of one refinement pass.
#[derive(Debug, Clone)]
pub struct RefineResult {
    /// Returned candidate: the best found, or the input unchanged.
    pub candidate: Candidate,
    /// Its score.
    pub score: Score,
    /// Steps executed.
    pub steps: usize,
    /// Edits accepted along the way.
    pub accepted: usize,
    /// `true` if the returned candidate strictly beats the input.
    pub improved: bool,
    /// Set when the budget or a cancellation cut the pass short.
    pub stopped: Option<PartialReason>,
    /// Version of the policy the pass read.
    pub policy_version: u64,
}

/// Policy-guided refiner bound to a [`ValueStore`].
#[derive(Debug, Clone)]
pub struct Refiner<'s> {
    config: RefinerConfig,
    store: &'s ValueStore,
}

impl<'s> Refiner<'s> {
    /// Creates a refiner reading and, in online mode, updating `store`.
    pub fn new(config: RefinerConfig, store: &'s ValueStore) -> Self {
        Self { config, store }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RefinerConfig {
        &self.config
    }

    /// Refines `input`, never returning anything worse than it.
    pub fn refine<R: Rng>(
        &self,
        fitness: &FitnessEvaluator<'_>,
        input: &Candidate,
        context: &Context,
        budget: &Budget,
        rng: &mut R,
    ) -> RefineResult {
        let policy = self.store.snapshot();
        let input_score = fitness.score(input);
        let band = self.config.tolerance * input_score.total.abs().max(1e-9);
        let norm = input_score.total.abs().max(1e-9);
        let rates = self.config.rates();

        let mut current = input.clone();
        let mut current_score = input_score;
        let mut best = input.clone();
        let mut best_score = input_score;
        let mut steps = 0;
        let mut accepted = 0;
        let mut idle = 0;
        let mut stopped = None;

        while steps < self.config.max_steps {
            if let Some(reason) = budget.stop_reason() {
                stopped = Some(reason);
                break;
            }
            let Some((mv, next, feats)) =
                self.choose(fitness, &policy, context, &current, rng)
            else {
                break;
            };
            steps += 1;

            let next_score = fitness.score(&next);
            let delta = next_score.total - current_score.total;
            if self.config.learning == LearningMode::Online {
                let exp = Experience {
                    kind: mv.kind(),
                    features: feats,
                    reward: -delta / norm,
                };
                self.store.learn(exp, &rates, rng);
            }

            if delta <= band {
                trace!(step = steps, kind = mv.kind().name(), delta, "edit accepted");
                current = next;
                current_score = next_score;
                accepted += 1;
                if current_score.is_better_than(&best_score) {
                    best = current.clone();
                    best_score = current_score;
                    idle = 0;
                    continue;
                }
            }
            idle += 1;
            if self.config.patience > 0 && idle >= self.config.patience {
                break;
            }
        }

        let improved = best_score.is_better_than(&input_score);
        if improved {
            debug!(
                steps,
                accepted,
                from = input_score.total,
                to = best_score.total,
                "refinement improved candidate"
            );
            RefineResult {
                candidate: best,
                score: best_score,
                steps,
                accepted,
                improved,
                stopped,
                policy_version: policy.version(),
            }
        } else {
            debug!(steps, accepted, "refinement rejected; keeping input");
            RefineResult {
                candidate: input.clone(),
                score: input_score,
                steps,
                accepted,
                improved,
                stopped,
                policy_version: policy.version(),
            }
        }
    }

    /// Samples edits and picks one ε-greedily by estimated value.
    fn choose<R: Rng>(
        &self,
        fitness: &FitnessEvaluator<'_>,
        policy: &PolicySnapshot,
        context: &Context,
        current: &Candidate,
        rng: &mut R,
    ) -> Option<(Move, Candidate, [f64; FEATURE_DIM])> {
        let problem = fitness.problem();
        let mut options = Vec::with_capacity(self.config.candidates_per_step);
        for _ in 0..self.config.candidates_per_step {
            let Some(mv) = random_any_move(current, rng) else {
                break;
            };
            if let Some(next) = mv.apply(current) {
                let f = features(problem, context, current, &next, &mv);
                options.push((mv, next, f));
            }
        }
        if options.is_empty() {
            return None;
        }
        let pick = if rng.random::<f64>() < policy.epsilon() {
            rng.random_range(0..options.len())
        } else {
            let mut best = 0;
            let mut best_q = f64::NEG_INFINITY;
            for (i, (mv, _, f)) in options.iter().enumerate() {
                let q = policy.q_value(mv.kind(), f);
                if q > best_q {
                    best_q = q;
                    best = i;
                }
            }
            best
        };
        Some(options.swap_remove(pick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::FitnessWeights;
    use crate::hybrid::CancelToken;
    use crate::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> ProblemModel {
        let stops = (0..8)
            .map(|i| Stop::new(i, GeoPoint::new(0.0, 0.01 * i as f64), 2))
            .collect();
        ProblemModel::new(
            stops,
            vec![Bus::new(1, 20), Bus::new(2, 20)],
            ConstraintSet::default(),
            Some(GeoPoint::new(0.0, 0.0)),
        )
    }

    fn scrambled() -> Candidate {
        Candidate::from_sequences(vec![vec![7, 0, 5, 2], vec![3, 6, 1, 4]], vec![])
    }

    #[test]
    fn test_refine_never_worse() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let store = ValueStore::default();
        let refiner = Refiner::new(RefinerConfig::default(), &store);
        let input = scrambled();
        let before = f.score(&input);
        for seed in 0..5 {
            let out = refiner.refine(
                &f,
                &input,
                &Context::default(),
                &Budget::unlimited(),
                &mut StdRng::seed_from_u64(seed),
            );
            assert_eq!(out.score.is_better_than(&before), out.improved);
            assert!(out.score.total <= before.total);
            assert!(out.candidate.is_valid_partition(8));
        }
    }

    #[test]
    fn test_refine_improves_scrambled() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let store = ValueStore::default();
        let refiner = Refiner::new(RefinerConfig::default().with_max_steps(400), &store);
        let out = refiner.refine(
            &f,
            &scrambled(),
            &Context::default(),
            &Budget::unlimited(),
            &mut StdRng::seed_from_u64(42),
        );
        assert!(out.improved);
        assert!(out.accepted > 0);
    }

    #[test]
    fn test_unimprovable_returns_input() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let store = ValueStore::default();
        let refiner = Refiner::new(RefinerConfig::default(), &store);
        let single = Candidate::from_sequences(vec![(0..8).collect(), vec![]], vec![]);
        let trivial = Candidate::from_sequences(vec![vec![0]], vec![]);
        let one = ProblemModel::new(
            vec![Stop::new(0, GeoPoint::new(0.0, 0.0), 1)],
            vec![Bus::new(1, 5)],
            ConstraintSet::default(),
            None,
        );
        let f1 = FitnessEvaluator::new(&one, FitnessWeights::default());
        let out = refiner.refine(
            &f1,
            &trivial,
            &Context::default(),
            &Budget::unlimited(),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(out.candidate, trivial);
        assert_eq!(out.steps, 0);
        assert!(!out.improved);

        let out = refiner.refine(
            &f,
            &single,
            &Context::default(),
            &Budget::unlimited(),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(out.score.total <= f.score(&single).total);
    }

    #[test]
    fn test_cancelled_refine_returns_input() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let store = ValueStore::default();
        let refiner = Refiner::new(RefinerConfig::default(), &store);
        let token = CancelToken::new();
        token.cancel();
        let budget = Budget::with_time_limit(std::time::Duration::from_secs(60), token);
        let out = refiner.refine(
            &f,
            &scrambled(),
            &Context::default(),
            &budget,
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(out.stopped, Some(PartialReason::Cancelled));
        assert_eq!(out.candidate, scrambled());
        assert_eq!(out.steps, 0);
    }

    #[test]
    fn test_frozen_mode_leaves_store_untouched() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let store = ValueStore::default();
        Refiner::new(RefinerConfig::default(), &store).refine(
            &f,
            &scrambled(),
            &Context::default(),
            &Budget::unlimited(),
            &mut StdRng::seed_from_u64(2),
        );
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_online_mode_updates_store() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let store = ValueStore::default();
        let config = RefinerConfig::default()
            .with_learning(LearningMode::Online)
            .with_max_steps(50);
        let out = Refiner::new(config, &store).refine(
            &f,
            &scrambled(),
            &Context::default(),
            &Budget::unlimited(),
            &mut StdRng::seed_from_u64(3),
        );
        assert_eq!(out.policy_version, 0);
        assert_eq!(store.version(), out.steps as u64);
        assert!(store.snapshot().epsilon() < 1.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(RefinerConfig::default().validate().is_ok());
        assert!(RefinerConfig::default()
            .with_candidates_per_step(0)
            .validate()
            .is_err());
        assert!(RefinerConfig::default().with_tolerance(-1.0).validate().is_err());
    }
}
