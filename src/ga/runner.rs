//! Budgeted GA runs.
//!
//! [`evolve`] hands a [`BusGaProblem`] to the `u-metaheur` runner and maps
//! its [`GaResult`](metaheur::GaResult) onto the run lifecycle used by the
//! controller.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use u_metaheur::ga as metaheur;

use crate::error::PartialReason;
use crate::evaluation::FitnessEvaluator;
use crate::hybrid::Budget;
use crate::models::Candidate;

use super::config::GaSettings;
use super::problem::BusGaProblem;
use super::Chromosome;

/// Lifecycle of one GA run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaState {
    /// Initial population built and scored.
    Initialized,
    /// Producing generations.
    Evolving,
    /// Stopped on plateau or generation cap.
    Converged,
    /// Stopped by deadline or cancellation.
    BudgetExhausted,
}

/// Why the evolutionary loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No improvement for `stagnation_limit` generations.
    Plateau,
    /// `max_generations` reached.
    GenerationCap,
    /// Wall-clock budget expired.
    Deadline,
    /// Cancelled by the caller.
    Cancelled,
}

impl Termination {
    /// The terminal state this reason leads to.
    pub fn state(self) -> GaState {
        match self {
            Termination::Plateau | Termination::GenerationCap => GaState::Converged,
            Termination::Deadline | Termination::Cancelled => GaState::BudgetExhausted,
        }
    }

    /// Partial-result reason, for budget terminations.
    pub fn partial_reason(self) -> Option<PartialReason> {
        match self {
            Termination::Deadline => Some(PartialReason::BudgetExhausted),
            Termination::Cancelled => Some(PartialReason::Cancelled),
            _ => None,
        }
    }
}

/// Outcome of [`evolve`].
#[derive(Debug, Clone)]
pub struct Evolution {
    /// Best individual of the run.
    pub best: Chromosome,
    /// Generations produced after the initial population.
    pub generations: usize,
    pub state: GaState,
    pub termination: Termination,
    /// Best score total after the initial population and after each
    /// generation; non-increasing.
    pub fitness_history: Vec<f64>,
}

impl Evolution {
    fn from_result(
        result: metaheur::GaResult<Chromosome>,
        budget: &Budget,
        max_generations: usize,
    ) -> Self {
        let stopped_early = result.cancelled || result.generations < max_generations;
        let termination = if result.stagnated {
            Termination::Plateau
        } else {
            match budget.stop_reason() {
                Some(PartialReason::Cancelled) if stopped_early => Termination::Cancelled,
                Some(_) if stopped_early => Termination::Deadline,
                _ if result.cancelled => Termination::Deadline,
                _ => Termination::GenerationCap,
            }
        };
        Self {
            best: result.best,
            generations: result.generations,
            state: termination.state(),
            termination,
            fitness_history: result.fitness_history,
        }
    }
}

/// Runs the genetic search from `seed` within `budget`.
///
/// The initial population holds the seed, perturbed copies of it, and
/// randomized insertion builds; the best individual is never worse than
/// the seed. The runner seed is drawn from `rng`, so equal `rng` states
/// give equal runs.
///
/// # Panics
///
/// Panics if `settings` fails [`GaSettings::validate`].
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use u_busroute::builder::greedy_seed;
/// use u_busroute::evaluation::{FitnessEvaluator, FitnessWeights};
/// use u_busroute::ga::{evolve, GaSettings};
/// use u_busroute::hybrid::Budget;
/// use u_busroute::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
///
/// let stops = (0..6).map(|i| Stop::new(i, GeoPoint::new(0.01 * (i % 2) as f64, 0.01 * i as f64), 3)).collect();
/// let model = ProblemModel::new(stops, vec![Bus::new(1, 10), Bus::new(2, 10)], ConstraintSet::default(), None);
/// let fitness = FitnessEvaluator::new(&model, FitnessWeights::default());
/// let seed = greedy_seed(&model);
/// let seed_score = fitness.score(&seed);
///
/// let settings = GaSettings::fast().with_parallel(false);
/// let result = evolve(&fitness, &seed, &settings, &Budget::unlimited(), &mut StdRng::seed_from_u64(3));
/// assert!(result.best.score().total <= seed_score.total);
/// ```
pub fn evolve<R: Rng>(
    fitness: &FitnessEvaluator<'_>,
    seed: &Candidate,
    settings: &GaSettings,
    budget: &Budget,
    rng: &mut R,
) -> Evolution {
    let config = settings.runner_config(rng.random(), budget.remaining());
    let problem = BusGaProblem::new(fitness, seed.clone(), settings.perturbed_count(), budget);
    let result = metaheur::GaRunner::run_with_cancel(&problem, &config, Some(problem.stop_flag()))
        .expect("invalid GaConfig");
    let evolution = Evolution::from_result(result, budget, settings.max_generations);
    info!(
        generations = evolution.generations,
        termination = ?evolution.termination,
        best = evolution.best.score().total,
        "ga finished"
    );
    evolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::greedy_seed;
    use crate::evaluation::FitnessWeights;
    use crate::hybrid::CancelToken;
    use crate::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn model() -> ProblemModel {
        let stops = (0..12)
            .map(|i| {
                let angle = i as f64 * 0.52;
                Stop::new(
                    i as u64,
                    GeoPoint::new(12.97 + 0.03 * angle.sin(), 77.59 + 0.03 * angle.cos()),
                    2 + (i % 4) as u32,
                )
            })
            .collect();
        ProblemModel::new(
            stops,
            vec![Bus::new(1, 20), Bus::new(2, 20), Bus::new(3, 20)],
            ConstraintSet::default(),
            None,
        )
    }

    fn settings() -> GaSettings {
        GaSettings::default()
            .with_population_size(20)
            .with_max_generations(30)
            .with_parallel(false)
    }

    #[test]
    fn test_history_monotone_and_not_worse_than_seed() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let seed = greedy_seed(&m);
        let mut rng = StdRng::seed_from_u64(42);
        let result = evolve(&f, &seed, &settings(), &Budget::unlimited(), &mut rng);

        for w in result.fitness_history.windows(2) {
            assert!(w[1] <= w[0], "history increased: {} > {}", w[1], w[0]);
        }
        assert_eq!(result.fitness_history.len(), result.generations + 1);
        assert!(result.best.score().total <= f.score(&seed).total);
        assert!(result.best.candidate().is_valid_partition(12));
        assert_eq!(result.state, GaState::Converged);
    }

    #[test]
    fn test_plateau_termination() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let seed = greedy_seed(&m);
        let cfg = settings().with_max_generations(10_000).with_stagnation_limit(5);
        let mut rng = StdRng::seed_from_u64(8);
        let result = evolve(&f, &seed, &cfg, &Budget::unlimited(), &mut rng);
        assert_eq!(result.termination, Termination::Plateau);
        assert!(result.generations < 10_000);
    }

    #[test]
    fn test_generation_cap() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let seed = greedy_seed(&m);
        let cfg = settings().with_max_generations(3).with_stagnation_limit(0);
        let result = evolve(&f, &seed, &cfg, &Budget::unlimited(), &mut StdRng::seed_from_u64(2));
        assert_eq!(result.termination, Termination::GenerationCap);
        assert_eq!(result.generations, 3);
        assert_eq!(result.termination.partial_reason(), None);
    }

    #[test]
    fn test_expired_budget_returns_seed_quality() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let seed = greedy_seed(&m);
        let budget = Budget::with_time_limit(Duration::ZERO, CancelToken::new());
        let mut rng = StdRng::seed_from_u64(8);
        let result = evolve(&f, &seed, &settings(), &budget, &mut rng);
        assert_eq!(result.termination, Termination::Deadline);
        assert_eq!(result.state, GaState::BudgetExhausted);
        assert_eq!(result.generations, 0);
        assert!(result.best.score().total <= f.score(&seed).total);
    }

    #[test]
    fn test_cancellation() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let seed = greedy_seed(&m);
        let token = CancelToken::new();
        token.cancel();
        let budget = Budget::with_time_limit(Duration::from_secs(60), token);
        let mut rng = StdRng::seed_from_u64(8);
        let result = evolve(&f, &seed, &settings(), &budget, &mut rng);
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.termination.partial_reason(), Some(PartialReason::Cancelled));
        assert_eq!(result.generations, 0);
    }

    #[test]
    fn test_reproducible_with_seed() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let seed = greedy_seed(&m);
        let run = || {
            evolve(
                &f,
                &seed,
                &settings(),
                &Budget::unlimited(),
                &mut StdRng::seed_from_u64(99),
            )
        };
        let (a, b) = (run(), run());
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.best.candidate(), b.best.candidate());
    }
}
