//! GA problem definition for bus routing.
//!
//! Implements [`GaProblem`](u_metaheur::ga::GaProblem) over bus-structured
//! candidates, so the generic `u-metaheur` runner drives selection,
//! elitism and termination.
//!
//! # Operators
//!
//! - **Initialization**: the seed, then perturbed seeds, then randomized
//!   cheapest-insertion builds
//! - **Crossover**: [`splice_crossover`]
//! - **Mutation**: one random local edit via [`mutate`]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;
use tracing::debug;
use u_metaheur::ga::GaProblem;

use crate::evaluation::{FitnessEvaluator, Score};
use crate::hybrid::Budget;
use crate::models::Candidate;

use super::chromosome::Chromosome;
use super::operators::{mutate, perturb, random_insertion_build, splice_crossover};

/// GA problem for one optimization request.
///
/// The runner only checks its stop flag between generations; the problem
/// raises that flag from [`GaProblem::on_generation`] once `budget` is
/// exhausted or cancelled.
///
/// # Examples
///
/// ```
/// use u_busroute::builder::greedy_seed;
/// use u_busroute::evaluation::{FitnessEvaluator, FitnessWeights};
/// use u_busroute::ga::BusGaProblem;
/// use u_busroute::hybrid::Budget;
/// use u_busroute::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
/// use u_metaheur::ga::{GaConfig, GaRunner};
///
/// let stops = (0..6)
///     .map(|i| Stop::new(i, GeoPoint::new(12.97 + 0.01 * i as f64, 77.59), 3))
///     .collect();
/// let model = ProblemModel::new(stops, vec![Bus::new(1, 20)], ConstraintSet::default(), None);
/// let fitness = FitnessEvaluator::new(&model, FitnessWeights::default());
/// let budget = Budget::unlimited();
/// let problem = BusGaProblem::new(&fitness, greedy_seed(&model), 5, &budget);
///
/// let config = GaConfig::default()
///     .with_population_size(12)
///     .with_max_generations(20)
///     .with_seed(1);
/// let result = GaRunner::run(&problem, &config).expect("invalid GaConfig");
/// assert!(result.best_fitness.total < f64::INFINITY);
/// assert!(result.best.candidate().is_valid_partition(6));
/// ```
pub struct BusGaProblem<'a> {
    fitness: &'a FitnessEvaluator<'a>,
    seed: Candidate,
    perturbed: usize,
    created: AtomicUsize,
    budget: &'a Budget,
    stop: Arc<AtomicBool>,
}

impl<'a> BusGaProblem<'a> {
    /// Creates the problem. The first individual is `seed`, the next
    /// `perturbed` are edited copies of it.
    pub fn new(
        fitness: &'a FitnessEvaluator<'a>,
        seed: Candidate,
        perturbed: usize,
        budget: &'a Budget,
    ) -> Self {
        Self {
            fitness,
            seed,
            perturbed,
            created: AtomicUsize::new(0),
            budget,
            stop: Arc::new(AtomicBool::new(budget.is_exhausted())),
        }
    }

    /// Flag handed to the runner; set once the budget runs out.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}

impl GaProblem for BusGaProblem<'_> {
    type Individual = Chromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> Chromosome {
        let index = self.created.fetch_add(1, Ordering::Relaxed);
        let candidate = if index == 0 {
            self.seed.clone()
        } else if index <= self.perturbed {
            let edits = rng.random_range(1..=3);
            perturb(&self.seed, edits, rng)
        } else {
            random_insertion_build(self.fitness, rng)
        };
        Chromosome::unscored(candidate)
    }

    fn evaluate(&self, individual: &Chromosome) -> Score {
        self.fitness.score(individual.candidate())
    }

    fn crossover<R: Rng>(&self, p1: &Chromosome, p2: &Chromosome, rng: &mut R) -> Vec<Chromosome> {
        let child = splice_crossover(self.fitness, p1.candidate(), p2.candidate(), rng);
        vec![Chromosome::unscored(child)]
    }

    fn mutate<R: Rng>(&self, individual: &mut Chromosome, rng: &mut R) {
        if let Some(edited) = mutate(individual.candidate(), rng) {
            *individual = Chromosome::unscored(edited);
        }
    }

    fn on_generation(&self, generation: usize, best: Score) {
        debug!(generation, best = best.total, "ga generation");
        if self.budget.is_exhausted() {
            self.stop.store(true, Ordering::Relaxed);
        }
    }
}
