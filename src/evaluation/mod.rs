//! Route and candidate evaluation.
//!
//! [`RouteEvaluator`] walks one bus sequence and reports timing, load and
//! constraint violations; [`FitnessEvaluator`] folds those into the
//! multi-objective score every search phase minimizes.

mod evaluator;
mod fitness;

pub use evaluator::{RouteEvaluator, RouteMetrics};
pub use fitness::{
    Evaluation, Factor, FactorBreakdown, FitnessEvaluator, FitnessWeights, Score, Totals,
};
