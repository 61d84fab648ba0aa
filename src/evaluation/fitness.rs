//! Multi-objective fitness: weighted travel objectives plus feasibility
//! penalties, with an additive per-factor breakdown.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{Candidate, ProblemModel};

use super::{RouteEvaluator, RouteMetrics};

/// Weights of the fitness function.
///
/// The objective weights apply per km, per minute and per litre. The
/// penalties apply per overflowing rider (`capacity_penalty`) and per km or
/// minute beyond a route limit, per minute of lateness, and per unassigned
/// rider (`constraint_penalty`).
///
/// # Examples
///
/// ```
/// use u_busroute::evaluation::FitnessWeights;
///
/// let w = FitnessWeights::default().with_distance_weight(0.5);
/// assert!(w.validate().is_ok());
/// assert!(FitnessWeights::default().with_capacity_penalty(-1.0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Weight per kilometre.
    pub distance_weight: f64,
    /// Weight per route minute.
    pub time_weight: f64,
    /// Weight per litre of fuel.
    pub fuel_weight: f64,
    /// Penalty per rider above capacity.
    pub capacity_penalty: f64,
    /// Penalty per unit of route-limit excess, lateness minute, or
    /// unassigned rider.
    pub constraint_penalty: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            distance_weight: 0.4,
            time_weight: 0.3,
            fuel_weight: 0.3,
            capacity_penalty: 1000.0,
            constraint_penalty: 1000.0,
        }
    }
}

impl FitnessWeights {
    /// Sets the distance weight.
    pub fn with_distance_weight(mut self, w: f64) -> Self {
        self.distance_weight = w;
        self
    }

    /// Sets the time weight.
    pub fn with_time_weight(mut self, w: f64) -> Self {
        self.time_weight = w;
        self
    }

    /// Sets the fuel weight.
    pub fn with_fuel_weight(mut self, w: f64) -> Self {
        self.fuel_weight = w;
        self
    }

    /// Sets the capacity penalty.
    pub fn with_capacity_penalty(mut self, p: f64) -> Self {
        self.capacity_penalty = p;
        self
    }

    /// Sets the constraint penalty.
    pub fn with_constraint_penalty(mut self, p: f64) -> Self {
        self.constraint_penalty = p;
        self
    }

    /// Checks that every weight is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("distance_weight", self.distance_weight),
            ("time_weight", self.time_weight),
            ("fuel_weight", self.fuel_weight),
            ("capacity_penalty", self.capacity_penalty),
            ("constraint_penalty", self.constraint_penalty),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    name,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// One additive term of the fitness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// Weighted kilometres.
    Distance,
    /// Weighted route minutes.
    Time,
    /// Weighted litres.
    Fuel,
    /// Capacity overflow penalty.
    CapacitySlack,
    /// Route distance/duration limit penalty.
    RouteLimitSlack,
    /// Time-window lateness penalty.
    TimeWindowSlack,
    /// Unassigned-rider penalty.
    Coverage,
}

impl Factor {
    /// Every factor, in breakdown order.
    pub const ALL: [Factor; 7] = [
        Factor::Distance,
        Factor::Time,
        Factor::Fuel,
        Factor::CapacitySlack,
        Factor::RouteLimitSlack,
        Factor::TimeWindowSlack,
        Factor::Coverage,
    ];

    /// Stable snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            Factor::Distance => "distance",
            Factor::Time => "time",
            Factor::Fuel => "fuel",
            Factor::CapacitySlack => "capacity_slack",
            Factor::RouteLimitSlack => "route_limit_slack",
            Factor::TimeWindowSlack => "time_window_slack",
            Factor::Coverage => "coverage",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weighted contribution of each [`Factor`]; the score total is their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    values: [f64; 7],
}

impl FactorBreakdown {
    /// Contribution of one factor.
    pub fn get(&self, factor: Factor) -> f64 {
        self.values[factor.index()]
    }

    fn add(&mut self, factor: Factor, value: f64) {
        self.values[factor.index()] += value;
    }

    /// Sum of all contributions.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// `(factor, contribution)` pairs in breakdown order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        Factor::ALL.iter().map(move |&f| (f, self.get(f)))
    }

    /// Per-factor difference `self - baseline`.
    pub fn delta(&self, baseline: &FactorBreakdown) -> FactorBreakdown {
        let mut values = [0.0; 7];
        for (i, v) in values.iter_mut().enumerate() {
            *v = self.values[i] - baseline.values[i];
        }
        FactorBreakdown { values }
    }
}

/// Unweighted totals over a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Kilometres over all routes.
    pub distance_km: f64,
    /// Route minutes over all routes.
    pub minutes: f64,
    /// Fuel litres over all routes.
    pub fuel_litres: f64,
    /// Riders above capacity, summed over buses.
    pub overflow_riders: u64,
    /// Kilometres above route limits.
    pub excess_km: f64,
    /// Minutes above route limits.
    pub excess_minutes: f64,
    /// Minutes of time-window lateness.
    pub lateness_minutes: f64,
    /// Riders at unassigned stops.
    pub unassigned_riders: u64,
}

impl Totals {
    /// Returns `true` if no hard constraint is violated and every stop is
    /// served.
    pub fn is_feasible(&self) -> bool {
        self.overflow_riders == 0
            && self.excess_km <= 0.0
            && self.excess_minutes <= 0.0
            && self.lateness_minutes <= 0.0
            && self.unassigned_riders == 0
    }
}

/// Comparable fitness value; lower is better.
///
/// Ordered by total, then by raw distance, then by stop-count variance
/// across buses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Weighted total.
    pub total: f64,
    /// Raw kilometres.
    pub distance_km: f64,
    /// Variance of stops per bus.
    pub stop_variance: f64,
}

impl Score {
    /// Total order over scores.
    pub fn compare(&self, other: &Score) -> Ordering {
        self.total
            .total_cmp(&other.total)
            .then_with(|| self.distance_km.total_cmp(&other.distance_km))
            .then_with(|| self.stop_variance.total_cmp(&other.stop_variance))
    }

    /// Returns `true` if `self` is strictly better than `other`.
    pub fn is_better_than(&self, other: &Score) -> bool {
        self.compare(other) == Ordering::Less
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

/// Full result of evaluating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Comparable score.
    pub score: Score,
    /// Weighted per-factor contributions; sums to `score.total`.
    pub breakdown: FactorBreakdown,
    /// Unweighted totals.
    pub totals: Totals,
    /// Per-bus metrics, indexed like the candidate's sequences.
    pub routes: Vec<RouteMetrics>,
}

/// Pure fitness function over candidates of one problem.
///
/// # Examples
///
/// ```
/// use u_busroute::evaluation::{FitnessEvaluator, FitnessWeights, Factor};
/// use u_busroute::models::{Bus, Candidate, ConstraintSet, GeoPoint, ProblemModel, Stop};
///
/// let stops = vec![
///     Stop::new(1, GeoPoint::new(0.0, 0.0), 30),
///     Stop::new(2, GeoPoint::new(0.0, 0.05), 30),
/// ];
/// let model = ProblemModel::new(stops, vec![Bus::new(1, 40)], ConstraintSet::default(), None);
/// let fitness = FitnessEvaluator::new(&model, FitnessWeights::default());
///
/// let eval = fitness.evaluate(&Candidate::from_sequences(vec![vec![0, 1]], vec![]));
/// assert_eq!(eval.totals.overflow_riders, 20);
/// assert_eq!(eval.breakdown.get(Factor::CapacitySlack), 20_000.0);
/// assert!((eval.breakdown.total() - eval.score.total).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct FitnessEvaluator<'a> {
    problem: &'a ProblemModel,
    weights: FitnessWeights,
}

impl<'a> FitnessEvaluator<'a> {
    /// Creates an evaluator.
    pub fn new(problem: &'a ProblemModel, weights: FitnessWeights) -> Self {
        Self { problem, weights }
    }

    /// The problem being evaluated.
    pub fn problem(&self) -> &'a ProblemModel {
        self.problem
    }

    /// Fitness weights in use.
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Evaluates a candidate.
    pub fn evaluate(&self, candidate: &Candidate) -> Evaluation {
        let evaluator = RouteEvaluator::new(self.problem);
        let w = &self.weights;
        let mut breakdown = FactorBreakdown::default();
        let mut totals = Totals::default();
        let mut routes = Vec::with_capacity(candidate.num_buses());

        for (bus, seq) in candidate.sequences().iter().enumerate() {
            let m = evaluator.metrics(bus, seq);
            totals.distance_km += m.distance_km;
            totals.minutes += m.duration_minutes;
            totals.fuel_litres += m.fuel_litres;
            totals.overflow_riders += u64::from(m.overflow);
            totals.excess_km += m.excess_km;
            totals.excess_minutes += m.excess_minutes;
            totals.lateness_minutes += m.lateness_minutes;
            routes.push(m);
        }
        totals.unassigned_riders = candidate
            .unassigned()
            .iter()
            .map(|&s| u64::from(self.problem.riders(s)))
            .sum();

        breakdown.add(Factor::Distance, w.distance_weight * totals.distance_km);
        breakdown.add(Factor::Time, w.time_weight * totals.minutes);
        breakdown.add(Factor::Fuel, w.fuel_weight * totals.fuel_litres);
        breakdown.add(
            Factor::CapacitySlack,
            w.capacity_penalty * totals.overflow_riders as f64,
        );
        breakdown.add(
            Factor::RouteLimitSlack,
            w.constraint_penalty * (totals.excess_km + totals.excess_minutes),
        );
        breakdown.add(
            Factor::TimeWindowSlack,
            w.constraint_penalty * totals.lateness_minutes,
        );
        breakdown.add(
            Factor::Coverage,
            w.constraint_penalty * totals.unassigned_riders as f64,
        );

        Evaluation {
            score: Score {
                total: breakdown.total(),
                distance_km: totals.distance_km,
                stop_variance: stop_variance(candidate),
            },
            breakdown,
            totals,
            routes,
        }
    }

    /// Score of a candidate.
    pub fn score(&self, candidate: &Candidate) -> Score {
        self.evaluate(candidate).score
    }

    /// This route's share of the weighted total.
    pub fn route_score(&self, metrics: &RouteMetrics) -> f64 {
        let w = &self.weights;
        w.distance_weight * metrics.distance_km
            + w.time_weight * metrics.duration_minutes
            + w.fuel_weight * metrics.fuel_litres
            + w.capacity_penalty * f64::from(metrics.overflow)
            + w.constraint_penalty
                * (metrics.excess_km + metrics.excess_minutes + metrics.lateness_minutes)
    }

    /// Scores a batch of candidates, in parallel when the `parallel`
    /// feature is enabled.
    pub fn score_all(&self, candidates: &[Candidate]) -> Vec<Score> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            candidates.par_iter().map(|c| self.score(c)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            candidates.iter().map(|c| self.score(c)).collect()
        }
    }
}

fn stop_variance(candidate: &Candidate) -> f64 {
    let n = candidate.num_buses();
    if n == 0 {
        return 0.0;
    }
    let counts: Vec<f64> = candidate.sequences().iter().map(|s| s.len() as f64).collect();
    let mean = counts.iter().sum::<f64>() / n as f64;
    counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bus, ConstraintSet, GeoPoint, Stop, TimeWindow};

    fn model() -> ProblemModel {
        let stops = vec![
            Stop::new(1, GeoPoint::new(0.0, 0.0), 5),
            Stop::new(2, GeoPoint::new(0.0, 0.05), 8),
            Stop::new(3, GeoPoint::new(0.05, 0.05), 6),
            Stop::new(4, GeoPoint::new(0.05, 0.0), 7),
        ];
        ProblemModel::new(
            stops,
            vec![Bus::new(1, 20), Bus::new(2, 20)],
            ConstraintSet::default(),
            None,
        )
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let e = f.evaluate(&Candidate::from_sequences(vec![vec![0, 1], vec![2, 3]], vec![]));
        assert!((e.breakdown.total() - e.score.total).abs() < 1e-9);
        assert!(e.totals.is_feasible());
        assert_eq!(e.breakdown.get(Factor::CapacitySlack), 0.0);
        assert_eq!(e.routes.len(), 2);
    }

    #[test]
    fn test_objective_weights() {
        let m = model();
        let w = FitnessWeights::default();
        let f = FitnessEvaluator::new(&m, w.clone());
        let e = f.evaluate(&Candidate::from_sequences(vec![vec![0, 1, 2], vec![3]], vec![]));
        assert!((e.breakdown.get(Factor::Distance) - 0.4 * e.totals.distance_km).abs() < 1e-9);
        assert!((e.breakdown.get(Factor::Time) - 0.3 * e.totals.minutes).abs() < 1e-9);
        assert!((e.totals.fuel_litres - e.totals.distance_km / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_unassigned_penalized_per_rider() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let e = f.evaluate(&Candidate::from_sequences(vec![vec![0, 1], vec![2]], vec![3]));
        assert_eq!(e.totals.unassigned_riders, 7);
        assert_eq!(e.breakdown.get(Factor::Coverage), 7000.0);
        assert!(!e.totals.is_feasible());
    }

    #[test]
    fn test_lateness_penalized() {
        let mut stops = model().stops().to_vec();
        stops[1] = stops[1]
            .clone()
            .with_time_window(TimeWindow::new(0.0, 425.0).expect("valid"));
        let m = ProblemModel::new(stops, vec![Bus::new(1, 50)], ConstraintSet::default(), None);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let e = f.evaluate(&Candidate::from_sequences(vec![vec![0, 1, 2, 3]], vec![]));
        assert!(e.totals.lateness_minutes > 0.0);
        assert!(
            (e.breakdown.get(Factor::TimeWindowSlack) - 1000.0 * e.totals.lateness_minutes).abs()
                < 1e-6
        );
    }

    #[test]
    fn test_score_tie_breaks() {
        let a = Score {
            total: 10.0,
            distance_km: 5.0,
            stop_variance: 1.0,
        };
        let b = Score {
            total: 10.0,
            distance_km: 5.0,
            stop_variance: 0.0,
        };
        let c = Score {
            total: 10.0,
            distance_km: 4.0,
            stop_variance: 9.0,
        };
        assert!(b.is_better_than(&a));
        assert!(c.is_better_than(&b));
        assert!(!a.is_better_than(&a));
    }

    #[test]
    fn test_stop_variance() {
        let c = Candidate::from_sequences(vec![vec![0, 1, 2], vec![3]], vec![]);
        assert!((stop_variance(&c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_all_matches_sequential() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let cands = vec![
            Candidate::from_sequences(vec![vec![0, 1], vec![2, 3]], vec![]),
            Candidate::from_sequences(vec![vec![3, 2, 1, 0], vec![]], vec![]),
        ];
        let scores = f.score_all(&cands);
        assert_eq!(scores[0], f.score(&cands[0]));
        assert_eq!(scores[1], f.score(&cands[1]));
    }

    #[test]
    fn test_route_scores_sum_to_total_when_all_assigned() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let e = f.evaluate(&Candidate::from_sequences(vec![vec![0, 1], vec![2, 3]], vec![]));
        let sum: f64 = e.routes.iter().map(|r| f.route_score(r)).sum();
        assert!((sum - e.score.total).abs() < 1e-6);
    }

    #[test]
    fn test_weights_validation() {
        assert!(FitnessWeights::default().validate().is_ok());
        assert!(FitnessWeights::default()
            .with_time_weight(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_weights_partial_json() {
        let w: FitnessWeights =
            serde_json::from_str(r#"{"distance_weight": 1.0}"#).expect("parse");
        assert_eq!(w.distance_weight, 1.0);
        assert_eq!(w.capacity_penalty, 1000.0);
    }
}
