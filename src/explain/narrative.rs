//! Human-readable summary and counterfactual targets.

use serde::{Deserialize, Serialize};

use crate::api::RunMetrics;
use crate::evaluation::Evaluation;
use crate::local_search::route_load;
use crate::models::{Candidate, ProblemModel};
use crate::rl::Context;

/// Fleet distance considered acceptable, km.
pub const DISTANCE_TARGET_KM: f64 = 50.0;
/// Seat utilisation considered high.
pub const UTILIZATION_TARGET: f64 = 0.75;
/// Fleet time considered acceptable, minutes.
pub const TIME_TARGET_MIN: f64 = 60.0;

/// One check on the decision path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStep {
    /// What was checked.
    pub criterion: String,
    /// Observed value.
    pub value: f64,
    /// Threshold it is compared with.
    pub threshold: f64,
    /// Whether the check passed.
    pub satisfied: bool,
}

/// Text summary of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    /// One-line description of the routes.
    pub summary: String,
    /// Checks against the reference thresholds.
    pub decision_path: Vec<DecisionStep>,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Seats filled on the buses that received a route.
pub fn utilization(problem: &ProblemModel, candidate: &Candidate) -> f64 {
    let (mut riders, mut seats) = (0u64, 0u64);
    for (b, seq) in candidate.sequences().iter().enumerate() {
        if seq.is_empty() {
            continue;
        }
        riders += u64::from(route_load(problem, seq));
        seats += u64::from(problem.bus(b).capacity());
    }
    if seats == 0 {
        0.0
    } else {
        riders as f64 / seats as f64
    }
}

/// Summarizes `evaluation` of `candidate` under `context`.
pub fn narrate(
    problem: &ProblemModel,
    candidate: &Candidate,
    evaluation: &Evaluation,
    context: &Context,
) -> Narrative {
    let km = evaluation.totals.distance_km;
    let minutes = evaluation.totals.minutes;
    let util = utilization(problem, candidate);

    let summary = format!(
        "{} stops on {} buses covering {:.1} km in {:.0} minutes",
        candidate.num_assigned(),
        candidate.num_used_buses(),
        km,
        minutes
    );

    let decision_path = vec![
        DecisionStep {
            criterion: "distance_km below target".into(),
            value: km,
            threshold: DISTANCE_TARGET_KM,
            satisfied: km < DISTANCE_TARGET_KM,
        },
        DecisionStep {
            criterion: "capacity utilization above target".into(),
            value: util,
            threshold: UTILIZATION_TARGET,
            satisfied: util > UTILIZATION_TARGET,
        },
        DecisionStep {
            criterion: "route minutes below target".into(),
            value: minutes,
            threshold: TIME_TARGET_MIN,
            satisfied: minutes < TIME_TARGET_MIN,
        },
    ];

    let mut confidence: f64 = 0.7;
    if util > 0.8 {
        confidence += 0.1;
    }
    if km < DISTANCE_TARGET_KM {
        confidence += 0.1;
    }
    if context.traffic_level < 0.5 {
        confidence += 0.1;
    }

    Narrative {
        summary,
        decision_path,
        confidence: confidence.min(1.0),
    }
}

/// A metric a caller may set a target for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Fleet kilometres.
    DistanceKm,
    /// Fleet route minutes.
    Minutes,
    /// Fleet litres.
    FuelLitres,
    /// Seat utilisation, in percent.
    UtilizationPct,
}

impl Metric {
    fn value(self, metrics: &RunMetrics) -> f64 {
        match self {
            Metric::DistanceKm => metrics.total_distance_km,
            Metric::Minutes => metrics.total_minutes,
            Metric::FuelLitres => metrics.fuel_litres,
            Metric::UtilizationPct => metrics.utilization * 100.0,
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Metric::DistanceKm => "reorder stops to reduce backtracking",
            Metric::Minutes => "move departure away from peak traffic",
            Metric::FuelLitres => "put the most efficient buses on the longest routes",
            Metric::UtilizationPct => "consolidate nearby stops onto fewer buses",
        }
    }
}

/// Effort class of a counterfactual change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Absolute change below 5 units.
    Easy,
    /// Absolute change below 15 units.
    Moderate,
    /// Anything larger.
    Difficult,
}

impl Difficulty {
    fn of(change: f64) -> Self {
        match change.abs() {
            c if c < 5.0 => Difficulty::Easy,
            c if c < 15.0 => Difficulty::Moderate,
            _ => Difficulty::Difficult,
        }
    }
}

/// What it takes to move one metric to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterfactual {
    /// Metric.
    pub metric: Metric,
    /// Current value.
    pub current: f64,
    /// Desired value.
    pub target: f64,
    /// `target - current`.
    pub required_change: f64,
    /// Change relative to the current value, percent; 0 when current is 0.
    pub change_pct: f64,
    /// Effort class.
    pub difficulty: Difficulty,
    /// Suggested lever.
    pub hint: String,
}

/// Changes needed to reach `targets`; metrics already on target are
/// skipped.
///
/// # Examples
///
/// ```
/// use u_busroute::api::RunMetrics;
/// use u_busroute::explain::{counterfactual, Difficulty, Metric};
///
/// let metrics = RunMetrics { total_distance_km: 52.0, total_minutes: 104.0, ..Default::default() };
/// let cf = counterfactual(&metrics, &[(Metric::DistanceKm, 45.0), (Metric::Minutes, 104.0)]);
/// assert_eq!(cf.len(), 1);
/// assert_eq!(cf[0].required_change, -7.0);
/// assert_eq!(cf[0].difficulty, Difficulty::Moderate);
/// ```
pub fn counterfactual(metrics: &RunMetrics, targets: &[(Metric, f64)]) -> Vec<Counterfactual> {
    targets
        .iter()
        .filter_map(|&(metric, target)| {
            let current = metric.value(metrics);
            if current == target {
                return None;
            }
            let change = target - current;
            let pct = if current != 0.0 {
                change / current * 100.0
            } else {
                0.0
            };
            Some(Counterfactual {
                metric,
                current,
                target,
                required_change: change,
                change_pct: (pct * 100.0).round() / 100.0,
                difficulty: Difficulty::of(change),
                hint: metric.hint().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{FitnessEvaluator, FitnessWeights};
    use crate::models::{Bus, ConstraintSet, GeoPoint, Stop};
    use crate::rl::Weather;

    fn model() -> ProblemModel {
        let stops = (0..4)
            .map(|i| Stop::new(i, GeoPoint::new(0.0, 0.01 * i as f64), 10))
            .collect();
        ProblemModel::new(
            stops,
            vec![Bus::new(1, 25), Bus::new(2, 25), Bus::new(3, 25)],
            ConstraintSet::default(),
            None,
        )
    }

    #[test]
    fn test_utilization_counts_used_buses_only() {
        let m = model();
        let c = Candidate::from_sequences(vec![vec![0, 1], vec![2, 3], vec![]], vec![]);
        assert!((utilization(&m, &c) - 0.8).abs() < 1e-12);
        assert_eq!(utilization(&m, &Candidate::new(3)), 0.0);
    }

    #[test]
    fn test_narrative_for_compact_routes() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let c = Candidate::from_sequences(vec![vec![0, 1], vec![2, 3], vec![]], vec![]);
        let n = narrate(&m, &c, &f.evaluate(&c), &Context::default());
        assert!(n.summary.starts_with("4 stops on 2 buses"));
        assert!(n.decision_path.iter().all(|s| s.satisfied));
        // 0.8 utilization is not above the 0.8 bonus threshold.
        assert!((n.confidence - 0.9).abs() < 1e-12);

        let heavy = Context::default().with_traffic(0.9).with_weather(Weather::Snow);
        let n = narrate(&m, &c, &f.evaluate(&c), &heavy);
        assert!((n.confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_difficulty_bands() {
        assert_eq!(Difficulty::of(-4.9), Difficulty::Easy);
        assert_eq!(Difficulty::of(5.0), Difficulty::Moderate);
        assert_eq!(Difficulty::of(-20.0), Difficulty::Difficult);
    }

    #[test]
    fn test_counterfactual_percentages() {
        let metrics = RunMetrics {
            total_distance_km: 40.0,
            utilization: 0.6,
            ..Default::default()
        };
        let cf = counterfactual(
            &metrics,
            &[(Metric::DistanceKm, 30.0), (Metric::UtilizationPct, 80.0)],
        );
        assert_eq!(cf[0].change_pct, -25.0);
        assert_eq!(cf[0].difficulty, Difficulty::Moderate);
        assert!((cf[1].required_change - 20.0).abs() < 1e-9);
        assert_eq!(cf[1].difficulty, Difficulty::Difficult);

        let zero = counterfactual(&RunMetrics::default(), &[(Metric::FuelLitres, 3.0)]);
        assert_eq!(zero[0].change_pct, 0.0);
        assert_eq!(zero[0].difficulty, Difficulty::Easy);
    }
}
