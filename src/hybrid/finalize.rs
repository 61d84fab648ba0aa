//! Turns the winning candidate into routes, metrics and warnings.

use tracing::warn;

use crate::api::RunMetrics;
use crate::error::{PartialReason, Warning};
use crate::evaluation::{FitnessEvaluator, RouteEvaluator};
use crate::explain::utilization;
use crate::models::{Candidate, Route};

/// Routes and reporting fields of a finished run.
#[derive(Debug, Clone)]
pub(crate) struct Finalized {
    pub(crate) routes: Vec<Route>,
    pub(crate) unassigned: Vec<u64>,
    pub(crate) metrics: RunMetrics,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) partial: bool,
    pub(crate) partial_reasons: Vec<PartialReason>,
}

/// Materializes one route per used bus and settles the partial flag.
///
/// The infeasibility warning from model building is brought up to date
/// with the final unassigned list, and every remaining hard-constraint
/// violation becomes a [`Warning::ConstraintViolated`].
pub(crate) fn finalize(
    fitness: &FitnessEvaluator<'_>,
    candidate: &Candidate,
    mut warnings: Vec<Warning>,
    mut reasons: Vec<PartialReason>,
) -> Finalized {
    let problem = fitness.problem();
    let evaluator = RouteEvaluator::new(problem);

    let mut routes = Vec::with_capacity(candidate.num_used_buses());
    let mut metrics = RunMetrics::default();
    let mut violated = false;
    for (b, seq) in candidate.sequences().iter().enumerate() {
        if seq.is_empty() {
            continue;
        }
        let (mut route, violations) = evaluator.build_route(b, seq);
        route.set_score(fitness.route_score(&evaluator.metrics(b, seq)));

        metrics.total_distance_km += route.distance_km();
        metrics.total_minutes += route.duration_minutes();
        metrics.fuel_litres += route.fuel_litres();
        metrics.riders += u64::from(route.riders());
        metrics.stop_count += route.len();

        for violation in violations {
            warn!(bus = route.bus_id(), ?violation, "constraint violated");
            violated = true;
            warnings.push(Warning::ConstraintViolated { violation });
        }
        routes.push(route);
    }
    metrics.utilization = utilization(problem, candidate);
    metrics.score = fitness.score(candidate).total;

    let unassigned: Vec<u64> = candidate
        .unassigned()
        .iter()
        .map(|&s| problem.stop(s).id())
        .collect();

    let over_capacity = problem.total_demand() > problem.total_capacity();
    warnings.retain_mut(|w| match w {
        Warning::InfeasibleProblem {
            unassigned: listed, ..
        } => {
            listed.clone_from(&unassigned);
            !unassigned.is_empty() || over_capacity
        }
        _ => true,
    });

    if violated || !unassigned.is_empty() {
        reasons.push(PartialReason::Infeasible);
    }
    let mut partial_reasons = Vec::with_capacity(reasons.len());
    for r in reasons {
        if !partial_reasons.contains(&r) {
            partial_reasons.push(r);
        }
    }

    Finalized {
        routes,
        unassigned,
        metrics,
        warnings,
        partial: !partial_reasons.is_empty(),
        partial_reasons,
    }
}
