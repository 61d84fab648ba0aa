//! Cheapest-insertion primitives shared by seeding, crossover repair and the
//! randomized population builds.

use crate::evaluation::{FitnessEvaluator, RouteEvaluator, RouteMetrics};
use crate::models::{Candidate, ProblemModel};

/// Where a stop should go and what it costs there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insertion {
    /// Target bus.
    pub bus: usize,
    /// Position in the target bus, `0..=len`.
    pub position: usize,
    /// Increase of the bus's fitness share.
    pub cost: f64,
}

/// Kilometres added by inserting `stop` at `pos` of `route`.
pub fn insertion_cost(problem: &ProblemModel, route: &[usize], pos: usize, stop: usize) -> f64 {
    let prev = if pos == 0 { None } else { Some(route[pos - 1]) };
    let next = route.get(pos).copied();
    problem.leg_km(prev, Some(stop)) + problem.leg_km(Some(stop), next) - problem.leg_km(prev, next)
}

/// Kilometres saved by removing the stop at `pos` of `route`.
pub fn removal_cost(problem: &ProblemModel, route: &[usize], pos: usize) -> f64 {
    let prev = if pos == 0 { None } else { Some(route[pos - 1]) };
    let next = route.get(pos + 1).copied();
    problem.leg_km(prev, Some(route[pos])) + problem.leg_km(Some(route[pos]), next)
        - problem.leg_km(prev, next)
}

/// Riders picked up along `route`.
pub fn route_load(problem: &ProblemModel, route: &[usize]) -> u32 {
    route
        .iter()
        .fold(0u32, |load, &s| load.saturating_add(problem.riders(s)))
}

/// Finds the cheapest position for `stop` across all buses of `candidate`.
///
/// With `require_feasible`, positions that overflow the bus or add route
/// limit excess or lateness are skipped. Ties go to the lower bus, then the
/// earlier position.
pub fn best_insertion(
    fitness: &FitnessEvaluator<'_>,
    candidate: &Candidate,
    stop: usize,
    require_feasible: bool,
) -> Option<Insertion> {
    let problem = fitness.problem();
    let routes = RouteEvaluator::new(problem);
    let riders = problem.riders(stop);
    let mut best: Option<Insertion> = None;

    for (bus, route) in candidate.sequences().iter().enumerate() {
        let capacity = problem.bus(bus).capacity();
        if require_feasible
            && route_load(problem, route)
                .checked_add(riders)
                .is_none_or(|load| load > capacity)
        {
            continue;
        }
        let base = routes.metrics(bus, route);
        let base_score = fitness.route_score(&base);

        let mut trial = Vec::with_capacity(route.len() + 1);
        for pos in 0..=route.len() {
            trial.clear();
            trial.extend_from_slice(&route[..pos]);
            trial.push(stop);
            trial.extend_from_slice(&route[pos..]);

            let metrics = routes.metrics(bus, &trial);
            if require_feasible && adds_violation(&base, &metrics) {
                continue;
            }
            let cost = fitness.route_score(&metrics) - base_score;
            if best.as_ref().is_none_or(|b| cost < b.cost) {
                best = Some(Insertion {
                    bus,
                    position: pos,
                    cost,
                });
            }
        }
    }

    best
}

fn adds_violation(before: &RouteMetrics, after: &RouteMetrics) -> bool {
    const EPS: f64 = 1e-9;
    after.overflow > before.overflow
        || after.excess_km > before.excess_km + EPS
        || after.excess_minutes > before.excess_minutes + EPS
        || after.lateness_minutes > before.lateness_minutes + EPS
}

/// Inserts each of `stops`, in order, at its cheapest feasible position.
///
/// A stop with no feasible position goes to the cheapest position anyway,
/// unless `allow_unassigned` is set, in which case it is appended to the
/// unassigned list.
pub fn insert_all(
    fitness: &FitnessEvaluator<'_>,
    candidate: &mut Candidate,
    stops: &[usize],
    allow_unassigned: bool,
) {
    for &stop in stops {
        let placement = best_insertion(fitness, candidate, stop, true).or_else(|| {
            if allow_unassigned {
                None
            } else {
                best_insertion(fitness, candidate, stop, false)
            }
        });
        match placement {
            Some(ins) => candidate.sequences_mut()[ins.bus].insert(ins.position, stop),
            None => candidate.unassigned_mut().push(stop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::FitnessWeights;
    use crate::models::{Bus, ConstraintSet, GeoPoint, Stop};

    fn model(capacities: &[u32]) -> ProblemModel {
        let stops = vec![
            Stop::new(1, GeoPoint::new(0.0, 0.0), 5),
            Stop::new(2, GeoPoint::new(0.0, 0.1), 5),
            Stop::new(3, GeoPoint::new(0.0, 0.2), 5),
            Stop::new(4, GeoPoint::new(0.0, 0.05), 5),
        ];
        let buses = capacities
            .iter()
            .enumerate()
            .map(|(i, &c)| Bus::new(i as u64 + 1, c))
            .collect();
        ProblemModel::new(stops, buses, ConstraintSet::default(), None)
    }

    #[test]
    fn test_insertion_cost_between_neighbors() {
        let m = model(&[50]);
        let route = [0, 2];
        let mid = insertion_cost(&m, &route, 1, 1);
        assert!(mid.abs() < 1e-6);
        // Open route: prepending costs only the new first leg.
        let front = insertion_cost(&m, &route, 0, 1);
        assert!((front - m.travel().km(1, 0)).abs() < 1e-9);
    }

    #[test]
    fn test_removal_cost() {
        let m = model(&[50]);
        let route = [0, 3, 1];
        let saved = removal_cost(&m, &route, 2);
        assert!((saved - m.travel().km(3, 1)).abs() < 1e-9);
    }

    #[test]
    fn test_best_insertion_prefers_between() {
        let m = model(&[50]);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let c = Candidate::from_sequences(vec![vec![0, 1]], vec![]);
        let ins = best_insertion(&f, &c, 3, true).expect("room");
        assert_eq!((ins.bus, ins.position), (0, 1));
    }

    #[test]
    fn test_best_insertion_respects_capacity() {
        let m = model(&[10, 10]);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let c = Candidate::from_sequences(vec![vec![0, 1], vec![2]], vec![]);
        let ins = best_insertion(&f, &c, 3, true).expect("bus 1 has room");
        assert_eq!(ins.bus, 1);
    }

    #[test]
    fn test_huge_load_has_no_room() {
        let stops = vec![
            Stop::new(1, GeoPoint::new(0.0, 0.0), u32::MAX),
            Stop::new(2, GeoPoint::new(0.0, 0.1), 5),
        ];
        let m = ProblemModel::new(stops, vec![Bus::new(1, 50)], ConstraintSet::default(), None);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let c = Candidate::from_sequences(vec![vec![0]], vec![]);
        assert_eq!(route_load(&m, &[0, 1]), u32::MAX);
        assert!(best_insertion(&f, &c, 1, true).is_none());
    }

    #[test]
    fn test_insert_all_unassigned_when_full() {
        let m = model(&[10]);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let mut c = Candidate::from_sequences(vec![vec![0, 1]], vec![]);
        insert_all(&f, &mut c, &[2, 3], true);
        assert_eq!(c.unassigned(), &[2, 3]);
        assert!(c.is_valid_partition(4));

        let mut forced = Candidate::from_sequences(vec![vec![0, 1]], vec![]);
        insert_all(&f, &mut forced, &[2, 3], false);
        assert!(forced.unassigned().is_empty());
        assert_eq!(forced.sequence(0).len(), 4);
    }
}
