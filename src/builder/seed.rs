//! Greedy nearest-stop clustering for the initial seed.
//!
//! # Algorithm
//!
//! Every bus starts at the anchor (the depot, or the fleet centroid for open
//! routes). Repeatedly take the unassigned stop nearest to any open bus's
//! current route end and append it to the bus, among those with room for
//! its riders, whose route end is closest. Buses whose route would break a
//! distance or duration limit are used only when no other bus has room.
//! Stops that fit no bus are left unassigned.
//!
//! # Complexity
//!
//! O(n² × B) where n = stops, B = buses.

use crate::evaluation::RouteEvaluator;
use crate::models::{Candidate, ProblemModel};

/// Builds the seed candidate.
///
/// # Examples
///
/// ```
/// use u_busroute::builder::greedy_seed;
/// use u_busroute::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
///
/// let stops = vec![
///     Stop::new(1, GeoPoint::new(0.0, 0.0), 10),
///     Stop::new(2, GeoPoint::new(0.0, 0.01), 10),
///     Stop::new(3, GeoPoint::new(0.0, 0.02), 10),
/// ];
/// let model = ProblemModel::new(stops, vec![Bus::new(1, 20), Bus::new(2, 20)], ConstraintSet::default(), None);
///
/// let seed = greedy_seed(&model);
/// assert!(seed.is_valid_partition(3));
/// assert!(seed.unassigned().is_empty());
/// ```
pub fn greedy_seed(problem: &ProblemModel) -> Candidate {
    let n = problem.num_stops();
    let num_buses = problem.num_buses();
    let mut candidate = Candidate::new(num_buses);
    let mut loads = vec![0u32; num_buses];
    let mut remaining: Vec<usize> = (0..n).collect();
    let evaluator = RouteEvaluator::new(problem);

    // Distance from the end of bus `b`'s route to stop `s`.
    let reach = |candidate: &Candidate, b: usize, s: usize| -> f64 {
        match candidate.sequence(b).last() {
            Some(&last) => problem.travel().km(last, s),
            None => problem.anchor_km(s),
        }
    };

    while !remaining.is_empty() {
        let open: Vec<usize> = (0..num_buses)
            .filter(|&b| loads[b] < problem.bus(b).capacity())
            .collect();
        if open.is_empty() {
            candidate.unassigned_mut().append(&mut remaining);
            break;
        }

        let mut nearest: Option<(usize, f64)> = None;
        for (ri, &s) in remaining.iter().enumerate() {
            for &b in &open {
                let d = reach(&candidate, b, s);
                if nearest.is_none_or(|(_, best)| d < best) {
                    nearest = Some((ri, d));
                }
            }
        }
        let Some((ri, _)) = nearest else { break };
        let stop = remaining.remove(ri);
        let riders = problem.riders(stop);

        let mut within_limits: Option<(usize, f64)> = None;
        let mut any_room: Option<(usize, f64)> = None;
        for b in 0..num_buses {
            let capacity = problem.bus(b).capacity();
            if loads[b].checked_add(riders).is_none_or(|load| load > capacity) {
                continue;
            }
            let cost = reach(&candidate, b, stop);
            if any_room.is_none_or(|(_, best)| cost < best) {
                any_room = Some((b, cost));
            }
            let mut trial = candidate.sequence(b).to_vec();
            trial.push(stop);
            let m = evaluator.metrics(b, &trial);
            let fits = m.excess_km <= 0.0 && m.excess_minutes <= 0.0 && m.lateness_minutes <= 0.0;
            if fits && within_limits.is_none_or(|(_, best)| cost < best) {
                within_limits = Some((b, cost));
            }
        }

        match within_limits.or(any_room) {
            Some((b, _)) => {
                candidate.sequences_mut()[b].push(stop);
                loads[b] += riders;
            }
            None => candidate.unassigned_mut().push(stop),
        }
    }

    candidate.unassigned_mut().sort_unstable();
    candidate
}
