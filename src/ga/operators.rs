//! Genetic operators over bus-structured candidates.
//!
//! - [`splice_crossover`]: keeps the first parent up to a cut point and the
//!   second parent after it, then reinserts whatever is missing
//! - [`mutate`]: one uniformly chosen local edit
//! - [`perturb`] / [`random_insertion_build`]: initial population sources

use rand::seq::SliceRandom;
use rand::Rng;

use crate::evaluation::FitnessEvaluator;
use crate::local_search::{insert_all, random_any_move};
use crate::models::Candidate;

/// Bus-structured splice crossover.
///
/// A cut point is drawn over the first parent's stops in bus-major order.
/// The child takes every bus of `p1` before the cut bus, the cut bus's
/// prefix from `p1` followed by that bus's stops from `p2`, and every later
/// bus from `p2`. Stops the child already holds are dropped from `p2`'s
/// contribution. Stops still missing are reinserted in random order at
/// their cheapest feasible position; when none is feasible they go to the
/// cheapest position, or to the unassigned list if the problem is flagged
/// infeasible.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use u_busroute::evaluation::{FitnessEvaluator, FitnessWeights};
/// use u_busroute::ga::splice_crossover;
/// use u_busroute::models::{Bus, Candidate, ConstraintSet, GeoPoint, ProblemModel, Stop};
///
/// let stops = (0..4).map(|i| Stop::new(i, GeoPoint::new(0.0, 0.01 * i as f64), 1)).collect();
/// let model = ProblemModel::new(stops, vec![Bus::new(1, 10), Bus::new(2, 10)], ConstraintSet::default(), None);
/// let fitness = FitnessEvaluator::new(&model, FitnessWeights::default());
///
/// let p1 = Candidate::from_sequences(vec![vec![0, 1], vec![2, 3]], vec![]);
/// let p2 = Candidate::from_sequences(vec![vec![3], vec![2, 1, 0]], vec![]);
/// let child = splice_crossover(&fitness, &p1, &p2, &mut StdRng::seed_from_u64(1));
/// assert!(child.is_valid_partition(4));
/// ```
pub fn splice_crossover<R: Rng>(
    fitness: &FitnessEvaluator<'_>,
    p1: &Candidate,
    p2: &Candidate,
    rng: &mut R,
) -> Candidate {
    let problem = fitness.problem();
    let n = problem.num_stops();
    let num_buses = p1.num_buses();

    let cut = rng.random_range(0..=p1.num_assigned());
    let (cut_bus, cut_pos) = locate_cut(p1, cut);

    let mut present = vec![false; n];
    let mut child = Candidate::new(num_buses);
    for b in 0..num_buses {
        let seq = &mut child.sequences_mut()[b];
        if b <= cut_bus {
            let take = if b < cut_bus { p1.sequence(b).len() } else { cut_pos };
            for &s in &p1.sequence(b)[..take] {
                seq.push(s);
                present[s] = true;
            }
        }
        if b >= cut_bus {
            if let Some(from_p2) = p2.sequences().get(b) {
                for &s in from_p2 {
                    if !present[s] {
                        seq.push(s);
                        present[s] = true;
                    }
                }
            }
        }
    }

    let mut missing: Vec<usize> = (0..n).filter(|&s| !present[s]).collect();
    missing.shuffle(rng);
    insert_all(fitness, &mut child, &missing, problem.is_infeasible());
    child
}

/// Maps a flat cut index to `(bus, position)`; a cut past the last stop
/// lands at the end of the last bus.
fn locate_cut(candidate: &Candidate, mut cut: usize) -> (usize, usize) {
    for (b, seq) in candidate.sequences().iter().enumerate() {
        if cut < seq.len() {
            return (b, cut);
        }
        cut -= seq.len();
    }
    let last = candidate.num_buses().saturating_sub(1);
    (last, candidate.sequences().get(last).map_or(0, Vec::len))
}

/// Applies one random local edit, or returns `None` when the candidate
/// admits no valid edit.
pub fn mutate<R: Rng>(candidate: &Candidate, rng: &mut R) -> Option<Candidate> {
    random_any_move(candidate, rng).and_then(|mv| mv.apply(candidate))
}

/// Applies `edits` random local edits in sequence; edits that are not
/// possible are skipped.
pub fn perturb<R: Rng>(candidate: &Candidate, edits: usize, rng: &mut R) -> Candidate {
    let mut current = candidate.clone();
    for _ in 0..edits {
        if let Some(next) = mutate(&current, rng) {
            current = next;
        }
    }
    current
}

/// Builds a candidate from scratch by cheapest insertion of the stops in a
/// random order.
pub fn random_insertion_build<R: Rng>(fitness: &FitnessEvaluator<'_>, rng: &mut R) -> Candidate {
    let problem = fitness.problem();
    let mut order: Vec<usize> = (0..problem.num_stops()).collect();
    order.shuffle(rng);
    let mut candidate = Candidate::new(problem.num_buses());
    insert_all(fitness, &mut candidate, &order, problem.is_infeasible());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::FitnessWeights;
    use crate::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model(riders: u32, capacities: &[u32]) -> ProblemModel {
        let stops = (0..8)
            .map(|i| {
                Stop::new(
                    i as u64,
                    GeoPoint::new(0.01 * (i % 3) as f64, 0.01 * i as f64),
                    riders,
                )
            })
            .collect();
        let buses = capacities
            .iter()
            .enumerate()
            .map(|(i, &c)| Bus::new(i as u64, c))
            .collect();
        ProblemModel::new(stops, buses, ConstraintSet::default(), None)
    }

    #[test]
    fn test_crossover_preserves_partition() {
        let m = model(2, &[10, 10, 10]);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let p1 = Candidate::from_sequences(vec![vec![0, 1, 2], vec![3, 4], vec![5, 6, 7]], vec![]);
        let p2 = Candidate::from_sequences(vec![vec![7, 6], vec![5, 4, 3, 2], vec![1, 0]], vec![]);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let child = splice_crossover(&f, &p1, &p2, &mut rng);
            assert!(child.is_valid_partition(8));
            assert!(child.unassigned().is_empty());
        }
    }

    #[test]
    fn test_crossover_single_bus() {
        let m = model(1, &[20]);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let p1 = Candidate::from_sequences(vec![(0..8).collect()], vec![]);
        let p2 = Candidate::from_sequences(vec![(0..8).rev().collect()], vec![]);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert!(splice_crossover(&f, &p1, &p2, &mut rng).is_valid_partition(8));
        }
    }

    #[test]
    fn test_crossover_infeasible_may_leave_unassigned() {
        let mut m = model(5, &[10]);
        m.set_infeasible(true);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let p1 = Candidate::from_sequences(vec![vec![0, 1]], (2..8).collect());
        let p2 = Candidate::from_sequences(vec![vec![]], (0..8).collect());
        let mut rng = StdRng::seed_from_u64(2);
        let child = splice_crossover(&f, &p1, &p2, &mut rng);
        assert!(child.is_valid_partition(8));
        let load: u32 = child.sequence(0).iter().map(|&s| m.riders(s)).sum();
        assert!(load <= 10);
        assert_eq!(child.unassigned().len(), 6);
    }

    #[test]
    fn test_locate_cut() {
        let c = Candidate::from_sequences(vec![vec![0, 1], vec![], vec![2]], vec![]);
        assert_eq!(locate_cut(&c, 0), (0, 0));
        assert_eq!(locate_cut(&c, 2), (2, 0));
        assert_eq!(locate_cut(&c, 3), (2, 1));
    }

    #[test]
    fn test_mutate_skips_when_impossible() {
        let mut rng = StdRng::seed_from_u64(1);
        let single = Candidate::from_sequences(vec![vec![0]], vec![]);
        assert!(mutate(&single, &mut rng).is_none());
        assert_eq!(perturb(&single, 3, &mut rng), single);
    }

    #[test]
    fn test_random_build_is_partition() {
        let m = model(2, &[8, 8]);
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let mut rng = StdRng::seed_from_u64(4);
        let c = random_insertion_build(&f, &mut rng);
        assert!(c.is_valid_partition(8));
        assert!(c.unassigned().is_empty());
        for (b, seq) in c.sequences().iter().enumerate() {
            let load: u32 = seq.iter().map(|&s| m.riders(s)).sum();
            assert!(load <= m.bus(b).capacity());
        }
    }
}
