//! Exact per-factor attribution of a score change.

use crate::evaluation::{Evaluation, Factor};

use super::Attribution;

/// Attributes `after.score.total - before.score.total` to the fitness
/// factors.
///
/// The contributions sum to the total delta up to floating-point rounding.
/// Factors that did not move are omitted; the rest are ranked by magnitude.
pub fn decompose(before: &Evaluation, after: &Evaluation) -> Vec<Attribution> {
    let delta = after.breakdown.delta(&before.breakdown);
    let mut attributions: Vec<Attribution> = Factor::ALL
        .iter()
        .map(|&f| (f, delta.get(f)))
        .filter(|(_, c)| *c != 0.0)
        .map(|(f, c)| Attribution::new(f.name(), c))
        .collect();
    super::rank(&mut attributions);
    attributions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{FitnessEvaluator, FitnessWeights};
    use crate::explain::Direction;
    use crate::models::{Bus, Candidate, ConstraintSet, GeoPoint, ProblemModel, Stop};

    fn model() -> ProblemModel {
        let stops = (0..5)
            .map(|i| Stop::new(i, GeoPoint::new(0.0, 0.01 * i as f64), 3))
            .collect();
        ProblemModel::new(
            stops,
            vec![Bus::new(1, 10), Bus::new(2, 10)],
            ConstraintSet::default(),
            Some(GeoPoint::new(0.0, 0.0)),
        )
    }

    #[test]
    fn test_contributions_sum_to_delta() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let before = f.evaluate(&Candidate::from_sequences(
            vec![vec![4, 0, 3, 1], vec![2]],
            vec![],
        ));
        let after = f.evaluate(&Candidate::from_sequences(
            vec![vec![0, 1, 2], vec![3, 4]],
            vec![],
        ));
        let attributions = decompose(&before, &after);
        let sum: f64 = attributions.iter().map(|a| a.contribution).sum();
        let delta = after.score.total - before.score.total;
        assert!((sum - delta).abs() <= 1e-6 * delta.abs().max(1.0));
        // Overflow of the first route (12 riders on 10 seats) disappears.
        let cap = attributions
            .iter()
            .find(|a| a.feature == "capacity_slack")
            .expect("capacity moved");
        assert_eq!(cap.direction, Direction::Decreases);
        for w in attributions.windows(2) {
            assert!(w[0].magnitude >= w[1].magnitude);
        }
    }

    #[test]
    fn test_identical_candidates_have_no_attribution() {
        let m = model();
        let f = FitnessEvaluator::new(&m, FitnessWeights::default());
        let c = Candidate::from_sequences(vec![vec![0, 1], vec![2, 3, 4]], vec![]);
        let e = f.evaluate(&c);
        assert!(decompose(&e, &e).is_empty());
    }
}
