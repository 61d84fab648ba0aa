//! Invariants over generated instances.

use std::sync::Arc;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use u_busroute::api::{AlgorithmMode, BusInput, OptimizationRequest, StopInput};
use u_busroute::builder::greedy_seed;
use u_busroute::evaluation::{FitnessEvaluator, FitnessWeights};
use u_busroute::ga::{evolve, GaSettings};
use u_busroute::hybrid::{Budget, HybridController, SolverConfig};
use u_busroute::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
use u_busroute::rl::{Context, LearningMode, Refiner, RefinerConfig, ValueStore};

prop_compose! {
    fn stop_inputs(max: usize)
    (points in prop::collection::vec((0.0..0.05f64, 0.0..0.05f64, 0..10i64), 1..max))
    -> Vec<StopInput> {
        points
            .into_iter()
            .enumerate()
            .map(|(i, (dlat, dlng, riders))| StopInput::new(i as u64 + 1, 12.9 + dlat, 77.5 + dlng, riders))
            .collect()
    }
}

prop_compose! {
    fn model(max: usize)
    (
        points in prop::collection::vec((0.0..0.05f64, 0.0..0.05f64, 1..6u32), 2..max),
        capacities in prop::collection::vec(5..30u32, 1..4),
        depot in prop::bool::ANY,
    ) -> ProblemModel {
        let stops = points
            .into_iter()
            .enumerate()
            .map(|(i, (dlat, dlng, riders))| Stop::new(i as u64, GeoPoint::new(dlat, dlng), riders))
            .collect();
        let buses = capacities
            .into_iter()
            .enumerate()
            .map(|(i, c)| Bus::new(i as u64, c))
            .collect();
        ProblemModel::new(stops, buses, ConstraintSet::default(), depot.then(|| GeoPoint::new(0.0, 0.0)))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn every_stop_served_or_unassigned_once(
        stops in stop_inputs(12),
        capacities in prop::collection::vec(1..40i64, 1..4),
        mode in prop_oneof![Just(AlgorithmMode::Genetic), Just(AlgorithmMode::Rl), Just(AlgorithmMode::Hybrid)],
        seed in any::<u64>(),
    ) {
        let n = stops.len() as u64;
        let buses = capacities.iter().enumerate().map(|(i, &c)| BusInput::new(i as u64 + 1, c)).collect();
        let request = OptimizationRequest::new(mode, stops, buses).with_seed(seed);
        let controller = HybridController::new(SolverConfig::fast())
            .expect("valid config")
            .with_value_store(Arc::new(ValueStore::default()));

        let out = controller.optimize(&request).expect("valid").response;
        let mut ids: Vec<u64> = out.routes.iter().flat_map(|r| r.stop_ids()).collect();
        ids.extend(&out.unassigned);
        ids.sort_unstable();
        prop_assert_eq!(ids, (1..=n).collect::<Vec<_>>());
        prop_assert_eq!(out.partial, !out.partial_reasons.is_empty());
        prop_assert!(out.routes.iter().all(|r| !r.is_empty()));
        if !out.partial {
            prop_assert!(out.routes.iter().all(|r| r.riders() <= r.capacity()));
        }
    }

    #[test]
    fn ga_history_never_rises(m in model(10), seed in any::<u64>()) {
        let fitness = FitnessEvaluator::new(&m, FitnessWeights::default());
        let start = greedy_seed(&m);
        let settings = GaSettings::fast().with_max_generations(15).with_parallel(false);
        let result = evolve(
            &fitness,
            &start,
            &settings,
            &Budget::unlimited(),
            &mut StdRng::seed_from_u64(seed),
        );
        prop_assert!(result.fitness_history.windows(2).all(|w| w[1] <= w[0]));
        prop_assert!(result.best.score().total <= fitness.score(&start).total);
        prop_assert!(result.best.candidate().is_valid_partition(m.num_stops()));
    }

    #[test]
    fn refiner_never_worse(m in model(10), seed in any::<u64>(), online in prop::bool::ANY) {
        let fitness = FitnessEvaluator::new(&m, FitnessWeights::default());
        let start = greedy_seed(&m);
        let learning = if online { LearningMode::Online } else { LearningMode::Frozen };
        let store = ValueStore::default();
        let refiner = Refiner::new(
            RefinerConfig::default().with_max_steps(60).with_learning(learning),
            &store,
        );
        let out = refiner.refine(
            &fitness,
            &start,
            &Context::default(),
            &Budget::unlimited(),
            &mut StdRng::seed_from_u64(seed),
        );
        let before = fitness.score(&start);
        prop_assert!(!before.is_better_than(&out.score));
        prop_assert!(out.candidate.is_valid_partition(m.num_stops()));
        if !out.improved {
            prop_assert_eq!(out.candidate.sequences(), start.sequences());
        }
    }
}
