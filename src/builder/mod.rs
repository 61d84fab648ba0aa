//! Problem model builder.
//!
//! Validates a request, resolves rider counts, builds the [`ProblemModel`]
//! with its travel matrix, and produces the greedy seed candidate. Demand
//! that cannot be placed is reported as a warning, never as an error.

mod seed;
mod validate;

pub use seed::greedy_seed;

use tracing::warn;

use crate::api::{DemandForecast, OptimizationRequest, RiderSource};
use crate::error::{ValidationError, Warning};
use crate::models::{Candidate, ProblemModel};
use crate::rl::Context;

/// The builder's result: model, seed, and warnings.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Validated model, flagged infeasible when the seed could not place
    /// every stop.
    pub model: ProblemModel,
    /// Greedy seed candidate.
    pub seed: Candidate,
    /// Recoverable conditions found while building.
    pub warnings: Vec<Warning>,
}

/// Validates `request` and builds the model and seed.
///
/// With [`RiderSource::Forecast`], each stop's riders come from `forecast`,
/// then from the stop's embedded prediction, then from the observed count;
/// stops that fell back to observed counts are reported in a
/// [`Warning::ForecastUnavailable`].
///
/// # Errors
///
/// Returns [`ValidationError`] for any malformed input; nothing is computed
/// in that case.
///
/// # Examples
///
/// ```
/// use u_busroute::api::{AlgorithmMode, BusInput, OptimizationRequest, StopInput};
/// use u_busroute::builder::build;
///
/// let request = OptimizationRequest::new(
///     AlgorithmMode::Genetic,
///     vec![StopInput::new(1, 12.97, 77.59, 6), StopInput::new(2, 12.98, 77.60, 4)],
///     vec![BusInput::new(1, 3)],
/// );
/// let out = build(&request, None).unwrap();
/// assert!(out.model.is_infeasible());
/// assert_eq!(out.seed.unassigned().len(), 2);
/// ```
pub fn build(
    request: &OptimizationRequest,
    forecast: Option<&dyn DemandForecast>,
) -> Result<BuildOutput, ValidationError> {
    let mut warnings = Vec::new();

    let context = request.context.unwrap_or_default();
    let (riders, missing) = resolve_riders(request, forecast, &context);
    let stops = validate::stops(&request.stops, &riders)?;
    let fleet = validate::fleet(&request.buses)?;
    let constraints = validate::constraints(&request.constraints)?;
    let depot = validate::depot(request.depot)?;

    if !missing.is_empty() {
        warnings.push(Warning::ForecastUnavailable { stop_ids: missing });
    }
    if !fleet.inactive.is_empty() {
        warnings.push(Warning::InactiveBusesIgnored {
            bus_ids: fleet.inactive,
        });
    }

    let mut model = ProblemModel::new(stops, fleet.eligible, constraints, depot);
    let seed = greedy_seed(&model);

    let over_capacity = model.total_demand() > model.total_capacity();
    if over_capacity || !seed.unassigned().is_empty() {
        model.set_infeasible(true);
        let unassigned: Vec<u64> = seed
            .unassigned()
            .iter()
            .map(|&s| model.stop(s).id())
            .collect();
        warn!(
            total_demand = model.total_demand(),
            total_capacity = model.total_capacity(),
            unassigned = unassigned.len(),
            "problem is infeasible"
        );
        warnings.push(Warning::InfeasibleProblem {
            total_demand: model.total_demand(),
            total_capacity: model.total_capacity(),
            unassigned,
        });
    }

    Ok(BuildOutput {
        model,
        seed,
        warnings,
    })
}

/// Rider count per stop input, plus ids that fell back to observed counts.
fn resolve_riders(
    request: &OptimizationRequest,
    forecast: Option<&dyn DemandForecast>,
    context: &Context,
) -> (Vec<u32>, Vec<u64>) {
    let mut missing = Vec::new();
    let riders = request
        .stops
        .iter()
        .map(|stop| {
            let observed = validate::observed_riders(stop);
            if request.rider_source == RiderSource::Observed {
                return observed;
            }
            let predicted = forecast
                .and_then(|f| f.predict(stop.id, context))
                .or_else(|| stop.predicted_riders.map(validate::clamp_count));
            predicted.unwrap_or_else(|| {
                missing.push(stop.id);
                observed
            })
        })
        .collect();
    (riders, missing)
}
