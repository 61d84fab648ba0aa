//! Optimization request types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{BusStatus, GeoPoint, DEFAULT_TIME_BUDGET};
use crate::rl::Context;

/// Which search pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmMode {
    /// Seed, genetic search, finalize.
    Genetic,
    /// Seed, learned refinement, finalize.
    Rl,
    /// Seed, genetic search, learned refinement, finalize.
    #[default]
    Hybrid,
}

impl AlgorithmMode {
    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmMode::Genetic => "genetic",
            AlgorithmMode::Rl => "rl",
            AlgorithmMode::Hybrid => "hybrid",
        }
    }

    /// Whether the genetic phase runs.
    pub fn runs_genetic(self) -> bool {
        matches!(self, AlgorithmMode::Genetic | AlgorithmMode::Hybrid)
    }

    /// Whether the learned refinement phase runs.
    pub fn runs_refiner(self) -> bool {
        matches!(self, AlgorithmMode::Rl | AlgorithmMode::Hybrid)
    }
}

/// Where rider counts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiderSource {
    /// Use the observed rider count on each stop.
    #[default]
    Observed,
    /// Use forecast rider counts, falling back to observed ones.
    Forecast,
}

/// A time window as supplied, validated by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowInput {
    /// Earliest pickup minute.
    pub ready: f64,
    /// Latest pickup minute.
    pub due: f64,
}

/// A stop as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopInput {
    /// Stop id, unique within the request.
    pub id: u64,
    /// Coordinate; required.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Observed riders; must not be negative.
    #[serde(default)]
    pub riders: i64,
    /// Forecast riders embedded in the request.
    #[serde(default)]
    pub predicted_riders: Option<i64>,
    /// Optional pickup window.
    #[serde(default)]
    pub time_window: Option<WindowInput>,
    /// Geofence radius in metres.
    #[serde(default)]
    pub geofence_radius_m: Option<f64>,
    /// Dwell time in minutes.
    #[serde(default)]
    pub dwell_minutes: Option<f64>,
}

impl StopInput {
    /// Creates a located stop.
    pub fn new(id: u64, lat: f64, lng: f64, riders: i64) -> Self {
        Self {
            id,
            location: Some(GeoPoint::new(lat, lng)),
            riders,
            predicted_riders: None,
            time_window: None,
            geofence_radius_m: None,
            dwell_minutes: None,
        }
    }

    /// Creates a stop with no coordinate.
    pub fn unlocated(id: u64, riders: i64) -> Self {
        Self {
            location: None,
            ..Self::new(id, 0.0, 0.0, riders)
        }
    }

    /// Sets the embedded forecast.
    pub fn with_predicted_riders(mut self, riders: i64) -> Self {
        self.predicted_riders = Some(riders);
        self
    }

    /// Sets the pickup window.
    pub fn with_time_window(mut self, ready: f64, due: f64) -> Self {
        self.time_window = Some(WindowInput { ready, due });
        self
    }

    /// Sets the geofence radius.
    pub fn with_geofence_radius(mut self, metres: f64) -> Self {
        self.geofence_radius_m = Some(metres);
        self
    }

    /// Sets the dwell time.
    pub fn with_dwell_minutes(mut self, minutes: f64) -> Self {
        self.dwell_minutes = Some(minutes);
        self
    }
}

/// A bus as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusInput {
    /// Bus id, unique within the request.
    pub id: u64,
    /// Seats; must be positive.
    pub capacity: i64,
    /// Kilometres per litre.
    #[serde(default)]
    pub km_per_litre: Option<f64>,
    /// Operational status.
    #[serde(default)]
    pub status: BusStatus,
}

impl BusInput {
    /// Creates an active bus.
    pub fn new(id: u64, capacity: i64) -> Self {
        Self {
            id,
            capacity,
            km_per_litre: None,
            status: BusStatus::Active,
        }
    }

    /// Sets fuel efficiency.
    pub fn with_fuel_efficiency(mut self, km_per_litre: f64) -> Self {
        self.km_per_litre = Some(km_per_litre);
        self
    }

    /// Sets the operational status.
    pub fn with_status(mut self, status: BusStatus) -> Self {
        self.status = status;
        self
    }
}

/// Route constraints as supplied. Unset fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintInput {
    /// Maximum minutes per route.
    pub max_route_minutes: Option<f64>,
    /// Maximum kilometres per route.
    pub max_route_km: Option<f64>,
    /// Average speed in km/h.
    pub speed_kmh: Option<f64>,
    /// Minute of day at which routes depart.
    pub departure_minute: Option<f64>,
    /// Run budget in milliseconds.
    pub time_budget_ms: Option<u64>,
}

impl ConstraintInput {
    /// Run budget, or the default when unset. A zero budget is rejected
    /// later by validation.
    pub fn time_budget(&self) -> Duration {
        self.time_budget_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIME_BUDGET)
    }
}

/// Explanation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainMode {
    /// Exact per-factor delta against the seed.
    #[default]
    Decomposition,
    /// Sampled local surrogate.
    Perturbation,
}

/// Request for an explanation of the final routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainRequest {
    /// Method.
    pub mode: ExplainMode,
    /// Number of perturbed neighbours; configuration default when unset.
    pub samples: Option<usize>,
    /// Sampling seed; configuration default when unset.
    pub seed: Option<u64>,
}

/// One optimization request.
///
/// # Examples
///
/// ```
/// use u_busroute::api::{AlgorithmMode, BusInput, OptimizationRequest, StopInput};
///
/// let json = r#"{
///     "algorithm": "genetic",
///     "stops": [{"id": 1, "location": {"lat": 12.97, "lng": 77.59}, "riders": 4}],
///     "buses": [{"id": 1, "capacity": 40}]
/// }"#;
/// let req = OptimizationRequest::from_json_str(json).unwrap();
/// assert_eq!(req.algorithm, AlgorithmMode::Genetic);
/// assert_eq!(req.stops[0].riders, 4);
///
/// let built = OptimizationRequest::new(
///     AlgorithmMode::Genetic,
///     vec![StopInput::new(1, 12.97, 77.59, 4)],
///     vec![BusInput::new(1, 40)],
/// );
/// assert_eq!(built.stops, req.stops);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// Pipeline to run.
    #[serde(default)]
    pub algorithm: AlgorithmMode,
    /// Stops to serve.
    pub stops: Vec<StopInput>,
    /// Fleet.
    pub buses: Vec<BusInput>,
    /// Route constraints.
    #[serde(default)]
    pub constraints: ConstraintInput,
    /// Optional depot; open routes without one.
    #[serde(default)]
    pub depot: Option<GeoPoint>,
    /// Conditions for the learned refiner.
    #[serde(default)]
    pub context: Option<Context>,
    /// Rider count source.
    #[serde(default)]
    pub rider_source: RiderSource,
    /// Explanation to attach.
    #[serde(default)]
    pub explain: Option<ExplainRequest>,
    /// Random seed; drawn from entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl OptimizationRequest {
    /// Creates a request with default constraints.
    pub fn new(algorithm: AlgorithmMode, stops: Vec<StopInput>, buses: Vec<BusInput>) -> Self {
        Self {
            algorithm,
            stops,
            buses,
            constraints: ConstraintInput::default(),
            depot: None,
            context: None,
            rider_source: RiderSource::Observed,
            explain: None,
            seed: None,
        }
    }

    /// Parses a JSON request.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets constraints.
    pub fn with_constraints(mut self, constraints: ConstraintInput) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the depot.
    pub fn with_depot(mut self, lat: f64, lng: f64) -> Self {
        self.depot = Some(GeoPoint::new(lat, lng));
        self
    }

    /// Sets the refinement context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the rider source.
    pub fn with_rider_source(mut self, source: RiderSource) -> Self {
        self.rider_source = source;
        self
    }

    /// Requests an explanation.
    pub fn with_explain(mut self, explain: ExplainRequest) -> Self {
        self.explain = Some(explain);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_phases() {
        assert!(AlgorithmMode::Hybrid.runs_genetic());
        assert!(AlgorithmMode::Hybrid.runs_refiner());
        assert!(!AlgorithmMode::Genetic.runs_refiner());
        assert!(!AlgorithmMode::Rl.runs_genetic());
    }

    #[test]
    fn test_mode_serde_lowercase() {
        let json = serde_json::to_string(&AlgorithmMode::Rl).expect("serialize");
        assert_eq!(json, "\"rl\"");
    }

    #[test]
    fn test_unlocated_stop() {
        let s = StopInput::unlocated(3, 2);
        assert!(s.location.is_none());
        assert_eq!(s.riders, 2);
    }

    #[test]
    fn test_missing_location_parses() {
        let json = r#"{"stops":[{"id":1,"riders":3}],"buses":[{"id":1,"capacity":10,"status":"maintenance"}]}"#;
        let req = OptimizationRequest::from_json_str(json).expect("parse");
        assert!(req.stops[0].location.is_none());
        assert_eq!(req.buses[0].status, BusStatus::Maintenance);
        assert_eq!(req.algorithm, AlgorithmMode::Hybrid);
    }

    #[test]
    fn test_builders() {
        let req = OptimizationRequest::new(AlgorithmMode::Rl, vec![], vec![])
            .with_depot(1.0, 2.0)
            .with_seed(9)
            .with_rider_source(RiderSource::Forecast)
            .with_explain(ExplainRequest {
                mode: ExplainMode::Perturbation,
                samples: Some(20),
                seed: Some(1),
            });
        assert_eq!(req.depot, Some(GeoPoint::new(1.0, 2.0)));
        assert_eq!(req.seed, Some(9));
        assert_eq!(req.explain.as_ref().map(|e| e.mode), Some(ExplainMode::Perturbation));
    }
}
