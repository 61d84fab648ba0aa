//! Optimization response types.

use serde::{Deserialize, Serialize};

use crate::error::{PartialReason, Warning};
use crate::explain::Explanation;
use crate::models::Route;

use super::AlgorithmMode;

/// Fleet-wide totals of the final routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Kilometres over all routes.
    pub total_distance_km: f64,
    /// Route minutes over all routes.
    pub total_minutes: f64,
    /// Stops served.
    pub stop_count: usize,
    /// Fuel in litres.
    pub fuel_litres: f64,
    /// Riders picked up.
    pub riders: u64,
    /// Riders over seats of the buses that received a route.
    pub utilization: f64,
    /// Fitness of the final candidate.
    pub score: f64,
}

/// The result of one run.
///
/// `partial` is `false` only when the search finished within its budget,
/// every stop is served, and no hard constraint is violated;
/// `partial_reasons` then is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    /// Pipeline that produced the routes.
    pub algorithm: AlgorithmMode,
    /// Totals.
    pub metrics: RunMetrics,
    /// One route per bus that serves at least one stop.
    pub routes: Vec<Route>,
    /// Ids of stops no bus serves.
    pub unassigned: Vec<u64>,
    /// Recoverable conditions.
    pub warnings: Vec<Warning>,
    /// Whether the result is incomplete.
    pub partial: bool,
    /// Why the result is incomplete.
    pub partial_reasons: Vec<PartialReason>,
    /// Explanation, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

impl OptimizationResponse {
    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Route of the given bus, if it serves any stop.
    pub fn route_for(&self, bus_id: u64) -> Option<&Route> {
        self.routes.iter().find(|r| r.bus_id() == bus_id)
    }
}
