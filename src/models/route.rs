//! Materialized route and visit types.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// A single pickup within a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Stop id being visited.
    pub stop_id: u64,
    /// Zero-based position in the route.
    pub sequence: usize,
    /// Stop coordinate.
    pub location: GeoPoint,
    /// Arrival minute of day.
    pub arrival_minute: f64,
    /// Riders on board after this pickup.
    pub load_after: u32,
}

/// The externally visible route of one bus with aggregate metrics.
///
/// # Examples
///
/// ```
/// use u_busroute::models::{GeoPoint, Route, Visit};
///
/// let mut route = Route::new(7, 40);
/// route.push_visit(Visit {
///     stop_id: 3,
///     sequence: 0,
///     location: GeoPoint::new(1.0, 1.0),
///     arrival_minute: 425.0,
///     load_after: 10,
/// });
/// assert_eq!(route.len(), 1);
/// assert_eq!(route.riders(), 10);
/// assert!((route.utilization() - 0.25).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    bus_id: u64,
    capacity: u32,
    visits: Vec<Visit>,
    distance_km: f64,
    duration_minutes: f64,
    fuel_litres: f64,
    riders: u32,
    score: f64,
}

impl Route {
    /// Creates an empty route for the given bus.
    pub fn new(bus_id: u64, capacity: u32) -> Self {
        Self {
            bus_id,
            capacity,
            visits: Vec::new(),
            distance_km: 0.0,
            duration_minutes: 0.0,
            fuel_litres: 0.0,
            riders: 0,
            score: 0.0,
        }
    }

    /// Appends a visit to the end of this route.
    pub fn push_visit(&mut self, visit: Visit) {
        self.riders = visit.load_after;
        self.visits.push(visit);
    }

    /// Bus serving this route.
    pub fn bus_id(&self) -> u64 {
        self.bus_id
    }

    /// Seating capacity of the bus.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Ordered visits.
    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// Number of stops on the route.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Returns `true` if the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Stop ids in visit order.
    pub fn stop_ids(&self) -> Vec<u64> {
        self.visits.iter().map(|v| v.stop_id).collect()
    }

    /// Total route distance in km.
    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    /// Total route duration in minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.duration_minutes
    }

    /// Estimated fuel in litres.
    pub fn fuel_litres(&self) -> f64 {
        self.fuel_litres
    }

    /// Riders on board at the end of the route.
    pub fn riders(&self) -> u32 {
        self.riders
    }

    /// This route's share of the fitness score.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Riders divided by capacity.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.riders as f64 / self.capacity as f64
    }

    /// Sets the total distance (used by the evaluator).
    pub fn set_distance_km(&mut self, km: f64) {
        self.distance_km = km;
    }

    /// Sets the total duration (used by the evaluator).
    pub fn set_duration_minutes(&mut self, minutes: f64) {
        self.duration_minutes = minutes;
    }

    /// Sets the fuel estimate (used by the evaluator).
    pub fn set_fuel_litres(&mut self, litres: f64) {
        self.fuel_litres = litres;
    }

    /// Sets the fitness share (used by the finalizer).
    pub fn set_score(&mut self, score: f64) {
        self.score = score;
    }
}
