//! Per-route constraint set.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default average travel speed in km/h.
pub const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Default start-of-service minute (07:00).
pub const DEFAULT_DEPARTURE_MINUTE: f64 = 420.0;

/// Default wall-clock budget for one optimization run.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(5);

/// Limits applied to every route individually, plus the run time budget.
///
/// Route limits are optional; `None` means unconstrained.
///
/// # Examples
///
/// ```
/// use u_busroute::models::ConstraintSet;
///
/// let c = ConstraintSet::default()
///     .with_max_route_minutes(60.0)
///     .with_max_route_km(50.0);
/// assert_eq!(c.max_route_minutes(), Some(60.0));
/// assert_eq!(c.speed_kmh(), 30.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    max_route_minutes: Option<f64>,
    max_route_km: Option<f64>,
    speed_kmh: f64,
    departure_minute: f64,
    time_budget: Duration,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            max_route_minutes: None,
            max_route_km: None,
            speed_kmh: DEFAULT_SPEED_KMH,
            departure_minute: DEFAULT_DEPARTURE_MINUTE,
            time_budget: DEFAULT_TIME_BUDGET,
        }
    }
}

impl ConstraintSet {
    /// Sets the maximum route duration in minutes.
    pub fn with_max_route_minutes(mut self, minutes: f64) -> Self {
        self.max_route_minutes = Some(minutes);
        self
    }

    /// Sets the maximum route distance in km.
    pub fn with_max_route_km(mut self, km: f64) -> Self {
        self.max_route_km = Some(km);
        self
    }

    /// Sets the average travel speed in km/h.
    pub fn with_speed_kmh(mut self, speed: f64) -> Self {
        self.speed_kmh = speed;
        self
    }

    /// Sets the minute of day at which every route departs.
    pub fn with_departure_minute(mut self, minute: f64) -> Self {
        self.departure_minute = minute;
        self
    }

    /// Sets the wall-clock budget for the run.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Maximum route duration in minutes.
    pub fn max_route_minutes(&self) -> Option<f64> {
        self.max_route_minutes
    }

    /// Maximum route distance in km.
    pub fn max_route_km(&self) -> Option<f64> {
        self.max_route_km
    }

    /// Average travel speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// Minute of day at which routes depart.
    pub fn departure_minute(&self) -> f64 {
        self.departure_minute
    }

    /// Wall-clock budget for the run.
    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }
}
