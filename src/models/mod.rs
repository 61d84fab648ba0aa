//! Domain model types for bus routing.
//!
//! Stops with rider counts and time windows, buses with capacity and fuel
//! efficiency, per-route constraints, the candidate solution representation,
//! the materialized output routes, and the [`ProblemModel`] that ties them
//! together.

mod bus;
mod constraints;
mod problem;
mod route;
mod solution;
mod stop;

pub use bus::{Bus, BusStatus, DEFAULT_KM_PER_LITRE};
pub use constraints::{
    ConstraintSet, DEFAULT_DEPARTURE_MINUTE, DEFAULT_SPEED_KMH, DEFAULT_TIME_BUDGET,
};
pub use problem::ProblemModel;
pub use route::{Route, Visit};
pub use solution::{Candidate, Violation, ViolationType};
pub use stop::{GeoPoint, Stop, TimeWindow, DEFAULT_GEOFENCE_RADIUS_M};
