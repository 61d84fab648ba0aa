//! Error and degradation types.
//!
//! Only [`ValidationError`] aborts a run. Everything else the engine can
//! recover from is reported as a [`Warning`] and, when it affects the
//! result, a [`PartialReason`] on the outcome.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Violation;

/// Malformed or missing request input, rejected before any computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The request contains no stops.
    #[error("request contains no stops")]
    NoStops,

    /// The request contains no buses.
    #[error("request contains no buses")]
    NoBuses,

    /// Buses were supplied but none of them is active.
    #[error("none of the {count} buses is active")]
    NoActiveBus {
        /// Number of buses in the request.
        count: usize,
    },

    /// A stop has no coordinate.
    #[error("stop {stop_id} has no coordinate")]
    MissingCoordinate {
        /// Offending stop.
        stop_id: u64,
    },

    /// A stop coordinate is non-finite or outside lat/lng range.
    #[error("stop {stop_id} has an invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        /// Offending stop.
        stop_id: u64,
        /// Latitude as supplied.
        lat: f64,
        /// Longitude as supplied.
        lng: f64,
    },

    /// A stop reports a negative rider count.
    #[error("stop {stop_id} has negative rider count {riders}")]
    NegativeRiders {
        /// Offending stop.
        stop_id: u64,
        /// Rider count as supplied.
        riders: i64,
    },

    /// A stop reports more riders than a count can hold.
    #[error("stop {stop_id} has rider count {riders} above {}", u32::MAX)]
    RiderCountTooLarge {
        /// Offending stop.
        stop_id: u64,
        /// Rider count as supplied.
        riders: i64,
    },

    /// A stop time window is reversed or non-finite.
    #[error("stop {stop_id} has an invalid time window [{ready}, {due}]")]
    InvalidTimeWindow {
        /// Offending stop.
        stop_id: u64,
        /// Window start as supplied.
        ready: f64,
        /// Window end as supplied.
        due: f64,
    },

    /// A bus has zero or negative capacity.
    #[error("bus {bus_id} has non-positive capacity {capacity}")]
    NonPositiveCapacity {
        /// Offending bus.
        bus_id: u64,
        /// Capacity as supplied.
        capacity: i64,
    },

    /// A bus has a zero, negative, or non-finite fuel efficiency.
    #[error("bus {bus_id} has invalid fuel efficiency {km_per_litre}")]
    InvalidFuelEfficiency {
        /// Offending bus.
        bus_id: u64,
        /// Efficiency as supplied.
        km_per_litre: f64,
    },

    /// Two stops share an id.
    #[error("duplicate stop id {0}")]
    DuplicateStop(u64),

    /// Two buses share an id.
    #[error("duplicate bus id {0}")]
    DuplicateBus(u64),

    /// A constraint value is non-positive or non-finite.
    #[error("constraint {name} has invalid value {value}")]
    InvalidConstraint {
        /// Constraint field name.
        name: &'static str,
        /// Value as supplied.
        value: f64,
    },

    /// The depot coordinate is non-finite or out of range.
    #[error("depot has an invalid coordinate ({lat}, {lng})")]
    InvalidDepot {
        /// Latitude as supplied.
        lat: f64,
        /// Longitude as supplied.
        lng: f64,
    },
}

/// Invalid solver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter is out of its allowed range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Parameter name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures of the learned value store.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A compare-and-swap found a newer version than expected.
    #[error("policy version conflict: expected {expected}, found {found}")]
    VersionConflict {
        /// Version the writer based its update on.
        expected: u64,
        /// Version currently published.
        found: u64,
    },

    /// A loaded policy has the wrong number of weights.
    #[error("policy weight vector has length {found}, expected {expected}")]
    Shape {
        /// Required weights per action kind.
        expected: usize,
        /// Weights found in the document.
        found: usize,
    },

    /// The policy document is not valid JSON for a snapshot.
    #[error("policy serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    /// Reading or writing the policy file failed.
    #[error("policy i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A recoverable condition recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Some stops could not be placed on any bus.
    InfeasibleProblem {
        /// Total riders requested.
        total_demand: u64,
        /// Total seats across eligible buses.
        total_capacity: u64,
        /// Stops left without a bus.
        unassigned: Vec<u64>,
    },

    /// Buses that were ignored because they are not active.
    InactiveBusesIgnored {
        /// Ignored bus ids.
        bus_ids: Vec<u64>,
    },

    /// Forecast riders were requested but unavailable for these stops.
    ForecastUnavailable {
        /// Stops that kept their observed rider count.
        stop_ids: Vec<u64>,
    },

    /// The final solution still violates a hard constraint.
    ConstraintViolated {
        /// The violation found by the final evaluation.
        violation: Violation,
    },
}

/// Why a result is incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialReason {
    /// The time budget expired before the search finished.
    BudgetExhausted,
    /// The caller cancelled the run.
    Cancelled,
    /// The problem is infeasible: unassigned stops or violated constraints.
    Infeasible,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let e = ValidationError::MissingCoordinate { stop_id: 7 };
        assert_eq!(e.to_string(), "stop 7 has no coordinate");
        let e = ValidationError::NonPositiveCapacity {
            bus_id: 2,
            capacity: 0,
        };
        assert_eq!(e.to_string(), "bus 2 has non-positive capacity 0");
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let w = Warning::InactiveBusesIgnored { bus_ids: vec![3] };
        let json = serde_json::to_string(&w).expect("serialize");
        assert!(json.contains("\"kind\":\"inactive_buses_ignored\""));
    }

    #[test]
    fn test_partial_reason_snake_case() {
        let json = serde_json::to_string(&PartialReason::BudgetExhausted).expect("serialize");
        assert_eq!(json, "\"budget_exhausted\"");
    }
}
