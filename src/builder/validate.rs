//! Request validation and normalization into model types.

use std::collections::HashSet;
use std::time::Duration;

use crate::api::{BusInput, ConstraintInput, StopInput};
use crate::error::ValidationError;
use crate::models::{Bus, ConstraintSet, GeoPoint, Stop, TimeWindow};

/// Validated fleet: eligible buses plus the ids that were skipped.
#[derive(Debug, Clone)]
pub(crate) struct Fleet {
    pub eligible: Vec<Bus>,
    pub inactive: Vec<u64>,
}

/// Converts stop inputs to stops with the given rider counts.
///
/// `riders[i]` overrides the observed count of `inputs[i]`; observed and
/// embedded predicted counts are still range-checked.
pub(crate) fn stops(inputs: &[StopInput], riders: &[u32]) -> Result<Vec<Stop>, ValidationError> {
    if inputs.is_empty() {
        return Err(ValidationError::NoStops);
    }
    let mut seen = HashSet::with_capacity(inputs.len());
    let mut out = Vec::with_capacity(inputs.len());

    for (input, &count) in inputs.iter().zip(riders) {
        if !seen.insert(input.id) {
            return Err(ValidationError::DuplicateStop(input.id));
        }
        let location = input.location.ok_or(ValidationError::MissingCoordinate {
            stop_id: input.id,
        })?;
        if !location.is_valid() {
            return Err(ValidationError::InvalidCoordinate {
                stop_id: input.id,
                lat: location.lat,
                lng: location.lng,
            });
        }
        rider_count(input.id, input.riders)?;
        if let Some(predicted) = input.predicted_riders {
            rider_count(input.id, predicted)?;
        }

        let mut stop = Stop::new(input.id, location, count);
        if let Some(w) = input.time_window {
            let tw = TimeWindow::new(w.ready, w.due).ok_or(ValidationError::InvalidTimeWindow {
                stop_id: input.id,
                ready: w.ready,
                due: w.due,
            })?;
            stop = stop.with_time_window(tw);
        }
        if let Some(r) = input.geofence_radius_m {
            stop = stop.with_geofence_radius(non_negative("geofence_radius_m", r)?);
        }
        if let Some(d) = input.dwell_minutes {
            stop = stop.with_dwell_minutes(non_negative("dwell_minutes", d)?);
        }
        out.push(stop);
    }
    Ok(out)
}

/// Rejects counts that are negative or do not fit a `u32`.
fn rider_count(stop_id: u64, riders: i64) -> Result<u32, ValidationError> {
    if riders < 0 {
        return Err(ValidationError::NegativeRiders { stop_id, riders });
    }
    u32::try_from(riders).map_err(|_| ValidationError::RiderCountTooLarge { stop_id, riders })
}

/// Observed rider count, clamped into `u32`.
pub(crate) fn observed_riders(input: &StopInput) -> u32 {
    clamp_count(input.riders)
}

/// Clamps a signed count into `u32`, mapping negatives to zero.
pub(crate) fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

/// Converts bus inputs, splitting off buses that are not active.
pub(crate) fn fleet(inputs: &[BusInput]) -> Result<Fleet, ValidationError> {
    if inputs.is_empty() {
        return Err(ValidationError::NoBuses);
    }
    let mut seen = HashSet::with_capacity(inputs.len());
    let mut eligible = Vec::new();
    let mut inactive = Vec::new();

    for input in inputs {
        if !seen.insert(input.id) {
            return Err(ValidationError::DuplicateBus(input.id));
        }
        if input.capacity <= 0 {
            return Err(ValidationError::NonPositiveCapacity {
                bus_id: input.id,
                capacity: input.capacity,
            });
        }
        let mut bus = Bus::new(input.id, clamp_count(input.capacity)).with_status(input.status);
        if let Some(kpl) = input.km_per_litre {
            if !kpl.is_finite() || kpl <= 0.0 {
                return Err(ValidationError::InvalidFuelEfficiency {
                    bus_id: input.id,
                    km_per_litre: kpl,
                });
            }
            bus = bus.with_fuel_efficiency(kpl);
        }
        if bus.is_eligible() {
            eligible.push(bus);
        } else {
            inactive.push(bus.id());
        }
    }

    if eligible.is_empty() {
        return Err(ValidationError::NoActiveBus {
            count: inputs.len(),
        });
    }
    Ok(Fleet { eligible, inactive })
}

/// Converts constraint inputs, applying defaults for unset fields.
pub(crate) fn constraints(input: &ConstraintInput) -> Result<ConstraintSet, ValidationError> {
    let mut set = ConstraintSet::default();
    if let Some(m) = input.max_route_minutes {
        set = set.with_max_route_minutes(positive("max_route_minutes", m)?);
    }
    if let Some(km) = input.max_route_km {
        set = set.with_max_route_km(positive("max_route_km", km)?);
    }
    if let Some(s) = input.speed_kmh {
        set = set.with_speed_kmh(positive("speed_kmh", s)?);
    }
    if let Some(d) = input.departure_minute {
        set = set.with_departure_minute(non_negative("departure_minute", d)?);
    }
    if let Some(ms) = input.time_budget_ms {
        if ms == 0 {
            return Err(ValidationError::InvalidConstraint {
                name: "time_budget_ms",
                value: 0.0,
            });
        }
        set = set.with_time_budget(Duration::from_millis(ms));
    }
    Ok(set)
}

/// Checks the depot coordinate.
pub(crate) fn depot(depot: Option<GeoPoint>) -> Result<Option<GeoPoint>, ValidationError> {
    match depot {
        Some(p) if !p.is_valid() => Err(ValidationError::InvalidDepot {
            lat: p.lat,
            lng: p.lng,
        }),
        other => Ok(other),
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidConstraint { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidConstraint { name, value })
    }
}
