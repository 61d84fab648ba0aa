//! Pickup stop, coordinate, and time window types.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
///
/// # Examples
///
/// ```
/// use u_busroute::models::GeoPoint;
///
/// let p = GeoPoint::new(12.97, 77.59);
/// assert!(p.is_valid());
/// assert!(!GeoPoint::new(91.0, 0.0).is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, -90..=90.
    pub lat: f64,
    /// Longitude in degrees, -180..=180.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a coordinate. No range check; see [`is_valid`](Self::is_valid).
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` if both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A pickup time window in minutes from midnight.
///
/// The bus may arrive early and wait until `ready`; arriving after `due` is
/// lateness and is penalized by the fitness function.
///
/// # Examples
///
/// ```
/// use u_busroute::models::TimeWindow;
///
/// let tw = TimeWindow::new(420.0, 450.0).unwrap();
/// assert!(tw.contains(430.0));
/// assert_eq!(tw.lateness(460.0), 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    ready: f64,
    due: f64,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `ready > due` or either value is non-finite.
    pub fn new(ready: f64, due: f64) -> Option<Self> {
        if !ready.is_finite() || !due.is_finite() || ready > due {
            return None;
        }
        Some(Self { ready, due })
    }

    /// Earliest pickup minute.
    pub fn ready(&self) -> f64 {
        self.ready
    }

    /// Latest pickup minute.
    pub fn due(&self) -> f64 {
        self.due
    }

    /// Returns `true` if the given minute falls within this window.
    pub fn contains(&self, minute: f64) -> bool {
        minute >= self.ready && minute <= self.due
    }

    /// Waiting time when arriving at `arrival`; zero if on time or late.
    pub fn waiting_time(&self, arrival: f64) -> f64 {
        (self.ready - arrival).max(0.0)
    }

    /// Minutes past `due`; zero if on time or early.
    pub fn lateness(&self, arrival: f64) -> f64 {
        (arrival - self.due).max(0.0)
    }

    /// Minutes left before `due`; negative when late.
    pub fn slack(&self, arrival: f64) -> f64 {
        self.due - arrival
    }
}

/// Default geofence radius around a stop, in metres.
pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 100.0;

/// A pickup stop.
///
/// Immutable for the duration of a run. The rider count is either the
/// observed count or a forecast substituted by the builder.
///
/// # Examples
///
/// ```
/// use u_busroute::models::{GeoPoint, Stop};
///
/// let s = Stop::new(4, GeoPoint::new(12.97, 77.59), 6);
/// assert_eq!(s.id(), 4);
/// assert_eq!(s.riders(), 6);
/// assert!(s.time_window().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    id: u64,
    location: GeoPoint,
    riders: u32,
    time_window: Option<TimeWindow>,
    geofence_radius_m: f64,
    dwell_minutes: f64,
}

impl Stop {
    /// Creates a stop with no time window, default geofence, and no dwell.
    pub fn new(id: u64, location: GeoPoint, riders: u32) -> Self {
        Self {
            id,
            location,
            riders,
            time_window: None,
            geofence_radius_m: DEFAULT_GEOFENCE_RADIUS_M,
            dwell_minutes: 0.0,
        }
    }

    /// Sets a pickup time window.
    pub fn with_time_window(mut self, tw: TimeWindow) -> Self {
        self.time_window = Some(tw);
        self
    }

    /// Sets the geofence radius in metres.
    pub fn with_geofence_radius(mut self, metres: f64) -> Self {
        self.geofence_radius_m = metres;
        self
    }

    /// Sets the boarding dwell time in minutes.
    pub fn with_dwell_minutes(mut self, minutes: f64) -> Self {
        self.dwell_minutes = minutes;
        self
    }

    /// External stop id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop coordinate.
    pub fn location(&self) -> GeoPoint {
        self.location
    }

    /// Riders boarding at this stop.
    pub fn riders(&self) -> u32 {
        self.riders
    }

    /// Pickup time window, if any.
    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    /// Geofence radius in metres.
    pub fn geofence_radius_m(&self) -> f64 {
        self.geofence_radius_m
    }

    /// Boarding dwell time in minutes.
    pub fn dwell_minutes(&self) -> f64 {
        self.dwell_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_valid() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert_eq!(tw.ready(), 10.0);
        assert_eq!(tw.due(), 20.0);
    }

    #[test]
    fn test_time_window_invalid() {
        assert!(TimeWindow::new(20.0, 10.0).is_none());
        assert!(TimeWindow::new(f64::NAN, 10.0).is_none());
        assert!(TimeWindow::new(10.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_time_window_waiting_and_lateness() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert!((tw.waiting_time(5.0) - 5.0).abs() < 1e-10);
        assert_eq!(tw.waiting_time(15.0), 0.0);
        assert_eq!(tw.lateness(15.0), 0.0);
        assert!((tw.lateness(22.5) - 2.5).abs() < 1e-10);
        assert!((tw.slack(15.0) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_geo_point_range() {
        assert!(GeoPoint::new(0.0, 0.0).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(0.0, 180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_stop_builder() {
        let tw = TimeWindow::new(420.0, 450.0).expect("valid");
        let s = Stop::new(1, GeoPoint::new(1.0, 2.0), 5)
            .with_time_window(tw)
            .with_geofence_radius(50.0)
            .with_dwell_minutes(1.5);
        assert_eq!(s.id(), 1);
        assert_eq!(s.location(), GeoPoint::new(1.0, 2.0));
        assert_eq!(s.time_window().expect("has tw").due(), 450.0);
        assert_eq!(s.geofence_radius_m(), 50.0);
        assert_eq!(s.dwell_minutes(), 1.5);
    }
}
