//! Distance and travel-time matrix over stops and an optional depot.

use crate::models::GeoPoint;

use super::DistanceMatrix;

/// Pairwise travel cost between all stops, plus the depot when one is given.
///
/// Stops occupy indices `0..n`; the depot, if present, is index `n`. Route
/// endpoints are addressed with `Option<usize>` where `None` means "the
/// depot": with no depot, legs to or from `None` cost nothing, which makes
/// routes open paths that start at their first stop.
///
/// # Examples
///
/// ```
/// use u_busroute::distance::TravelMatrix;
/// use u_busroute::models::GeoPoint;
///
/// let stops = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.1)];
/// let tm = TravelMatrix::build(&stops, None, 30.0);
/// assert_eq!(tm.leg_km(None, Some(0)), 0.0);
/// let km = tm.km(0, 1);
/// assert!((tm.minutes(0, 1) - km / 30.0 * 60.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TravelMatrix {
    distance: DistanceMatrix,
    minutes: DistanceMatrix,
    num_stops: usize,
    depot: Option<usize>,
}

impl TravelMatrix {
    /// Builds distances (haversine km) and minutes at `speed_kmh`.
    pub fn build(stops: &[GeoPoint], depot: Option<GeoPoint>, speed_kmh: f64) -> Self {
        let num_stops = stops.len();
        let mut points = stops.to_vec();
        let depot_index = depot.map(|d| {
            points.push(d);
            num_stops
        });
        let distance = DistanceMatrix::from_points(&points);
        let minutes = distance.scaled(60.0 / speed_kmh);
        Self {
            distance,
            minutes,
            num_stops,
            depot: depot_index,
        }
    }

    /// Kilometres between two matrix indices.
    pub fn km(&self, from: usize, to: usize) -> f64 {
        self.distance.get(from, to)
    }

    /// Travel minutes between two matrix indices.
    pub fn minutes(&self, from: usize, to: usize) -> f64 {
        self.minutes.get(from, to)
    }

    /// Kilometres of a route leg; `None` endpoints are the depot.
    pub fn leg_km(&self, from: Option<usize>, to: Option<usize>) -> f64 {
        self.leg(&self.distance, from, to)
    }

    /// Minutes of a route leg; `None` endpoints are the depot.
    pub fn leg_minutes(&self, from: Option<usize>, to: Option<usize>) -> f64 {
        self.leg(&self.minutes, from, to)
    }

    fn leg(&self, matrix: &DistanceMatrix, from: Option<usize>, to: Option<usize>) -> f64 {
        match (from.or(self.depot), to.or(self.depot)) {
            (Some(a), Some(b)) => matrix.get(a, b),
            _ => 0.0,
        }
    }

    /// Depot index, if a depot was supplied.
    pub fn depot(&self) -> Option<usize> {
        self.depot
    }

    /// Number of stops (excluding the depot).
    pub fn num_stops(&self) -> usize {
        self.num_stops
    }

    /// Underlying distance matrix.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<GeoPoint> {
        vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.1), GeoPoint::new(0.1, 0.1)]
    }

    #[test]
    fn test_without_depot_open_legs() {
        let tm = TravelMatrix::build(&stops(), None, 30.0);
        assert!(tm.depot().is_none());
        assert_eq!(tm.num_stops(), 3);
        assert_eq!(tm.leg_km(None, Some(1)), 0.0);
        assert_eq!(tm.leg_km(Some(2), None), 0.0);
        assert_eq!(tm.leg_km(Some(0), Some(1)), tm.km(0, 1));
    }

    #[test]
    fn test_with_depot() {
        let tm = TravelMatrix::build(&stops(), Some(GeoPoint::new(0.05, 0.05)), 30.0);
        assert_eq!(tm.depot(), Some(3));
        assert_eq!(tm.distances().size(), 4);
        assert!(tm.leg_km(None, Some(0)) > 0.0);
        assert_eq!(tm.leg_km(None, Some(0)), tm.km(3, 0));
    }

    #[test]
    fn test_minutes_follow_speed() {
        let tm = TravelMatrix::build(&stops(), None, 60.0);
        assert!((tm.minutes(0, 1) - tm.km(0, 1)).abs() < 1e-9);
    }
}
