//! Normalized problem model shared by every search phase.

use crate::distance::{centroid, haversine_km, TravelMatrix};

use super::{Bus, ConstraintSet, GeoPoint, Stop};

/// The validated, read-only view of one routing request.
///
/// Holds the stops, the *eligible* buses (index `b` here is sequence `b` of
/// a [`Candidate`](super::Candidate)), the constraint set, and the travel
/// matrix. Built once per run by the builder and borrowed by the evaluator
/// and both search components.
///
/// # Examples
///
/// ```
/// use u_busroute::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
///
/// let stops = vec![
///     Stop::new(10, GeoPoint::new(0.0, 0.0), 5),
///     Stop::new(11, GeoPoint::new(0.0, 0.01), 7),
/// ];
/// let model = ProblemModel::new(stops, vec![Bus::new(1, 20)], ConstraintSet::default(), None);
/// assert_eq!(model.num_stops(), 2);
/// assert_eq!(model.total_demand(), 12);
/// assert_eq!(model.stop_index(11), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct ProblemModel {
    stops: Vec<Stop>,
    buses: Vec<Bus>,
    constraints: ConstraintSet,
    travel: TravelMatrix,
    depot: Option<GeoPoint>,
    anchor: GeoPoint,
    infeasible: bool,
}

impl ProblemModel {
    /// Builds the model and its travel matrix.
    ///
    /// Inputs are expected to be validated already; `buses` should contain
    /// only eligible buses.
    pub fn new(
        stops: Vec<Stop>,
        buses: Vec<Bus>,
        constraints: ConstraintSet,
        depot: Option<GeoPoint>,
    ) -> Self {
        let points: Vec<GeoPoint> = stops.iter().map(Stop::location).collect();
        let travel = TravelMatrix::build(&points, depot, constraints.speed_kmh());
        let anchor = depot
            .or_else(|| centroid(&points))
            .unwrap_or(GeoPoint::new(0.0, 0.0));
        Self {
            stops,
            buses,
            constraints,
            travel,
            depot,
            anchor,
            infeasible: false,
        }
    }

    /// All stops, indexed `0..num_stops`.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Stop at index `i`.
    pub fn stop(&self, i: usize) -> &Stop {
        &self.stops[i]
    }

    /// Eligible buses, indexed `0..num_buses`.
    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    /// Bus at index `b`.
    pub fn bus(&self, b: usize) -> &Bus {
        &self.buses[b]
    }

    /// Number of stops.
    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    /// Number of eligible buses.
    pub fn num_buses(&self) -> usize {
        self.buses.len()
    }

    /// Route constraints.
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Travel matrix over stops and depot.
    pub fn travel(&self) -> &TravelMatrix {
        &self.travel
    }

    /// Depot coordinate, if routes start and end at one.
    pub fn depot(&self) -> Option<GeoPoint> {
        self.depot
    }

    /// Riders waiting at stop `i`.
    pub fn riders(&self, i: usize) -> u32 {
        self.stops[i].riders()
    }

    /// Kilometres of a leg; `None` endpoints are the depot.
    pub fn leg_km(&self, from: Option<usize>, to: Option<usize>) -> f64 {
        self.travel.leg_km(from, to)
    }

    /// Minutes of a leg; `None` endpoints are the depot.
    pub fn leg_minutes(&self, from: Option<usize>, to: Option<usize>) -> f64 {
        self.travel.leg_minutes(from, to)
    }

    /// Distance from the route anchor (depot, or fleet centroid for open
    /// routes) to stop `i`.
    pub fn anchor_km(&self, i: usize) -> f64 {
        match self.travel.depot() {
            Some(d) => self.travel.km(d, i),
            None => haversine_km(self.anchor, self.stops[i].location()),
        }
    }

    /// Sum of riders over all stops.
    pub fn total_demand(&self) -> u64 {
        self.stops.iter().map(|s| u64::from(s.riders())).sum()
    }

    /// Sum of seats over eligible buses.
    pub fn total_capacity(&self) -> u64 {
        self.buses.iter().map(|b| u64::from(b.capacity())).sum()
    }

    /// Index of the stop with the given external id.
    pub fn stop_index(&self, id: u64) -> Option<usize> {
        self.stops.iter().position(|s| s.id() == id)
    }

    /// Whether the builder flagged the problem as infeasible.
    ///
    /// Only infeasible problems may leave stops unassigned.
    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    pub(crate) fn set_infeasible(&mut self, infeasible: bool) {
        self.infeasible = infeasible;
    }
}
