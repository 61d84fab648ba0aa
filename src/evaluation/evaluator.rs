//! Route evaluator that computes timing, load, and feasibility.

use crate::models::{ProblemModel, Route, Violation, ViolationType, Visit};

/// Aggregate metrics of one bus sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteMetrics {
    /// Travelled kilometres, including depot legs when a depot exists.
    pub distance_km: f64,
    /// Minutes from departure until the route ends.
    pub duration_minutes: f64,
    /// Fuel burned by this bus over the distance.
    pub fuel_litres: f64,
    /// Riders picked up.
    pub load: u32,
    /// Riders above the bus capacity.
    pub overflow: u32,
    /// Kilometres above the route distance limit.
    pub excess_km: f64,
    /// Minutes above the route duration limit.
    pub excess_minutes: f64,
    /// Summed lateness over time windows, in minutes.
    pub lateness_minutes: f64,
}

/// Evaluates bus sequences by computing visit timing, cumulative load, total
/// distance, and checking constraints (capacity, time windows, max
/// distance/duration).
///
/// Every route departs at the constraint set's departure minute. A bus that
/// arrives before a window opens waits; dwell time is spent after service
/// starts.
///
/// # Examples
///
/// ```
/// use u_busroute::evaluation::RouteEvaluator;
/// use u_busroute::models::{Bus, ConstraintSet, GeoPoint, ProblemModel, Stop};
///
/// let stops = vec![
///     Stop::new(1, GeoPoint::new(0.0, 0.0), 10),
///     Stop::new(2, GeoPoint::new(0.0, 0.05), 20),
/// ];
/// let model = ProblemModel::new(stops, vec![Bus::new(7, 100)], ConstraintSet::default(), None);
///
/// let evaluator = RouteEvaluator::new(&model);
/// let (route, violations) = evaluator.build_route(0, &[0, 1]);
/// assert_eq!(route.len(), 2);
/// assert_eq!(route.riders(), 30);
/// assert!(violations.is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RouteEvaluator<'a> {
    problem: &'a ProblemModel,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates a new evaluator for the given problem.
    pub fn new(problem: &'a ProblemModel) -> Self {
        Self { problem }
    }

    /// Computes metrics for bus `bus` serving `stops` in order.
    pub fn metrics(&self, bus: usize, stops: &[usize]) -> RouteMetrics {
        self.walk(bus, stops, |_, _| {})
    }

    /// Builds a route from a sequence of stop indices, computing timing and
    /// load.
    ///
    /// Returns the constructed route and any constraint violations found.
    pub fn build_route(&self, bus: usize, stops: &[usize]) -> (Route, Vec<Violation>) {
        let vehicle = self.problem.bus(bus);
        let mut route = Route::new(vehicle.id(), vehicle.capacity());
        let mut violations = Vec::new();

        let metrics = self.walk(bus, stops, |visit, due| {
            if let Some(due) = due {
                violations.push(Violation::new(ViolationType::TimeWindowViolated {
                    stop_id: visit.stop_id,
                    arrival: visit.arrival_minute,
                    due,
                }));
            }
            route.push_visit(visit);
        });

        route.set_distance_km(metrics.distance_km);
        route.set_duration_minutes(metrics.duration_minutes);
        route.set_fuel_litres(metrics.fuel_litres);
        violations.extend(self.limit_violations(bus, &metrics));
        (route, violations)
    }

    /// Capacity and route-limit violations implied by `metrics`.
    pub fn limit_violations(&self, bus: usize, metrics: &RouteMetrics) -> Vec<Violation> {
        let vehicle = self.problem.bus(bus);
        let constraints = self.problem.constraints();
        let mut violations = Vec::new();

        if metrics.overflow > 0 {
            violations.push(Violation::new(ViolationType::CapacityExceeded {
                bus_id: vehicle.id(),
                load: metrics.load,
                capacity: vehicle.capacity(),
            }));
        }
        if let Some(max_d) = constraints.max_route_km() {
            if metrics.excess_km > 0.0 {
                violations.push(Violation::new(ViolationType::MaxDistanceExceeded {
                    bus_id: vehicle.id(),
                    distance: metrics.distance_km,
                    max_distance: max_d,
                }));
            }
        }
        if let Some(max_t) = constraints.max_route_minutes() {
            if metrics.excess_minutes > 0.0 {
                violations.push(Violation::new(ViolationType::MaxDurationExceeded {
                    bus_id: vehicle.id(),
                    duration: metrics.duration_minutes,
                    max_duration: max_t,
                }));
            }
        }
        violations
    }

    /// Walks the sequence, reporting each visit and, for late arrivals, the
    /// missed due minute.
    fn walk<F>(&self, bus: usize, stops: &[usize], mut on_visit: F) -> RouteMetrics
    where
        F: FnMut(Visit, Option<f64>),
    {
        let problem = self.problem;
        let vehicle = problem.bus(bus);
        let constraints = problem.constraints();
        let start = constraints.departure_minute();

        let mut metrics = RouteMetrics::default();
        if stops.is_empty() {
            return metrics;
        }

        let mut current_time = start;
        let mut prev = None;
        for (sequence, &s) in stops.iter().enumerate() {
            metrics.distance_km += problem.leg_km(prev, Some(s));
            let arrival = current_time + problem.leg_minutes(prev, Some(s));
            let stop = problem.stop(s);

            let mut missed_due = None;
            let service_start = match stop.time_window() {
                Some(tw) => {
                    let late = tw.lateness(arrival);
                    if late > 0.0 {
                        metrics.lateness_minutes += late;
                        missed_due = Some(tw.due());
                    }
                    arrival + tw.waiting_time(arrival)
                }
                None => arrival,
            };

            metrics.load = metrics.load.saturating_add(stop.riders());
            on_visit(
                Visit {
                    stop_id: stop.id(),
                    sequence,
                    location: stop.location(),
                    arrival_minute: arrival,
                    load_after: metrics.load,
                },
                missed_due,
            );

            current_time = service_start + stop.dwell_minutes();
            prev = Some(s);
        }

        // Closing leg back to the depot; free for open routes.
        metrics.distance_km += problem.leg_km(prev, None);
        let end = current_time + problem.leg_minutes(prev, None);

        metrics.duration_minutes = end - start;
        metrics.fuel_litres = vehicle.fuel_litres(metrics.distance_km);
        metrics.overflow = metrics.load.saturating_sub(vehicle.capacity());
        if let Some(max_d) = constraints.max_route_km() {
            metrics.excess_km = (metrics.distance_km - max_d).max(0.0);
        }
        if let Some(max_t) = constraints.max_route_minutes() {
            metrics.excess_minutes = (metrics.duration_minutes - max_t).max(0.0);
        }
        metrics
    }
}
