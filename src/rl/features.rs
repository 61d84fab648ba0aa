//! State and action features for the learned value function.
//!
//! A feature vector concatenates a description of the current candidate
//! under its operating [`Context`] with a cheap description of one
//! proposed edit. All entries are scaled to roughly `[-1, 1]`.

use serde::{Deserialize, Serialize};

use crate::local_search::{route_load, Move};
use crate::models::{Candidate, ProblemModel};

/// Length of a feature vector.
pub const FEATURE_DIM: usize = 12;

/// Weather condition during the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// Dry.
    #[default]
    Clear,
    /// Light rain.
    Rain,
    /// Heavy rain.
    HeavyRain,
    /// Snow.
    Snow,
}

impl Weather {
    /// Severity in `[0, 1]`.
    pub fn factor(self) -> f64 {
        match self {
            Weather::Clear => 0.0,
            Weather::Rain => 0.5,
            Weather::HeavyRain => 1.0,
            Weather::Snow => 0.8,
        }
    }
}

/// Operating conditions the policy conditions on.
///
/// # Examples
///
/// ```
/// use u_busroute::rl::{Context, Weather};
///
/// let ctx = Context::default().with_weather(Weather::Snow).with_traffic(0.7);
/// assert_eq!(ctx.weather.factor(), 0.8);
/// assert_eq!(ctx.traffic_level, 0.7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// Minute of day.
    pub time_of_day_min: f64,
    /// Congestion in `[0, 1]`.
    pub traffic_level: f64,
    /// Weather.
    pub weather: Weather,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            time_of_day_min: 420.0,
            traffic_level: 0.0,
            weather: Weather::Clear,
        }
    }
}

impl Context {
    /// Sets the minute of day.
    pub fn with_time_of_day(mut self, minute: f64) -> Self {
        self.time_of_day_min = minute;
        self
    }

    /// Sets the traffic level, clamped to `[0, 1]`.
    pub fn with_traffic(mut self, level: f64) -> Self {
        self.traffic_level = level.clamp(0.0, 1.0);
        self
    }

    /// Sets the weather.
    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }
}

/// Feature vector of a proposed edit `mv` turning `before` into `after`.
///
/// Layout: bias, used-bus share, mean utilisation, overflow share,
/// unassigned share, time of day, traffic, weather, then the edit's
/// relative distance change, overflow change, same-bus flag and reversed
/// segment share.
pub fn features(
    problem: &ProblemModel,
    context: &Context,
    before: &Candidate,
    after: &Candidate,
    mv: &Move,
) -> [f64; FEATURE_DIM] {
    let num_buses = before.num_buses().max(1) as f64;
    let capacity = problem.total_capacity().max(1) as f64;
    let num_stops = problem.num_stops().max(1) as f64;

    let (mut utilization, mut used, mut overflow) = (0.0, 0usize, 0u64);
    for (b, seq) in before.sequences().iter().enumerate() {
        if seq.is_empty() {
            continue;
        }
        let load = route_load(problem, seq);
        let cap = problem.bus(b).capacity();
        utilization += f64::from(load) / f64::from(cap.max(1));
        overflow += u64::from(load.saturating_sub(cap));
        used += 1;
    }
    let mean_utilization = if used > 0 {
        utilization / used as f64
    } else {
        0.0
    };

    let (a, b) = mv.buses();
    let touched: &[usize] = if a == b { &[a][..] } else { &[a, b][..] };
    let mut km_before = 0.0;
    let mut km_after = 0.0;
    let mut overflow_delta = 0.0;
    for &bus in touched {
        km_before += sequence_km(problem, before.sequence(bus));
        km_after += sequence_km(problem, after.sequence(bus));
        let cap = problem.bus(bus).capacity();
        let over_before = route_load(problem, before.sequence(bus)).saturating_sub(cap);
        let over_after = route_load(problem, after.sequence(bus)).saturating_sub(cap);
        overflow_delta += f64::from(over_after) - f64::from(over_before);
    }
    let km_delta = (km_after - km_before) / (km_before + 1.0);

    let segment = match *mv {
        Move::Reverse { bus, start, end } => {
            (end - start + 1) as f64 / before.sequence(bus).len().max(1) as f64
        }
        _ => 0.0,
    };

    [
        1.0,
        used as f64 / num_buses,
        mean_utilization.min(2.0),
        overflow as f64 / capacity,
        before.unassigned().len() as f64 / num_stops,
        context.time_of_day_min / 1440.0,
        context.traffic_level,
        context.weather.factor(),
        km_delta.clamp(-1.0, 1.0),
        (overflow_delta / capacity).clamp(-1.0, 1.0),
        if a == b { 1.0 } else { 0.0 },
        segment,
    ]
}

/// Kilometres of one bus sequence, including depot legs.
pub fn sequence_km(problem: &ProblemModel, seq: &[usize]) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let mut km = problem.leg_km(None, Some(seq[0]));
    for w in seq.windows(2) {
        km += problem.travel().km(w[0], w[1]);
    }
    km + problem.leg_km(seq.last().copied(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bus, ConstraintSet, GeoPoint, Stop};

    fn model() -> ProblemModel {
        let stops = (0..4)
            .map(|i| Stop::new(i, GeoPoint::new(0.0, 0.01 * i as f64), 5))
            .collect();
        ProblemModel::new(
            stops,
            vec![Bus::new(1, 10), Bus::new(2, 10)],
            ConstraintSet::default(),
            None,
        )
    }

    #[test]
    fn test_weather_factors() {
        assert_eq!(Weather::Clear.factor(), 0.0);
        assert_eq!(Weather::Rain.factor(), 0.5);
        assert_eq!(Weather::HeavyRain.factor(), 1.0);
        assert_eq!(Weather::Snow.factor(), 0.8);
    }

    #[test]
    fn test_features_shape_and_context() {
        let m = model();
        let before = Candidate::from_sequences(vec![vec![0, 2], vec![1, 3]], vec![]);
        let mv = Move::Swap {
            bus_a: 0,
            pos_a: 1,
            bus_b: 1,
            pos_b: 0,
        };
        let after = mv.apply(&before).expect("valid");
        let ctx = Context::default().with_traffic(0.4).with_weather(Weather::Rain);
        let f = features(&m, &ctx, &before, &after, &mv);
        assert_eq!(f.len(), FEATURE_DIM);
        assert_eq!(f[0], 1.0);
        assert_eq!(f[1], 1.0);
        assert_eq!(f[6], 0.4);
        assert_eq!(f[7], 0.5);
        // Swapping 2 and 1 shortens both routes.
        assert!(f[8] < 0.0);
        assert_eq!(f[10], 0.0);
    }

    #[test]
    fn test_overflow_delta() {
        let m = model();
        let before = Candidate::from_sequences(vec![vec![0, 1], vec![2, 3]], vec![]);
        let mv = Move::Relocate {
            from_bus: 1,
            from_pos: 0,
            to_bus: 0,
            to_pos: 2,
        };
        let after = mv.apply(&before).expect("valid");
        let f = features(&m, &Context::default(), &before, &after, &mv);
        assert!((f[9] - 5.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_sequence_km_open() {
        let m = model();
        assert_eq!(sequence_km(&m, &[]), 0.0);
        assert_eq!(sequence_km(&m, &[2]), 0.0);
        assert!((sequence_km(&m, &[0, 1]) - m.travel().km(0, 1)).abs() < 1e-12);
    }
}
