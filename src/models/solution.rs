//! Candidate solution (chromosome) and constraint violation types.

use serde::{Deserialize, Serialize};

/// A type of hard-constraint violation in a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationType {
    /// Riders on board exceed the bus capacity.
    CapacityExceeded {
        /// Bus id.
        bus_id: u64,
        /// Riders assigned.
        load: u32,
        /// Bus capacity.
        capacity: u32,
    },
    /// Arrival after the stop's time window closes.
    TimeWindowViolated {
        /// Stop id.
        stop_id: u64,
        /// Arrival minute.
        arrival: f64,
        /// Window due minute.
        due: f64,
    },
    /// Route distance exceeds the constraint maximum.
    MaxDistanceExceeded {
        /// Bus id.
        bus_id: u64,
        /// Actual distance in km.
        distance: f64,
        /// Maximum allowed km.
        max_distance: f64,
    },
    /// Route duration exceeds the constraint maximum.
    MaxDurationExceeded {
        /// Bus id.
        bus_id: u64,
        /// Actual duration in minutes.
        duration: f64,
        /// Maximum allowed minutes.
        max_duration: f64,
    },
}

/// A hard-constraint violation in a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// A candidate solution: one visiting sequence per eligible bus.
///
/// Entries are stop *indices* into the problem model (`0..num_stops`), and
/// sequence `b` belongs to the `b`-th eligible bus. Every stop appears
/// exactly once across all sequences and the unassigned list; the unassigned
/// list may only be non-empty for problems flagged infeasible.
///
/// # Examples
///
/// ```
/// use u_busroute::models::Candidate;
///
/// let c = Candidate::from_sequences(vec![vec![0, 2], vec![1]], vec![]);
/// assert!(c.is_valid_partition(3));
/// assert_eq!(c.position_of(2), Some((0, 1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Candidate {
    sequences: Vec<Vec<usize>>,
    unassigned: Vec<usize>,
}

impl Candidate {
    /// Creates a candidate with `num_buses` empty sequences.
    pub fn new(num_buses: usize) -> Self {
        Self {
            sequences: vec![Vec::new(); num_buses],
            unassigned: Vec::new(),
        }
    }

    /// Creates a candidate from explicit sequences and unassigned stops.
    pub fn from_sequences(sequences: Vec<Vec<usize>>, unassigned: Vec<usize>) -> Self {
        Self {
            sequences,
            unassigned,
        }
    }

    /// All bus sequences.
    pub fn sequences(&self) -> &[Vec<usize>] {
        &self.sequences
    }

    /// The sequence of bus `bus`.
    pub fn sequence(&self, bus: usize) -> &[usize] {
        &self.sequences[bus]
    }

    /// Mutable access to the sequences.
    pub fn sequences_mut(&mut self) -> &mut Vec<Vec<usize>> {
        &mut self.sequences
    }

    /// Stops not served by any bus.
    pub fn unassigned(&self) -> &[usize] {
        &self.unassigned
    }

    /// Mutable access to the unassigned list.
    pub fn unassigned_mut(&mut self) -> &mut Vec<usize> {
        &mut self.unassigned
    }

    /// Number of bus sequences.
    pub fn num_buses(&self) -> usize {
        self.sequences.len()
    }

    /// Number of stops served across all buses.
    pub fn num_assigned(&self) -> usize {
        self.sequences.iter().map(Vec::len).sum()
    }

    /// Number of buses with at least one stop.
    pub fn num_used_buses(&self) -> usize {
        self.sequences.iter().filter(|s| !s.is_empty()).count()
    }

    /// Finds `(bus, position)` of a stop, or `None` if unassigned or absent.
    pub fn position_of(&self, stop: usize) -> Option<(usize, usize)> {
        self.sequences.iter().enumerate().find_map(|(b, seq)| {
            seq.iter().position(|&s| s == stop).map(|p| (b, p))
        })
    }

    /// Returns `true` if every stop `0..num_stops` appears exactly once
    /// across the sequences and the unassigned list.
    pub fn is_valid_partition(&self, num_stops: usize) -> bool {
        let mut seen = vec![false; num_stops];
        let all = self
            .sequences
            .iter()
            .flat_map(|s| s.iter())
            .chain(self.unassigned.iter());
        for &stop in all {
            if stop >= num_stops || seen[stop] {
                return false;
            }
            seen[stop] = true;
        }
        seen.into_iter().all(|s| s)
    }
}
