//! Bounded local edits on a candidate.
//!
//! # Moves
//!
//! - **Relocate**: move one stop to a position on another bus.
//! - **Swap**: exchange two stops, on the same bus or on different buses.
//! - **Reverse**: reverse a contiguous sub-sequence of one bus (2-opt).
//!
//! The same three edits are the GA mutation operators, the RL action space,
//! and the perturbations of the explainer. Moves never touch the unassigned
//! list, so applying one preserves the partition.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::Candidate;

/// The kind of a local edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Move one stop to another bus.
    Relocate,
    /// Exchange two stops.
    Swap,
    /// Reverse a sub-sequence.
    Reverse,
}

impl MoveKind {
    /// All kinds, in index order.
    pub const ALL: [MoveKind; 3] = [MoveKind::Relocate, MoveKind::Swap, MoveKind::Reverse];

    /// Dense index in `0..3`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            MoveKind::Relocate => "relocate",
            MoveKind::Swap => "swap",
            MoveKind::Reverse => "reverse",
        }
    }
}

/// A concrete local edit.
///
/// Positions refer to the candidate the move was generated for.
///
/// # Examples
///
/// ```
/// use u_busroute::local_search::Move;
/// use u_busroute::models::Candidate;
///
/// let c = Candidate::from_sequences(vec![vec![0, 1, 2], vec![3]], vec![]);
/// let mv = Move::Reverse { bus: 0, start: 0, end: 2 };
/// let next = mv.apply(&c).unwrap();
/// assert_eq!(next.sequence(0), &[2, 1, 0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    /// Remove the stop at `from_pos` of `from_bus`, insert it at `to_pos`
    /// of `to_bus`.
    Relocate {
        /// Source bus.
        from_bus: usize,
        /// Position in the source bus.
        from_pos: usize,
        /// Target bus (different from the source).
        to_bus: usize,
        /// Insertion position in the target bus, `0..=len`.
        to_pos: usize,
    },
    /// Exchange two stops.
    Swap {
        /// First bus.
        bus_a: usize,
        /// Position in the first bus.
        pos_a: usize,
        /// Second bus.
        bus_b: usize,
        /// Position in the second bus.
        pos_b: usize,
    },
    /// Reverse `start..=end` of one bus.
    Reverse {
        /// Bus whose sequence is reversed.
        bus: usize,
        /// First reversed position.
        start: usize,
        /// Last reversed position, greater than `start`.
        end: usize,
    },
}

impl Move {
    /// Kind of this move.
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::Relocate { .. } => MoveKind::Relocate,
            Move::Swap { .. } => MoveKind::Swap,
            Move::Reverse { .. } => MoveKind::Reverse,
        }
    }

    /// The buses this move changes; both entries equal for single-bus moves.
    pub fn buses(&self) -> (usize, usize) {
        match *self {
            Move::Relocate {
                from_bus, to_bus, ..
            } => (from_bus, to_bus),
            Move::Swap { bus_a, bus_b, .. } => (bus_a, bus_b),
            Move::Reverse { bus, .. } => (bus, bus),
        }
    }

    /// Returns `true` if the move can be applied to `candidate` and changes it.
    pub fn is_valid(&self, candidate: &Candidate) -> bool {
        let seqs = candidate.sequences();
        let len = |b: usize| seqs.get(b).map(Vec::len);
        match *self {
            Move::Relocate {
                from_bus,
                from_pos,
                to_bus,
                to_pos,
            } => {
                from_bus != to_bus
                    && len(from_bus).is_some_and(|l| from_pos < l)
                    && len(to_bus).is_some_and(|l| to_pos <= l)
            }
            Move::Swap {
                bus_a,
                pos_a,
                bus_b,
                pos_b,
            } => {
                (bus_a, pos_a) != (bus_b, pos_b)
                    && len(bus_a).is_some_and(|l| pos_a < l)
                    && len(bus_b).is_some_and(|l| pos_b < l)
            }
            Move::Reverse { bus, start, end } => {
                start < end && len(bus).is_some_and(|l| end < l)
            }
        }
    }

    /// Applies the move to a copy of `candidate`.
    ///
    /// Returns `None` if the move is not valid for `candidate`.
    pub fn apply(&self, candidate: &Candidate) -> Option<Candidate> {
        if !self.is_valid(candidate) {
            return None;
        }
        let mut next = candidate.clone();
        let seqs = next.sequences_mut();
        match *self {
            Move::Relocate {
                from_bus,
                from_pos,
                to_bus,
                to_pos,
            } => {
                let stop = seqs[from_bus].remove(from_pos);
                seqs[to_bus].insert(to_pos, stop);
            }
            Move::Swap {
                bus_a,
                pos_a,
                bus_b,
                pos_b,
            } => {
                let a = seqs[bus_a][pos_a];
                seqs[bus_a][pos_a] = seqs[bus_b][pos_b];
                seqs[bus_b][pos_b] = a;
            }
            Move::Reverse { bus, start, end } => {
                seqs[bus][start..=end].reverse();
            }
        }
        Some(next)
    }
}

/// Draws a random valid move of the given kind, or `None` if the candidate
/// admits none.
pub fn random_move<R: Rng>(candidate: &Candidate, kind: MoveKind, rng: &mut R) -> Option<Move> {
    let seqs = candidate.sequences();
    match kind {
        MoveKind::Relocate => {
            if seqs.len() < 2 {
                return None;
            }
            let sources: Vec<usize> = (0..seqs.len()).filter(|&b| !seqs[b].is_empty()).collect();
            if sources.is_empty() {
                return None;
            }
            let from_bus = sources[rng.random_range(0..sources.len())];
            let from_pos = rng.random_range(0..seqs[from_bus].len());
            // Uniform over the other buses.
            let mut to_bus = rng.random_range(0..seqs.len() - 1);
            if to_bus >= from_bus {
                to_bus += 1;
            }
            let to_pos = rng.random_range(0..=seqs[to_bus].len());
            Some(Move::Relocate {
                from_bus,
                from_pos,
                to_bus,
                to_pos,
            })
        }
        MoveKind::Swap => {
            let total = candidate.num_assigned();
            if total < 2 {
                return None;
            }
            let a = rng.random_range(0..total);
            let mut b = rng.random_range(0..total - 1);
            if b >= a {
                b += 1;
            }
            let (bus_a, pos_a) = locate(seqs, a);
            let (bus_b, pos_b) = locate(seqs, b);
            Some(Move::Swap {
                bus_a,
                pos_a,
                bus_b,
                pos_b,
            })
        }
        MoveKind::Reverse => {
            let eligible: Vec<usize> = (0..seqs.len()).filter(|&b| seqs[b].len() >= 2).collect();
            if eligible.is_empty() {
                return None;
            }
            let bus = eligible[rng.random_range(0..eligible.len())];
            let len = seqs[bus].len();
            let start = rng.random_range(0..len - 1);
            let end = rng.random_range(start + 1..len);
            Some(Move::Reverse { bus, start, end })
        }
    }
}

/// Draws a random valid move of a uniformly chosen kind, falling back to
/// the other kinds when the chosen one has no valid move.
pub fn random_any_move<R: Rng>(candidate: &Candidate, rng: &mut R) -> Option<Move> {
    let first = rng.random_range(0..MoveKind::ALL.len());
    (0..MoveKind::ALL.len())
        .map(|k| MoveKind::ALL[(first + k) % MoveKind::ALL.len()])
        .find_map(|kind| random_move(candidate, kind, rng))
}

/// Maps a flat index over all assigned stops to `(bus, position)`.
fn locate(seqs: &[Vec<usize>], mut flat: usize) -> (usize, usize) {
    for (b, seq) in seqs.iter().enumerate() {
        if flat < seq.len() {
            return (b, flat);
        }
        flat -= seq.len();
    }
    // Callers pass flat < num_assigned.
    (seqs.len().saturating_sub(1), 0)
}
