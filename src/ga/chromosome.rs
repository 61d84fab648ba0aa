//! Scored candidate used as a GA individual.

use u_metaheur::ga::{Fitness, Individual};

use crate::evaluation::Score;
use crate::models::Candidate;

/// A candidate together with its fitness score.
///
/// Operators never edit a candidate in place: they build a new one, which
/// starts at the worst possible score until the runner scores it.
///
/// # Examples
///
/// ```
/// use u_busroute::evaluation::Score;
/// use u_busroute::ga::Chromosome;
/// use u_busroute::models::Candidate;
///
/// let score = Score { total: 12.0, distance_km: 3.0, stop_variance: 0.0 };
/// let c = Chromosome::new(Candidate::from_sequences(vec![vec![0, 1]], vec![]), score);
/// assert_eq!(c.score().total, 12.0);
/// assert_eq!(c.candidate().num_assigned(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    candidate: Candidate,
    score: Score,
}

impl Chromosome {
    /// Wraps a scored candidate.
    pub fn new(candidate: Candidate, score: Score) -> Self {
        Self { candidate, score }
    }

    /// Wraps a candidate that has not been scored yet.
    pub fn unscored(candidate: Candidate) -> Self {
        Self::new(candidate, Score::worst())
    }

    /// The candidate.
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Its score.
    pub fn score(&self) -> Score {
        self.score
    }

    /// Unwraps the candidate.
    pub fn into_candidate(self) -> Candidate {
        self.candidate
    }
}

impl Fitness for Score {
    fn worst() -> Self {
        Score {
            total: f64::INFINITY,
            distance_km: f64::INFINITY,
            stop_variance: f64::INFINITY,
        }
    }

    fn to_f64(self) -> f64 {
        self.total
    }
}

impl Individual for Chromosome {
    type Fitness = Score;

    fn fitness(&self) -> Score {
        self.score
    }

    fn set_fitness(&mut self, f: Score) {
        self.score = f;
    }
}
