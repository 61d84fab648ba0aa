//! Immutable record of one run, handed to a [`RunSink`](super::RunSink).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::hybrid::Phase;

use super::{OptimizationRequest, OptimizationResponse};

/// Wall-clock time spent in one phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    /// Phase.
    pub phase: Phase,
    /// Milliseconds spent.
    pub elapsed_ms: f64,
}

impl PhaseTiming {
    /// Creates a timing entry.
    pub fn new(phase: Phase, elapsed: Duration) -> Self {
        Self {
            phase,
            elapsed_ms: elapsed.as_secs_f64() * 1e3,
        }
    }
}

/// Everything known about one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Request as received.
    pub request: OptimizationRequest,
    /// Response as returned.
    pub response: OptimizationResponse,
    /// Seed used for every stochastic step.
    pub seed: u64,
    /// Per-phase wall-clock time.
    pub timings: Vec<PhaseTiming>,
    /// Total wall-clock time in milliseconds.
    pub elapsed_ms: f64,
    /// Completion time, milliseconds since the Unix epoch.
    pub recorded_at_ms: u64,
}

impl RunRecord {
    /// Creates a record stamped with the current time.
    pub fn new(
        request: OptimizationRequest,
        response: OptimizationResponse,
        seed: u64,
        timings: Vec<PhaseTiming>,
    ) -> Self {
        let elapsed_ms = timings.iter().map(|t| t.elapsed_ms).sum();
        let recorded_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            request,
            response,
            seed,
            timings,
            elapsed_ms,
            recorded_at_ms,
        }
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
