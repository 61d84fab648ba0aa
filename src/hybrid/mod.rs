//! Run orchestration.
//!
//! [`HybridController`] validates a request, builds the seed, runs the
//! genetic search and/or the learned refiner under one time budget, and
//! finalizes routes, warnings and the optional explanation.
//!
//! A run moves through [`Phase::Init`] → [`Phase::Seed`] →
//! [`Phase::GaSearch`] → [`Phase::RlRefine`] → [`Phase::Finalize`]; the
//! algorithm mode decides which of the two search phases run.

mod budget;
mod config;
mod controller;
mod finalize;

pub use budget::{Budget, CancelToken};
pub use config::SolverConfig;
pub use controller::{HybridController, OptimizationOutcome, RunHandle};

pub use crate::api::AlgorithmMode;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    /// Configuration and RNG set-up.
    Init,
    /// Validation, model building and the greedy seed.
    Seed,
    /// Genetic search.
    GaSearch,
    /// Learned refinement.
    RlRefine,
    /// Route materialization and reporting.
    Finalize,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Phase::Init,
            1 => Phase::Seed,
            2 => Phase::GaSearch,
            3 => Phase::RlRefine,
            _ => Phase::Finalize,
        }
    }
}

/// Shared, observable current phase.
#[derive(Debug, Clone, Default)]
pub(crate) struct PhaseCell(Arc<AtomicU8>);

impl PhaseCell {
    pub(crate) fn set(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Release);
    }

    pub(crate) fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }
}
