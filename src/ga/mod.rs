//! Genetic optimizer over bus-structured candidates.
//!
//! # Components
//!
//! - [`Chromosome`]: a scored candidate
//! - [`GaSettings`]: population, operator rates and termination settings
//! - [`splice_crossover`], [`mutate`]: variation operators
//! - [`BusGaProblem`]: the [`u_metaheur::ga::GaProblem`] driving the
//!   `u-metaheur` runner
//! - [`evolve`]: a budgeted run, reported as a [`GaState`]
//!
//! # Reference
//!
//! Prins, C. (2004). "A simple and effective evolutionary algorithm for the
//! vehicle routing problem", *Computers & Operations Research* 31(12), 1985-2002.

mod chromosome;
mod config;
mod operators;
mod problem;
mod runner;

pub use chromosome::Chromosome;
pub use config::GaSettings;
pub use operators::{mutate, perturb, random_insertion_build, splice_crossover};
pub use problem::BusGaProblem;
pub use runner::{evolve, Evolution, GaState, Termination};
