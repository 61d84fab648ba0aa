//! # u-busroute
//!
//! School bus route optimization: assigns a fleet of buses to pickup stops
//! under capacity, route-length and time-window constraints, searches for
//! near-optimal routes with a genetic algorithm refined by a learned
//! local-edit policy, and explains the final score.
//!
//! ## Modules
//!
//! - [`models`] — Domain types (Stop, Bus, ConstraintSet, Candidate, Route)
//! - [`distance`] — Haversine geometry and travel-cost matrices
//! - [`builder`] — Request validation, problem model, greedy seed
//! - [`evaluation`] — Route metrics and the multi-objective fitness function
//! - [`local_search`] — Bounded local edits and insertion costs
//! - [`ga`] — Genetic optimizer over bus-partitioned chromosomes
//! - [`rl`] — Reinforcement-learning refiner and versioned value store
//! - [`hybrid`] — Orchestration, time budget, cancellation
//! - [`explain`] — Decomposition and perturbation explanations
//! - [`api`] — Request/response contract and external collaborators
//!
//! ## Example
//!
//! ```
//! use u_busroute::api::{BusInput, OptimizationRequest, StopInput};
//! use u_busroute::hybrid::{AlgorithmMode, HybridController, SolverConfig};
//!
//! let request = OptimizationRequest::new(
//!     AlgorithmMode::Genetic,
//!     vec![
//!         StopInput::new(1, 12.970, 77.590, 5),
//!         StopInput::new(2, 12.975, 77.600, 8),
//!         StopInput::new(3, 12.980, 77.610, 6),
//!     ],
//!     vec![BusInput::new(1, 50)],
//! )
//! .with_seed(7);
//!
//! let controller = HybridController::new(SolverConfig::fast()).unwrap();
//! let outcome = controller.optimize(&request).unwrap();
//! assert!(!outcome.response.partial);
//! assert_eq!(outcome.response.metrics.stop_count, 3);
//! ```

pub mod api;
pub mod builder;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod explain;
pub mod ga;
pub mod hybrid;
pub mod local_search;
pub mod models;
pub mod rl;

pub use error::{ConfigError, PartialReason, PolicyError, ValidationError, Warning};
