//! Learned refinement.
//!
//! A linear action-value policy ranks sampled local edits; the
//! [`Refiner`] applies the chosen ones under a non-regression guarantee.
//! Policies live in a versioned [`ValueStore`] that runs read as
//! immutable snapshots.

mod features;
mod policy;
mod refiner;
mod replay;

pub use features::{features, sequence_km, Context, Weather, FEATURE_DIM};
pub use policy::{LearningRates, PolicySnapshot, ValueStore, INITIAL_EPSILON};
pub use refiner::{LearningMode, RefineResult, Refiner, RefinerConfig};
pub use replay::{Experience, ReplayBuffer, DEFAULT_REPLAY_CAPACITY};
