//! Distance and travel time matrices.
//!
//! Provides haversine geometry, a dense distance matrix, and the travel
//! matrix (km and minutes) the problem model is built on.

mod geo;
mod matrix;
mod travel;

pub use geo::{centroid, haversine_km, EARTH_RADIUS_KM};
pub use matrix::DistanceMatrix;
pub use travel::TravelMatrix;
