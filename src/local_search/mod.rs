//! Local edit operators shared by the search phases.
//!
//! - [`Move`] / [`MoveKind`]: relocate, swap and reverse edits
//! - [`best_insertion`] / [`insert_all`]: cheapest-insertion repair

mod insertion;
mod moves;

pub use insertion::{
    best_insertion, insert_all, insertion_cost, removal_cost, route_load, Insertion,
};
pub use moves::{random_any_move, random_move, Move, MoveKind};
