//! Bounded experience replay.

use std::collections::VecDeque;

use rand::Rng;

use super::features::FEATURE_DIM;
use crate::local_search::MoveKind;

/// Default number of experiences kept.
pub const DEFAULT_REPLAY_CAPACITY: usize = 2000;

/// One applied edit and the reward it earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    /// Kind of the applied edit.
    pub kind: MoveKind,
    /// Features observed before applying it.
    pub features: [f64; FEATURE_DIM],
    /// Relative fitness improvement.
    pub reward: f64,
}

/// FIFO buffer that drops the oldest experience when full.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    items: VecDeque<Experience>,
    capacity: usize,
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }
}

impl ReplayBuffer {
    /// Creates an empty buffer holding at most `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Appends an experience, evicting the oldest when full.
    pub fn push(&mut self, exp: Experience) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(exp);
    }

    /// Number of buffered experiences.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Up to `amount` distinct experiences drawn uniformly.
    pub fn sample<R: Rng>(&self, amount: usize, rng: &mut R) -> Vec<&Experience> {
        let amount = amount.min(self.items.len());
        rand::seq::index::sample(rng, self.items.len(), amount)
            .into_iter()
            .map(|i| &self.items[i])
            .collect()
    }
}
