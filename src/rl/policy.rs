//! Linear action-value function and its process-wide store.
//!
//! The value of applying an edit of kind `k` with feature vector `φ` is
//! `Q(k, φ) = w_k · φ`, one weight vector per [`MoveKind`]. Readers take an
//! immutable [`PolicySnapshot`] and keep it for the whole run; writers
//! serialize through the store and publish a new version atomically.

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::FEATURE_DIM;
use super::replay::{Experience, ReplayBuffer};
use crate::error::PolicyError;
use crate::local_search::MoveKind;

/// Initial exploration rate of a fresh policy.
pub const INITIAL_EPSILON: f64 = 1.0;

/// Immutable, versioned policy weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    version: u64,
    weights: Vec<Vec<f64>>,
    epsilon: f64,
    updates: u64,
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicySnapshot {
    /// Zero weights, full exploration.
    pub fn new() -> Self {
        Self {
            version: 0,
            weights: vec![vec![0.0; FEATURE_DIM]; MoveKind::ALL.len()],
            epsilon: INITIAL_EPSILON,
            updates: 0,
        }
    }

    /// Builds a snapshot from explicit weights, one row per move kind.
    pub fn from_weights(weights: Vec<Vec<f64>>, epsilon: f64) -> Result<Self, PolicyError> {
        let snapshot = Self {
            version: 0,
            weights,
            epsilon: epsilon.clamp(0.0, 1.0),
            updates: 0,
        };
        snapshot.check_shape()?;
        Ok(snapshot)
    }

    /// Version number; bumped on every publish.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of gradient steps folded into these weights.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Weights for one move kind.
    pub fn weights(&self, kind: MoveKind) -> &[f64] {
        &self.weights[kind.index()]
    }

    /// Estimated value of an edit.
    pub fn q_value(&self, kind: MoveKind, features: &[f64; FEATURE_DIM]) -> f64 {
        self.weights(kind)
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum()
    }

    /// One clipped gradient step towards `exp.reward`.
    pub(crate) fn sgd_step(&mut self, exp: &Experience, learning_rate: f64, clip: f64) {
        let error = (exp.reward - self.q_value(exp.kind, &exp.features)).clamp(-clip, clip);
        for (w, x) in self.weights[exp.kind.index()].iter_mut().zip(&exp.features) {
            *w += learning_rate * error * x;
        }
        self.updates += 1;
    }

    fn check_shape(&self) -> Result<(), PolicyError> {
        if self.weights.len() != MoveKind::ALL.len() {
            return Err(PolicyError::Shape {
                expected: MoveKind::ALL.len(),
                found: self.weights.len(),
            });
        }
        if let Some(row) = self.weights.iter().find(|r| r.len() != FEATURE_DIM) {
            return Err(PolicyError::Shape {
                expected: FEATURE_DIM,
                found: row.len(),
            });
        }
        Ok(())
    }
}

/// Learning hyper-parameters applied by [`ValueStore::learn`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningRates {
    /// Step size.
    pub learning_rate: f64,
    /// Bound on the absolute TD error.
    pub error_clip: f64,
    /// Minibatch size for replay updates.
    pub batch_size: usize,
    /// Multiplicative epsilon decay per replay update.
    pub epsilon_decay: f64,
    /// Epsilon floor.
    pub epsilon_min: f64,
}

/// Process-wide, versioned holder of the current policy.
///
/// Any number of runs may read concurrently. Updates are serialized and
/// become visible to runs that start afterwards.
///
/// # Examples
///
/// ```
/// use u_busroute::rl::{PolicySnapshot, ValueStore};
///
/// let store = ValueStore::new(PolicySnapshot::new());
/// let before = store.snapshot();
/// let version = store.update(|p| p.clone());
/// assert_eq!(version, before.version() + 1);
/// assert_eq!(before.version(), 0);
/// ```
#[derive(Debug)]
pub struct ValueStore {
    current: RwLock<Arc<PolicySnapshot>>,
    writer: Mutex<ReplayBuffer>,
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::new(PolicySnapshot::new())
    }
}

impl ValueStore {
    /// Creates a store publishing `snapshot`.
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(ReplayBuffer::default()),
        }
    }

    /// Creates a store whose replay buffer keeps `capacity` experiences.
    pub fn with_replay_capacity(snapshot: PolicySnapshot, capacity: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(ReplayBuffer::with_capacity(capacity)),
        }
    }

    /// The shared store used when a controller is not given its own.
    pub fn global() -> &'static ValueStore {
        static GLOBAL: OnceLock<ValueStore> = OnceLock::new();
        GLOBAL.get_or_init(ValueStore::default)
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// Applies `f` to a copy of the current snapshot and publishes the
    /// result as the next version. Returns the new version.
    pub fn update<F>(&self, f: F) -> u64
    where
        F: FnOnce(&PolicySnapshot) -> PolicySnapshot,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.snapshot();
        let mut next = f(&base);
        next.version = base.version + 1;
        self.publish(next)
    }

    /// Publishes `next` only if the current version is still `expected`.
    pub fn compare_and_swap(
        &self,
        expected: u64,
        mut next: PolicySnapshot,
    ) -> Result<u64, PolicyError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let found = self.snapshot().version;
        if found != expected {
            return Err(PolicyError::VersionConflict { expected, found });
        }
        next.check_shape()?;
        next.version = expected + 1;
        Ok(self.publish(next))
    }

    /// Records one experience: a single-sample step, then a replay
    /// minibatch with epsilon decay once enough experience is buffered.
    pub fn learn<R: Rng>(&self, exp: Experience, rates: &LearningRates, rng: &mut R) -> u64 {
        let mut replay = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.snapshot();
        let mut next = PolicySnapshot::clone(&base);
        next.sgd_step(&exp, rates.learning_rate, rates.error_clip);
        replay.push(exp);
        if replay.len() >= rates.batch_size.max(1) {
            for sample in replay.sample(rates.batch_size, rng) {
                next.sgd_step(sample, rates.learning_rate, rates.error_clip);
            }
            next.epsilon = (next.epsilon * rates.epsilon_decay).max(rates.epsilon_min);
        }
        next.version = base.version + 1;
        self.publish(next)
    }

    /// Replaces the published policy with a JSON document.
    pub fn load_json(&self, json: &str) -> Result<u64, PolicyError> {
        let loaded: PolicySnapshot = serde_json::from_str(json)?;
        loaded.check_shape()?;
        let version = self.update(|_| loaded);
        debug!(version, "policy loaded");
        Ok(version)
    }

    /// Serializes the published policy.
    pub fn save_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(&*self.snapshot())?)
    }

    /// Loads the policy from a file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<u64, PolicyError> {
        let json = std::fs::read_to_string(path)?;
        self.load_json(&json)
    }

    /// Writes the published policy to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PolicyError> {
        std::fs::write(path, self.save_json()?)?;
        Ok(())
    }

    fn publish(&self, next: PolicySnapshot) -> u64 {
        let version = next.version;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rates() -> LearningRates {
        LearningRates {
            learning_rate: 0.1,
            error_clip: 1.0,
            batch_size: 4,
            epsilon_decay: 0.5,
            epsilon_min: 0.2,
        }
    }

    fn exp(kind: MoveKind, reward: f64) -> Experience {
        let mut features = [0.0; FEATURE_DIM];
        features[0] = 1.0;
        features[8] = -0.5;
        Experience {
            kind,
            features,
            reward,
        }
    }

    #[test]
    fn test_fresh_policy_is_zero() {
        let p = PolicySnapshot::new();
        let mut f = [0.0; FEATURE_DIM];
        f[0] = 1.0;
        for kind in MoveKind::ALL {
            assert_eq!(p.q_value(kind, &f), 0.0);
        }
        assert_eq!(p.epsilon(), INITIAL_EPSILON);
    }

    #[test]
    fn test_sgd_moves_towards_reward() {
        let mut p = PolicySnapshot::new();
        let e = exp(MoveKind::Swap, 0.5);
        for _ in 0..200 {
            p.sgd_step(&e, 0.1, 1.0);
        }
        assert!((p.q_value(MoveKind::Swap, &e.features) - 0.5).abs() < 1e-3);
        assert_eq!(p.q_value(MoveKind::Relocate, &e.features), 0.0);
        assert_eq!(p.updates(), 200);
    }

    #[test]
    fn test_snapshot_isolated_from_updates() {
        let store = ValueStore::default();
        let held = store.snapshot();
        store.learn(exp(MoveKind::Reverse, 1.0), &rates(), &mut StdRng::seed_from_u64(1));
        assert_eq!(held.version(), 0);
        assert_eq!(held.weights(MoveKind::Reverse)[0], 0.0);
        let fresh = store.snapshot();
        assert_eq!(fresh.version(), 1);
        assert!(fresh.weights(MoveKind::Reverse)[0] > 0.0);
    }

    #[test]
    fn test_replay_decays_epsilon() {
        let store = ValueStore::default();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..3 {
            store.learn(exp(MoveKind::Swap, 0.1), &rates(), &mut rng);
        }
        assert_eq!(store.snapshot().epsilon(), INITIAL_EPSILON);
        store.learn(exp(MoveKind::Swap, 0.1), &rates(), &mut rng);
        assert_eq!(store.snapshot().epsilon(), 0.5);
        for _ in 0..10 {
            store.learn(exp(MoveKind::Swap, 0.1), &rates(), &mut rng);
        }
        assert_eq!(store.snapshot().epsilon(), 0.2);
    }

    #[test]
    fn test_compare_and_swap_conflict() {
        let store = ValueStore::default();
        store.update(|p| p.clone());
        let err = store.compare_and_swap(0, PolicySnapshot::new()).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::VersionConflict {
                expected: 0,
                found: 1
            }
        ));
        assert_eq!(store.compare_and_swap(1, PolicySnapshot::new()).unwrap(), 2);
    }

    #[test]
    fn test_json_round_trip_and_shape_check() {
        let store = ValueStore::default();
        store.learn(exp(MoveKind::Relocate, -0.3), &rates(), &mut StdRng::seed_from_u64(0));
        let json = store.save_json().unwrap();

        let other = ValueStore::default();
        other.load_json(&json).unwrap();
        assert_eq!(
            other.snapshot().weights(MoveKind::Relocate),
            store.snapshot().weights(MoveKind::Relocate)
        );

        let bad = r#"{"version":0,"weights":[[0.0]],"epsilon":0.5,"updates":0}"#;
        assert!(matches!(
            other.load_json(bad),
            Err(PolicyError::Shape { .. })
        ));
        assert!(matches!(other.load_json("nope"), Err(PolicyError::Serde(_))));
    }

    #[test]
    fn test_from_weights_rejects_short_rows() {
        let err = PolicySnapshot::from_weights(vec![vec![0.0; 3]; 3], 0.1).unwrap_err();
        assert!(matches!(err, PolicyError::Shape { expected, found: 3 } if expected == FEATURE_DIM));
    }
}
