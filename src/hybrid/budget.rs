//! Cancellation token and wall-clock budget shared by every phase.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::PartialReason;

/// Cooperative cancellation flag, cheap to clone across threads.
///
/// # Examples
///
/// ```
/// use u_busroute::hybrid::CancelToken;
///
/// let token = CancelToken::new();
/// let other = token.clone();
/// other.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Deadline plus cancellation, checked at generation and step boundaries.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Budget {
    /// A budget that never runs out and cannot be cancelled externally.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A budget expiring `limit` from now.
    pub fn with_time_limit(limit: Duration, cancel: CancelToken) -> Self {
        Self {
            deadline: Instant::now().checked_add(limit),
            cancel,
        }
    }

    /// The cancellation token.
    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Time left before the deadline, if there is one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Why work must stop now, or `None` to continue.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn stop_reason(&self) -> Option<PartialReason> {
        if self.cancel.is_cancelled() {
            return Some(PartialReason::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(PartialReason::BudgetExhausted),
            _ => None,
        }
    }

    /// Whether work must stop now.
    pub fn is_exhausted(&self) -> bool {
        self.stop_reason().is_some()
    }
}
