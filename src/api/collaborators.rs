//! Traits for the systems the engine talks to but does not own.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::rl::Context;

use super::RunRecord;

/// Source of predicted rider counts per stop.
pub trait DemandForecast: Send + Sync {
    /// Predicted riders at `stop_id` under `context`, or `None` if the
    /// model has no prediction for it.
    fn predict(&self, stop_id: u64, context: &Context) -> Option<u32>;
}

/// Fixed predictions keyed by stop id.
impl DemandForecast for HashMap<u64, u32> {
    fn predict(&self, stop_id: u64, _context: &Context) -> Option<u32> {
        self.get(&stop_id).copied()
    }
}

/// Receiver of exactly one [`RunRecord`] per completed run.
///
/// Storage is the sink's concern; the engine only hands the record over.
pub trait RunSink: Send + Sync {
    /// Accepts the record of a finished run.
    fn record(&self, record: RunRecord);
}

/// Sink that keeps records in memory.
///
/// # Examples
///
/// ```
/// use u_busroute::api::MemorySink;
///
/// let sink = MemorySink::default();
/// assert!(sink.records().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<RunRecord>>,
}

impl MemorySink {
    /// Snapshot of the records received so far.
    pub fn records(&self) -> Vec<RunRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl RunSink for MemorySink {
    fn record(&self, record: RunRecord) {
        let mut guard = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push(record);
    }
}
