//! In-process request statistics.
//!
//! Process-wide, lost on restart. The error counter is atomic and the
//! action list is mutex-guarded so concurrent request flows can record
//! without a wider locking discipline.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// One handled request, in arrival order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionRecord {
    pub action: String,
    pub ok: bool,
    /// Unix timestamp (seconds).
    pub at: u64,
}

/// Counters shared across all request-handling flows.
#[derive(Debug, Default)]
pub struct ServiceStats {
    error_count: AtomicU64,
    actions: Mutex<Vec<ActionRecord>>,
}

/// Point-in-time copy of the stats, serializable for the API.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub error_count: u64,
    pub actions: Vec<ActionRecord>,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, action: &str) {
        self.push(action, true);
    }

    pub fn record_failure(&self, action: &str) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        self.push(action, false);
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let actions = match self.actions.lock() {
            Ok(actions) => actions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        StatsSnapshot {
            error_count: self.error_count(),
            actions,
        }
    }

    fn push(&self, action: &str, ok: bool) {
        let record = ActionRecord {
            action: action.to_string(),
            ok,
            at: epoch_secs(),
        };
        match self.actions.lock() {
            Ok(mut actions) => actions.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
