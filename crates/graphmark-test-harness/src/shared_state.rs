//! Call log that outlives the runner it was handed to
//!
//! The harness takes ownership of every backend, so tests keep a clone of
//! the log and inspect it after the run.

use graphmark::QueryParams;
use std::sync::{Arc, Mutex};

/// One call made on a runner
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Execute { query: String, params: QueryParams },
    Clear,
    Disconnect,
    Version,
}

/// Shared, append-only record of runner calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Executions whose query text contains `fragment`
    pub fn executions(&self, fragment: &str) -> Vec<QueryParams> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Execute { query, params } if query.contains(fragment) => {
                    Some(params.clone())
                }
                _ => None,
            })
            .collect()
    }
}
