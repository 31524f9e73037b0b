//! Event tracing for post-mortem debugging.
//!
//! Keeps a ring buffer of recent events and state transitions. When the
//! event loop dies the buffer is dumped to the log so the lead-up to the
//! failure is visible.

use std::collections::VecDeque;
use std::time::Instant;

use crate::state::StateTransition;

/// Default number of events to keep in the trace buffer
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// One entry in the trace buffer
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub kind: String,
    pub details: String,
}

/// Event tracer with ring buffer storage
pub struct EventTracer {
    entries: VecDeque<TraceEntry>,
    max_entries: usize,
    sequence: u64,
    start_time: Instant,
}

impl EventTracer {
    /// Create a new event tracer with specified capacity
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            sequence: 0,
            start_time: Instant::now(),
        }
    }

    fn timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Trace a described X11 event
    pub fn trace_event(&mut self, description: String) {
        self.add_entry("event".to_string(), description);
    }

    /// Trace a state transition
    pub fn trace_transition(&mut self, transition: &StateTransition) {
        let details = serde_json::to_string(transition).unwrap_or_else(|_| "unknown".to_string());
        self.add_entry("transition".to_string(), details);
    }

    fn add_entry(&mut self, kind: String, details: String) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }

        self.sequence += 1;
        self.entries.push_back(TraceEntry {
            sequence: self.sequence,
            timestamp_ms: self.timestamp(),
            kind,
            details,
        });
    }

    /// Get the last N entries
    pub fn get_last(&self, n: usize) -> Vec<TraceEntry> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(start).cloned().collect()
    }

    /// Write the last `n` entries to the log at error level
    pub fn dump(&self, n: usize) {
        let entries = self.get_last(n);
        if entries.is_empty() {
            return;
        }
        log::error!("Last {} of {} traced entries:", entries.len(), self.len());
        for entry in entries {
            log::error!(
                "  #{} +{}ms {}: {}",
                entry.sequence,
                entry.timestamp_ms,
                entry.kind,
                entry.details
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
