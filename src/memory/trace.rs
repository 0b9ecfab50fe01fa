//! Memory change tracking.
//!
//! The tracker watches every successful write to the [`MemoryStore`](super::MemoryStore)
//! and keeps two views of it:
//!
//! - **Last write**: the most recently written address, handed out once and
//!   then cleared. Used after a single step to show what changed.
//! - **Trace**: while enabled, every written address, deduplicated and kept in
//!   ascending order. Used after a whole run to summarise what changed.
//!
//! A write can be excluded from both views by calling
//! [`ChangeTracker::suppress_next_write`] right before it. The engine does this
//! for stack pushes unless stack tracing is on.

use std::collections::BTreeSet;

/// Records which addresses were written.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    /// Address of the last recorded write not yet taken.
    last_write: Option<u32>,
    /// Addresses written while tracing, `None` when tracing is off.
    trace: Option<BTreeSet<u32>>,
    /// Skip the next recorded write.
    suppress_next: bool,
}

impl ChangeTracker {
    /// Create a tracker with tracing disabled and nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a successful write to `address`.
    pub fn record(&mut self, address: u32) {
        if self.suppress_next {
            self.suppress_next = false;
            return;
        }

        self.last_write = Some(address);
        if let Some(trace) = self.trace.as_mut() {
            trace.insert(address);
        }
    }

    /// Exclude the next write from both the last-write slot and the trace.
    pub fn suppress_next_write(&mut self) {
        self.suppress_next = true;
    }

    /// Drop a pending suppression (the write it was meant for did not happen).
    pub fn cancel_suppression(&mut self) {
        self.suppress_next = false;
    }

    /// Whether a write happened since the last call to [`take_last_write`](Self::take_last_write).
    pub fn has_pending_write(&self) -> bool {
        self.last_write.is_some()
    }

    /// Take the last written address, clearing it.
    pub fn take_last_write(&mut self) -> Option<u32> {
        self.last_write.take()
    }

    /// Start collecting written addresses. Already collected ones are kept.
    pub fn enable_trace(&mut self) {
        if self.trace.is_none() {
            log::debug!("Memory trace enabled");
            self.trace = Some(BTreeSet::new());
        }
    }

    /// Stop collecting and discard anything not yet drained.
    pub fn disable_trace(&mut self) {
        if self.trace.take().is_some() {
            log::debug!("Memory trace disabled");
        }
    }

    /// Whether tracing is on.
    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Remove and return every traced address in ascending order.
    ///
    /// Tracing stays enabled.
    pub fn drain_trace(&mut self) -> Vec<u32> {
        match self.trace.as_mut() {
            Some(trace) => std::mem::take(trace).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Number of addresses currently held in the trace.
    pub fn trace_len(&self) -> usize {
        self.trace.as_ref().map_or(0, BTreeSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_consumed_once() {
        let mut tracker = ChangeTracker::new();
        assert!(!tracker.has_pending_write());

        tracker.record(10);
        tracker.record(20);
        assert!(tracker.has_pending_write());
        assert_eq!(tracker.take_last_write(), Some(20));
        assert_eq!(tracker.take_last_write(), None);
    }

    #[test]
    fn test_trace_only_while_enabled() {
        let mut tracker = ChangeTracker::new();
        tracker.record(1);
        assert_eq!(tracker.drain_trace(), Vec::<u32>::new());

        tracker.enable_trace();
        tracker.record(2);
        assert!(tracker.is_tracing());
        assert_eq!(tracker.drain_trace(), vec![2]);
    }

    #[test]
    fn test_trace_sorted_and_deduplicated() {
        let mut tracker = ChangeTracker::new();
        tracker.enable_trace();
        for addr in [30, 10, 20, 10, 30] {
            tracker.record(addr);
        }
        assert_eq!(tracker.trace_len(), 3);
        assert_eq!(tracker.drain_trace(), vec![10, 20, 30]);
        assert_eq!(tracker.trace_len(), 0);
    }

    #[test]
    fn test_suppression_skips_one_write() {
        let mut tracker = ChangeTracker::new();
        tracker.enable_trace();

        tracker.suppress_next_write();
        tracker.record(5);
        assert!(!tracker.has_pending_write());
        assert_eq!(tracker.trace_len(), 0);

        tracker.record(6);
        assert_eq!(tracker.take_last_write(), Some(6));
        assert_eq!(tracker.drain_trace(), vec![6]);
    }

    #[test]
    fn test_disable_discards_trace() {
        let mut tracker = ChangeTracker::new();
        tracker.enable_trace();
        tracker.record(1);
        tracker.disable_trace();
        assert!(!tracker.is_tracing());

        tracker.enable_trace();
        assert_eq!(tracker.drain_trace(), Vec::<u32>::new());
    }
}
