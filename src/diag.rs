//! Saturation and failure counters.
//!
//! Queue overflow and load failure are best-effort drops by design; they
//! must not throw, block, or halt a thread, but they should be visible.
//! Counters are atomics so the real-time thread can bump them without
//! logging or locking.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Diagnostics {
    requests_dropped: AtomicU64,
    results_dropped: AtomicU64,
    retirements_dropped: AtomicU64,
    load_failures: AtomicU64,
}

impl Diagnostics {
    pub(crate) fn count_request_dropped(&self) {
        self.requests_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_result_dropped(&self) {
        self.results_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_retirement_dropped(&self) {
        self.retirements_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            requests_dropped: self.requests_dropped.load(Ordering::Relaxed),
            results_dropped: self.results_dropped.load(Ordering::Relaxed),
            retirements_dropped: self.retirements_dropped.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters, readable from any thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    /// Load requests rejected because the request queue was full.
    pub requests_dropped: u64,
    /// Finished sources dropped because the result queue was full.
    pub results_dropped: u64,
    /// Retirements dropped because a pool hand-off queue was full.
    pub retirements_dropped: u64,
    /// Sources that failed to open or decode.
    pub load_failures: u64,
}
