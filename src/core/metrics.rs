//! Logger metrics for observability
//!
//! Counts what the dispatcher did with the records that passed admission:
//! how many were dispatched to the slots or rejected by the filter gates, and
//! how many slot writes succeeded or failed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Dispatch counters of one root logger
///
/// # Example
///
/// ```
/// use rust_slot_logger::core::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_dispatched();
/// metrics.record_write();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.writes(), 2);
/// assert_eq!(metrics.write_failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that passed both filter gates
    dispatched: AtomicU64,

    /// Records rejected by the handle or global filter
    filtered: AtomicU64,

    /// Slot writes attempted, failed ones included
    writes: AtomicU64,

    /// Slot writes whose writer returned an error
    write_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write(&self) -> u64 {
        self.writes.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a failed write. Failed writes count towards `writes` too.
    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed writes as a percentage of all writes (0.0 - 100.0).
    ///
    /// Returns 0.0 if nothing has been written.
    pub fn write_failure_rate(&self) -> f64 {
        let writes = self.writes() as f64;
        if writes == 0.0 {
            0.0
        } else {
            (self.write_failures() as f64 / writes) * 100.0
        }
    }

    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            dispatched: AtomicU64::new(self.dispatched()),
            filtered: AtomicU64::new(self.filtered()),
            writes: AtomicU64::new(self.writes()),
            write_failures: AtomicU64::new(self.write_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counters() {
        let metrics = LoggerMetrics::new();
        metrics.record_dispatched();
        metrics.record_filtered();
        metrics.record_filtered();
        assert_eq!(metrics.dispatched(), 1);
        assert_eq!(metrics.filtered(), 2);
        assert_eq!(metrics.write_failure_rate(), 0.0);
    }

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_write();
        let snapshot = metrics.clone();
        metrics.reset();
        assert_eq!(snapshot.writes(), 1);
        assert_eq!(metrics.writes(), 0);
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = Arc::new(LoggerMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        m.record_write();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.writes(), 4000);
    }
}
