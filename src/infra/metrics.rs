//! Lock-free metrics collection and periodic reporting
//!
//! Counters are bumped from the controller loop and the outbound senders;
//! the reporter task swaps the interval counters and logs a summary.
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

pub struct Metrics {
    /// Events consumed by the controller (since last report)
    events_processed: AtomicU64,
    /// Events with no handler in the current state (since last report)
    unrecognized_events: AtomicU64,
    /// Handler validation failures (since last report)
    validation_failures: AtomicU64,
    /// Error recovery sessions that ended (total)
    recoveries_total: AtomicU64,
    /// Outbound display/audio/notification messages dropped on a full channel (total)
    outbound_dropped: AtomicU64,
    /// Controller loop restarts (total)
    restarts_total: AtomicU64,
    /// Events processed (total, never reset)
    events_total: AtomicU64,
    last_report: parking_lot::Mutex<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_processed: AtomicU64::new(0),
            unrecognized_events: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            recoveries_total: AtomicU64::new(0),
            outbound_dropped: AtomicU64::new(0),
            restarts_total: AtomicU64::new(0),
            events_total: AtomicU64::new(0),
            last_report: parking_lot::Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_event_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        self.events_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unrecognized_event(&self) {
        self.unrecognized_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_recovery(&self) {
        self.recoveries_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_outbound_dropped(&self) {
        self.outbound_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_restart(&self) {
        self.restarts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_total(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    pub fn recoveries_total(&self) -> u64 {
        self.recoveries_total.load(Ordering::Relaxed)
    }

    pub fn outbound_dropped(&self) -> u64 {
        self.outbound_dropped.load(Ordering::Relaxed)
    }

    /// Swap interval counters and produce a summary
    pub fn report(&self) -> MetricsSummary {
        let elapsed_secs = {
            let mut last = self.last_report.lock();
            let elapsed = last.elapsed().as_secs_f64();
            *last = Instant::now();
            elapsed
        };

        let events = self.events_processed.swap(0, Ordering::Relaxed);
        MetricsSummary {
            events,
            events_per_min: if elapsed_secs > 0.0 { events as f64 * 60.0 / elapsed_secs } else { 0.0 },
            unrecognized_events: self.unrecognized_events.swap(0, Ordering::Relaxed),
            validation_failures: self.validation_failures.swap(0, Ordering::Relaxed),
            events_total: self.events_total(),
            recoveries_total: self.recoveries_total(),
            outbound_dropped: self.outbound_dropped(),
            restarts_total: self.restarts_total.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub events: u64,
    pub events_per_min: f64,
    pub unrecognized_events: u64,
    pub validation_failures: u64,
    pub events_total: u64,
    pub recoveries_total: u64,
    pub outbound_dropped: u64,
    pub restarts_total: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            events = %self.events,
            events_per_min = %format!("{:.1}", self.events_per_min),
            unrecognized = %self.unrecognized_events,
            validation_failures = %self.validation_failures,
            events_total = %self.events_total,
            recoveries_total = %self.recoveries_total,
            outbound_dropped = %self.outbound_dropped,
            restarts_total = %self.restarts_total,
            "metrics"
        );
    }
}
