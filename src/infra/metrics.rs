//! Lock-free metrics collection and periodic reporting
//!
//! Counter updates are plain atomic increments. `report()` swaps the
//! since-report counters to zero, so each summary covers one interval.
//!
//! NOTE: All atomics use Relaxed ordering; these are statistics only and
//! must not drive navigation or planning decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Tick processing latency bucket boundaries (microseconds)
/// Buckets: ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, >1280
const BUCKET_BOUNDS: [u64; 8] = [10, 20, 40, 80, 160, 320, 640, 1280];
const NUM_BUCKETS: usize = 9;

/// Upper bounds used when reading percentiles (last bucket uses 2x the previous bound)
const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] = [10, 20, 40, 80, 160, 320, 640, 1280, 2560];

#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;
    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Ticks turned into snapshots (monotonic)
    ticks_accepted: AtomicU64,
    /// Ticks discarded by validation (monotonic)
    ticks_rejected: AtomicU64,
    /// Ticks seen since last report
    ticks_since_report: AtomicU64,
    /// Snapshot build latency (reset on report)
    tick_latency_sum_us: AtomicU64,
    tick_latency_max_us: AtomicU64,
    tick_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Progress ticks applied / ignored (monotonic)
    progress_applied: AtomicU64,
    progress_ignored: AtomicU64,
    /// Build outcomes (monotonic)
    builds_succeeded: AtomicU64,
    builds_failed: AtomicU64,
    /// Commands rejected by the planning state machine (monotonic)
    commands_rejected: AtomicU64,
    /// Restores that fell back to Idle (monotonic)
    restore_resets: AtomicU64,
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks_accepted: AtomicU64::new(0),
            ticks_rejected: AtomicU64::new(0),
            ticks_since_report: AtomicU64::new(0),
            tick_latency_sum_us: AtomicU64::new(0),
            tick_latency_max_us: AtomicU64::new(0),
            tick_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            progress_applied: AtomicU64::new(0),
            progress_ignored: AtomicU64::new(0),
            builds_succeeded: AtomicU64::new(0),
            builds_failed: AtomicU64::new(0),
            commands_rejected: AtomicU64::new(0),
            restore_resets: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a processed tick and how long building its snapshot took
    #[inline]
    pub fn record_tick(&self, accepted: bool, latency_us: u64) {
        if accepted {
            self.ticks_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.ticks_rejected.fetch_add(1, Ordering::Relaxed);
        }
        self.ticks_since_report.fetch_add(1, Ordering::Relaxed);
        self.tick_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.tick_latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.tick_latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_progress(&self, applied: bool) {
        if applied {
            self.progress_applied.fetch_add(1, Ordering::Relaxed);
        } else {
            self.progress_ignored.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_build_result(&self, succeeded: bool) {
        if succeeded {
            self.builds_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.builds_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_command_rejected(&self) {
        self.commands_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_restore_reset(&self) {
        self.restore_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ticks_accepted(&self) -> u64 {
        self.ticks_accepted.load(Ordering::Relaxed)
    }

    pub fn ticks_rejected(&self) -> u64 {
        self.ticks_rejected.load(Ordering::Relaxed)
    }

    pub fn progress_ignored(&self) -> u64 {
        self.progress_ignored.load(Ordering::Relaxed)
    }

    pub fn commands_rejected(&self) -> u64 {
        self.commands_rejected.load(Ordering::Relaxed)
    }

    pub fn restore_resets(&self) -> u64 {
        self.restore_resets.load(Ordering::Relaxed)
    }

    /// Generate a summary and reset the per-interval counters
    pub fn report(&self) -> MetricsSummary {
        let ticks_count = self.ticks_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.tick_latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.tick_latency_max_us.swap(0, Ordering::Relaxed);
        let buckets = swap_buckets(&self.tick_latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let ticks_per_sec = if elapsed.as_secs_f64() > 0.0 {
            ticks_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        MetricsSummary {
            ticks_accepted: self.ticks_accepted.load(Ordering::Relaxed),
            ticks_rejected: self.ticks_rejected.load(Ordering::Relaxed),
            ticks_per_sec,
            avg_tick_latency_us: if ticks_count > 0 { latency_sum / ticks_count } else { 0 },
            max_tick_latency_us: max_latency,
            tick_p99_us: percentile_from_buckets(&buckets, 0.99),
            progress_applied: self.progress_applied.load(Ordering::Relaxed),
            progress_ignored: self.progress_ignored.load(Ordering::Relaxed),
            builds_succeeded: self.builds_succeeded.load(Ordering::Relaxed),
            builds_failed: self.builds_failed.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            restore_resets: self.restore_resets.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// One reporting interval
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub ticks_accepted: u64,
    pub ticks_rejected: u64,
    pub ticks_per_sec: f64,
    pub avg_tick_latency_us: u64,
    pub max_tick_latency_us: u64,
    pub tick_p99_us: u64,
    pub progress_applied: u64,
    pub progress_ignored: u64,
    pub builds_succeeded: u64,
    pub builds_failed: u64,
    pub commands_rejected: u64,
    pub restore_resets: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            ticks_accepted = %self.ticks_accepted,
            ticks_rejected = %self.ticks_rejected,
            ticks_per_sec = format!("{:.1}", self.ticks_per_sec),
            avg_tick_latency_us = %self.avg_tick_latency_us,
            max_tick_latency_us = %self.max_tick_latency_us,
            tick_p99_us = %self.tick_p99_us,
            progress_applied = %self.progress_applied,
            progress_ignored = %self.progress_ignored,
            builds_succeeded = %self.builds_succeeded,
            builds_failed = %self.builds_failed,
            commands_rejected = %self.commands_rejected,
            restore_resets = %self.restore_resets,
            "metrics"
        );
    }
}
