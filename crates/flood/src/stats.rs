//! Shared run statistics and the final summary.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Statistics shared across all submission tasks.
///
/// Counters are atomic; the latency histogram sits behind a short
/// critical section and is only touched on successful completion.
pub struct RunStats {
    /// Number of submissions admitted.
    pub attempted: AtomicU64,
    /// Number of submissions that reached inclusion.
    pub succeeded: AtomicU64,
    /// Number of submissions with any other terminal outcome.
    pub failed: AtomicU64,
    /// Submit-to-inclusion latency in microseconds.
    latency: Mutex<Histogram<u64>>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            latency: Mutex::new(
                Histogram::new(3).expect("histogram creation should succeed"),
            ),
        }
    }
}

impl RunStats {
    /// Record one admission.
    pub fn record_attempt(&self) {
        self.attempted.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a successful inclusion and its latency.
    pub fn record_success(&self, latency: Duration) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        let _ = self.latency.lock().record(latency.as_micros() as u64);
    }

    /// Record a failed outcome.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Admitted tasks that have not yet reached a terminal outcome.
    pub fn in_flight(&self) -> u64 {
        let attempted = self.attempted.load(Ordering::SeqCst);
        let settled =
            self.succeeded.load(Ordering::SeqCst) + self.failed.load(Ordering::SeqCst);
        attempted.saturating_sub(settled)
    }

    /// Snapshot the final summary after the run drains.
    pub fn snapshot(&self, elapsed: Duration) -> Summary {
        let attempted = self.attempted.load(Ordering::SeqCst);
        let histogram = self.latency.lock();

        let latency = if histogram.is_empty() {
            None
        } else {
            Some(LatencySummary {
                p50: Duration::from_micros(histogram.value_at_quantile(0.50)),
                p90: Duration::from_micros(histogram.value_at_quantile(0.90)),
                p99: Duration::from_micros(histogram.value_at_quantile(0.99)),
                max: Duration::from_micros(histogram.max()),
            })
        };

        Summary {
            elapsed,
            attempted,
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            achieved_rate: if elapsed.as_secs_f64() > 0.0 {
                attempted as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            },
            latency,
        }
    }
}

/// Final accounting for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Wall-clock duration of the run, including draining.
    pub elapsed: Duration,
    /// Total submissions admitted.
    pub attempted: u64,
    /// Submissions that reached inclusion.
    pub succeeded: u64,
    /// Submissions with any other terminal outcome.
    pub failed: u64,
    /// Average admissions per second over the run.
    pub achieved_rate: f64,
    /// Submit-to-inclusion latency percentiles, if anything succeeded.
    pub latency: Option<LatencySummary>,
}

/// Latency percentiles for successful submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl Summary {
    /// Print the summary to stdout.
    pub fn print(&self) {
        println!("\n=== Submission Report ===");
        println!("Elapsed:   {:?}", self.elapsed);
        println!("Attempted: {}", self.attempted);
        println!("Succeeded: {}", self.succeeded);
        println!("Failed:    {}", self.failed);
        println!("Avg rate:  {:.2}/s", self.achieved_rate);

        if let Some(ref latency) = self.latency {
            println!();
            println!("Inclusion latency:");
            println!("  P50:  {:?}", latency.p50);
            println!("  P90:  {:?}", latency.p90);
            println!("  P99:  {:?}", latency.p99);
            println!("  Max:  {:?}", latency.max);
        }
    }
}
