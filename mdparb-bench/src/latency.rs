//! Latency measurement utilities.

use crate::scenario::FeedArrival;
use bytes::Bytes;
use hdrhistogram::{CreationError, Histogram};
use mdparb_arbitration::{ArbitrationConfig, ArbitrationEngine, ArbitrationError};
use std::time::{Duration, Instant};

/// Highest latency tracked, in nanoseconds.
const MAX_TRACKABLE_NANOS: u64 = 60_000_000_000;

/// Latency statistics.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    /// Minimum latency.
    pub min: Duration,
    /// Maximum latency.
    pub max: Duration,
    /// Mean latency.
    pub mean: Duration,
    /// Median latency (p50).
    pub median: Duration,
    /// 99th percentile latency.
    pub p99: Duration,
    /// 99.9th percentile latency.
    pub p999: Duration,
    /// Sample count.
    pub count: u64,
}

/// Collects latency samples into an HDR histogram.
pub struct LatencyCollector {
    histogram: Histogram<u64>,
}

impl LatencyCollector {
    /// Creates a collector tracking 1ns to 60s with 3 significant digits.
    ///
    /// # Errors
    /// Returns `CreationError` if the histogram cannot be allocated.
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            histogram: Histogram::new_with_bounds(1, MAX_TRACKABLE_NANOS, 3)?,
        })
    }

    /// Records a latency sample, clamped to the trackable range.
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(nanos.clamp(1, MAX_TRACKABLE_NANOS));
    }

    /// Measures the latency of a function.
    pub fn measure<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        self.record(start.elapsed());
        result
    }

    /// Computes statistics from collected samples.
    #[must_use]
    pub fn stats(&self) -> Option<LatencyStats> {
        if self.is_empty() {
            return None;
        }
        let h = &self.histogram;
        Some(LatencyStats {
            min: Duration::from_nanos(h.min()),
            max: Duration::from_nanos(h.max()),
            mean: Duration::from_nanos(h.mean() as u64),
            median: Duration::from_nanos(h.value_at_quantile(0.5)),
            p99: Duration::from_nanos(h.value_at_quantile(0.99)),
            p999: Duration::from_nanos(h.value_at_quantile(0.999)),
            count: h.len(),
        })
    }

    /// Clears all samples.
    pub fn clear(&mut self) {
        self.histogram.reset();
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    /// Returns true if no samples have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }
}

/// Replays `arrivals` through a fresh engine, timing each ingest.
///
/// # Errors
/// Returns `ArbitrationError` if `config` is invalid.
pub fn profile_ingest(
    arrivals: &[FeedArrival],
    config: ArbitrationConfig,
    collector: &mut LatencyCollector,
) -> Result<(), ArbitrationError> {
    let mut engine = ArbitrationEngine::new(config)?;
    for arrival in arrivals {
        let outcome = collector.measure(|| {
            engine.ingest_at(arrival.line, arrival.sequence, Bytes::new(), Instant::now())
        });
        std::hint::black_box(outcome);
    }
    Ok(())
}
