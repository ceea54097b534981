//! In-memory latency histogram for the analysis fan-out.
//! Records time from issuing a prediction request to its settlement.

use std::sync::Mutex;
use std::time::Duration;

/// Values stored in microseconds, 1us to 100s at 3 significant figures.
pub struct LatencyStats {
    inner: Mutex<Option<hdrhistogram::Histogram<u64>>>,
}

/// p50 / p95 / p99 in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Percentiles {
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(hdrhistogram::Histogram::new_with_bounds(1, 100_000_000, 3).ok()),
        }
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        if let Ok(mut guard) = self.inner.lock() {
            if let Some(h) = guard.as_mut() {
                h.saturating_record(us.max(1));
            }
        }
    }

    pub fn percentiles(&self) -> Percentiles {
        let Ok(guard) = self.inner.lock() else {
            return Percentiles::default();
        };
        match guard.as_ref() {
            Some(h) if h.len() > 0 => Percentiles {
                p50_us: Some(h.value_at_quantile(0.5)),
                p95_us: Some(h.value_at_quantile(0.95)),
                p99_us: Some(h.value_at_quantile(0.99)),
            },
            _ => Percentiles::default(),
        }
    }

    pub fn len(&self) -> u64 {
        self.inner
            .lock()
            .ok()
            .and_then(|g| g.as_ref().map(|h| h.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram_has_no_percentiles() {
        let stats = LatencyStats::new();
        assert!(stats.is_empty());
        assert_eq!(stats.percentiles(), Percentiles::default());
    }

    #[test]
    fn percentiles_follow_recorded_samples() {
        let stats = LatencyStats::new();
        for ms in 1..=100 {
            stats.record(Duration::from_millis(ms));
        }
        assert_eq!(stats.len(), 100);
        let p = stats.percentiles();
        let p50 = p.p50_us.unwrap();
        let p99 = p.p99_us.unwrap();
        assert!((49_000..=51_000).contains(&p50), "p50={p50}");
        assert!(p99 >= 98_000, "p99={p99}");
    }
}
