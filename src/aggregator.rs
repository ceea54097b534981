use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::backend::FeedBackend;
use crate::error::{AppError, Result};
use crate::fetcher::fetch_analysis_timed;
use crate::latency::{LatencyStats, Percentiles};
use crate::types::FeedRow;

#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub fixtures: usize,
    pub analysed: usize,
    pub absent: usize,
    pub elapsed: Duration,
    /// Analysis requests timed during this load.
    pub analysis_samples: u64,
    /// Percentiles over this load's requests only.
    pub analysis_latency: Percentiles,
}

/// Builds the merged feed: one fixture-list call, then one analysis request
/// per fixture, all in flight together and joined before anything is returned.
pub struct FeedAggregator<B> {
    backend: B,
    latency: LatencyStats,
}

impl<B: FeedBackend> FeedAggregator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, latency: LatencyStats::new() }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Latency of every analysis request this aggregator has issued.
    pub fn latency(&self) -> &LatencyStats {
        &self.latency
    }

    pub async fn load(&self) -> Result<Vec<FeedRow>> {
        self.load_with_stats().await.map(|(rows, _)| rows)
    }

    /// Fails only when the fixture list itself cannot be obtained. Rows come
    /// back in fixture-list order whatever order the analyses settle in.
    pub async fn load_with_stats(&self) -> Result<(Vec<FeedRow>, LoadStats)> {
        let started = Instant::now();

        let fixtures = self.backend.fixtures().await.map_err(|e| {
            warn!("fixture list request failed: {e}");
            match e {
                AppError::FixtureList(reason) => AppError::FixtureList(reason),
                other => AppError::FixtureList(other.to_string()),
            }
        })?;

        let settled = join_all(
            fixtures
                .iter()
                .map(|f| fetch_analysis_timed(&self.backend, f.id)),
        )
        .await;

        let this_load = LatencyStats::new();
        let rows: Vec<FeedRow> = fixtures
            .into_iter()
            .zip(settled)
            .map(|(fixture, (analysis, took))| {
                this_load.record(took);
                self.latency.record(took);
                FeedRow::from_analysis(fixture, analysis)
            })
            .collect();

        let analysed = rows.iter().filter(|r| r.prediction.is_some()).count();
        let stats = LoadStats {
            fixtures: rows.len(),
            analysed,
            absent: rows.len() - analysed,
            elapsed: started.elapsed(),
            analysis_samples: this_load.len(),
            analysis_latency: this_load.percentiles(),
        };

        info!(
            fixtures = stats.fixtures,
            analysed = stats.analysed,
            absent = stats.absent,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            p50_us = ?stats.analysis_latency.p50_us,
            p99_us = ?stats.analysis_latency.p99_us,
            "Feed load complete: {} fixtures, {} with analysis, {} absent",
            stats.fixtures,
            stats.analysed,
            stats.absent,
        );

        Ok((rows, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{fixture, prediction, ScriptedBackend};
    use crate::types::FixtureStatus;

    fn fixtures(n: u64) -> Vec<crate::types::Fixture> {
        (1..=n).map(|id| fixture(id, "Premier League", FixtureStatus::NotStarted)).collect()
    }

    #[tokio::test]
    async fn rows_keep_fixture_order_when_analyses_settle_in_reverse() {
        // Earlier fixtures answer last.
        let mut backend = ScriptedBackend::new(fixtures(5));
        for id in 1..=5 {
            backend = backend.reply(id, (6 - id) * 15, Some(prediction(50.0 + id as f64, None)));
        }
        let aggregator = FeedAggregator::new(backend);

        let rows = aggregator.load().await.unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r.fixture.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        for row in &rows {
            let p = row.prediction.as_ref().expect("prediction merged");
            assert_eq!(p.goals_market_probability(), 50.0 + row.fixture.id as f64);
        }
    }

    #[tokio::test]
    async fn analyses_are_issued_concurrently() {
        let mut backend = ScriptedBackend::new(fixtures(4));
        for id in 1..=4 {
            backend = backend.reply(id, 100, Some(prediction(55.0, None)));
        }
        let aggregator = FeedAggregator::new(backend);

        let (_, stats) = aggregator.load_with_stats().await.unwrap();

        // Sequential would take 400ms.
        assert!(stats.elapsed < Duration::from_millis(300), "elapsed={:?}", stats.elapsed);
        assert_eq!(aggregator.latency().len(), 4);
    }

    #[tokio::test]
    async fn load_stats_cover_only_their_own_load() {
        let backend = ScriptedBackend::new(fixtures(2))
            .reply(1, 0, Some(prediction(55.0, None)))
            .reply(2, 0, Some(prediction(55.0, None)));
        let aggregator = FeedAggregator::new(backend);

        let (_, first) = aggregator.load_with_stats().await.unwrap();
        let (_, second) = aggregator.load_with_stats().await.unwrap();

        assert_eq!(first.analysis_samples, 2);
        assert_eq!(second.analysis_samples, 2);
        assert!(second.analysis_latency.p50_us.is_some());
        assert_eq!(aggregator.latency().len(), 4);
    }

    #[tokio::test]
    async fn every_analysis_failing_still_loads_all_rows() {
        let aggregator = FeedAggregator::new(ScriptedBackend::new(fixtures(3)));

        let (rows, stats) = aggregator.load_with_stats().await.unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.prediction.is_none()));
        assert_eq!(stats.absent, 3);
        assert_eq!(stats.analysed, 0);
    }

    #[tokio::test]
    async fn partial_failures_only_degrade_their_rows() {
        let backend = ScriptedBackend::new(fixtures(3))
            .reply(1, 0, Some(prediction(70.0, None)))
            .reply(2, 10, None)
            .reply(3, 5, Some(prediction(40.0, None)));
        let aggregator = FeedAggregator::new(backend);

        let rows = aggregator.load().await.unwrap();

        let present: Vec<bool> = rows.iter().map(|r| r.prediction.is_some()).collect();
        assert_eq!(present, vec![true, false, true]);
    }

    #[tokio::test]
    async fn fixture_list_failure_fails_the_load_without_fetching_analyses() {
        let aggregator = FeedAggregator::new(ScriptedBackend::failing_fixture_list("503 Service Unavailable"));

        let err = aggregator.load().await.unwrap_err();

        assert!(matches!(err, AppError::FixtureList(ref r) if r.contains("503")));
        assert!(aggregator.backend().analysis_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_fixture_list_is_an_empty_feed() {
        let aggregator = FeedAggregator::new(ScriptedBackend::new(Vec::new()));
        let rows = aggregator.load().await.unwrap();
        assert!(rows.is_empty());
    }
}
