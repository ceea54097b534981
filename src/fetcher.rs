use std::time::{Duration, Instant};

use tracing::debug;

use crate::backend::FeedBackend;
use crate::types::{Analysis, FixtureId};

/// Request the prediction (and its match context) for one fixture. Every
/// transport or decode failure is absorbed here and reported as `None`;
/// there is no retry.
pub async fn fetch_analysis<B: FeedBackend>(backend: &B, fixture_id: FixtureId) -> Option<Analysis> {
    match backend.analysis(fixture_id).await {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            debug!(fixture_id, "analysis absent: {e}");
            None
        }
    }
}

/// `fetch_analysis` plus how long the request took to settle.
pub async fn fetch_analysis_timed<B: FeedBackend>(
    backend: &B,
    fixture_id: FixtureId,
) -> (Option<Analysis>, Duration) {
    let started = Instant::now();
    let analysis = fetch_analysis(backend, fixture_id).await;
    (analysis, started.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{fixture, prediction, ScriptedBackend};
    use crate::types::FixtureStatus;

    #[tokio::test]
    async fn failure_becomes_absent_without_retry() {
        let backend = ScriptedBackend::new(vec![fixture(9, "L", FixtureStatus::NotStarted)]).reply(9, 0, None);
        assert!(fetch_analysis(&backend, 9).await.is_none());
        assert_eq!(*backend.analysis_calls.lock().unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn success_returns_prediction() {
        let backend = ScriptedBackend::new(Vec::new()).reply(3, 5, Some(prediction(64.0, None)));
        let (got, elapsed) = fetch_analysis_timed(&backend, 3).await;
        assert_eq!(got.map(|a| a.prediction.goals_market_probability()), Some(64.0));
        assert!(elapsed >= Duration::from_millis(5));
    }
}
