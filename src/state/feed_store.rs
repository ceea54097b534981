use tracing::warn;

use crate::error::Result;
use crate::filter::{available_leagues, LeagueTag};
use crate::types::FeedRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    /// Fixture list unavailable; the feed is empty until a retry succeeds.
    Failed(String),
}

/// Owner of the aggregated feed. Rows are only ever replaced as a whole.
#[derive(Debug, Clone)]
pub struct FeedStore {
    rows: Vec<FeedRow>,
    leagues: Vec<LeagueTag>,
    status: LoadStatus,
}

impl FeedStore {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            leagues: vec![LeagueTag::All],
            status: LoadStatus::Loading,
        }
    }

    pub fn begin_load(&mut self) {
        self.status = LoadStatus::Loading;
    }

    /// Install the outcome of one aggregator load.
    pub fn apply_load(&mut self, result: Result<Vec<FeedRow>>) {
        match result {
            Ok(rows) => {
                self.leagues = available_leagues(&rows);
                self.rows = rows;
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                warn!("feed load failed: {e}");
                self.rows.clear();
                self.leagues = vec![LeagueTag::All];
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    pub fn rows(&self) -> &[FeedRow] {
        &self.rows
    }

    /// League choices derived from the unfiltered feed.
    pub fn leagues(&self) -> &[LeagueTag] {
        &self.leagues
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::row;
    use crate::error::AppError;
    use crate::types::FixtureStatus;

    #[test]
    fn successful_load_replaces_rows_and_leagues() {
        let mut store = FeedStore::new();
        assert!(store.is_loading());

        store.apply_load(Ok(vec![
            row(1, "Serie A", FixtureStatus::NotStarted, None),
            row(2, "Bundesliga", FixtureStatus::Live, None),
        ]));

        assert_eq!(*store.status(), LoadStatus::Ready);
        assert_eq!(store.rows().len(), 2);
        assert_eq!(store.leagues().len(), 3);
        assert_eq!(store.leagues()[1], LeagueTag::League("Bundesliga".to_string()));
    }

    #[test]
    fn failed_load_empties_the_feed() {
        let mut store = FeedStore::new();
        store.apply_load(Ok(vec![row(1, "Serie A", FixtureStatus::NotStarted, None)]));

        store.begin_load();
        store.apply_load(Err(AppError::FixtureList("timed out".to_string())));

        assert!(store.rows().is_empty());
        assert_eq!(store.leagues(), &[LeagueTag::All]);
        assert!(matches!(store.status(), LoadStatus::Failed(r) if r.contains("timed out")));
    }

    #[test]
    fn retry_after_failure_restores_the_feed() {
        let mut store = FeedStore::new();
        store.apply_load(Err(AppError::FixtureList("down".to_string())));
        store.begin_load();
        store.apply_load(Ok(vec![row(5, "Ligue 1", FixtureStatus::Postponed, None)]));
        assert_eq!(*store.status(), LoadStatus::Ready);
        assert_eq!(store.rows()[0].fixture.id, 5);
    }
}
