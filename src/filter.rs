use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::config::{FIRST_HALF_GOAL_THRESHOLD, VALUE_PROBABILITY_THRESHOLD};
use crate::types::{FeedRow, FixtureStatus, Prediction};

/// Status-category tab of the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusTab {
    #[default]
    Upcoming,
    Live,
    Value,
    FirstHalfGoal,
}

impl StatusTab {
    pub const ALL: [StatusTab; 4] = [
        StatusTab::Upcoming,
        StatusTab::Live,
        StatusTab::Value,
        StatusTab::FirstHalfGoal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatusTab::Upcoming => "Upcoming",
            StatusTab::Live => "Live",
            StatusTab::Value => "Value",
            StatusTab::FirstHalfGoal => "1H Goal",
        }
    }

    pub fn position(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn admits_status(&self, status: &FixtureStatus) -> bool {
        match self {
            StatusTab::Upcoming | StatusTab::Value => status.is_pre_match(),
            StatusTab::Live => status.is_in_play(),
            StatusTab::FirstHalfGoal => {
                status.is_pre_match()
                    || matches!(status, FixtureStatus::FirstHalf | FixtureStatus::Live)
            }
        }
    }

    /// An absent prediction counts as probability 0.
    fn admits_prediction(&self, prediction: Option<&Prediction>) -> bool {
        match self {
            StatusTab::Upcoming | StatusTab::Live => true,
            StatusTab::Value => prediction
                .map_or(0.0, Prediction::goals_market_probability)
                > VALUE_PROBABILITY_THRESHOLD,
            StatusTab::FirstHalfGoal => prediction
                .map_or(0.0, Prediction::first_half_goal_probability)
                > FIRST_HALF_GOAL_THRESHOLD,
        }
    }

    pub fn admits(&self, row: &FeedRow) -> bool {
        self.admits_status(row.status()) && self.admits_prediction(row.prediction.as_ref())
    }
}

impl FromStr for StatusTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(StatusTab::Upcoming),
            "live" => Ok(StatusTab::Live),
            "value" => Ok(StatusTab::Value),
            "1h-goal" | "1h goal" | "first-half-goal" => Ok(StatusTab::FirstHalfGoal),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for StatusTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// League half of the selection: the `All` sentinel or one exact label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum LeagueTag {
    #[default]
    All,
    League(String),
}

impl LeagueTag {
    pub const ALL_LABEL: &'static str = "All Leagues";

    /// "All" and "All Leagues" name the sentinel; anything else is a league.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed == "All" || trimmed == Self::ALL_LABEL {
            LeagueTag::All
        } else {
            LeagueTag::League(trimmed.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LeagueTag::All => Self::ALL_LABEL,
            LeagueTag::League(name) => name,
        }
    }

    /// Exact, case-sensitive match.
    pub fn admits(&self, row: &FeedRow) -> bool {
        match self {
            LeagueTag::All => true,
            LeagueTag::League(name) => row.fixture.league == *name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub tab: StatusTab,
    pub league: LeagueTag,
}

impl FilterSelection {
    pub fn new(tab: StatusTab, league: LeagueTag) -> Self {
        Self { tab, league }
    }

    pub fn admits(&self, row: &FeedRow) -> bool {
        self.league.admits(row) && self.tab.admits(row)
    }
}

/// Stable filter: admitted rows in their original order.
pub fn apply<'a, R: Borrow<FeedRow>>(rows: &'a [R], selection: &FilterSelection) -> Vec<&'a FeedRow> {
    rows.iter()
        .map(<R as Borrow<FeedRow>>::borrow)
        .filter(|row| selection.admits(row))
        .collect()
}

/// League choices for the selector: `All` followed by every distinct league
/// of `rows` in ascending order. Pass the unfiltered feed.
pub fn available_leagues<R: Borrow<FeedRow>>(rows: &[R]) -> Vec<LeagueTag> {
    let distinct: BTreeSet<&str> = rows
        .iter()
        .map(|r| <R as Borrow<FeedRow>>::borrow(r).fixture.league.as_str())
        .collect();
    std::iter::once(LeagueTag::All)
        .chain(distinct.into_iter().map(|l| LeagueTag::League(l.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{prediction, row};

    fn one_row_per_status() -> Vec<FeedRow> {
        FixtureStatus::KNOWN
            .into_iter()
            .enumerate()
            .map(|(i, status)| row(i as u64 + 1, "L", status, None))
            .collect()
    }

    fn statuses(rows: &[&FeedRow]) -> Vec<FixtureStatus> {
        rows.iter().map(|r| r.fixture.status.clone()).collect()
    }

    #[test]
    fn upcoming_admits_only_pre_match_statuses() {
        let rows = one_row_per_status();
        let out = apply(&rows, &FilterSelection::new(StatusTab::Upcoming, LeagueTag::All));
        assert_eq!(
            statuses(&out),
            vec![FixtureStatus::NotStarted, FixtureStatus::ToBeDetermined, FixtureStatus::Postponed]
        );
    }

    #[test]
    fn live_admits_every_in_play_status_and_absent_predictions() {
        let rows = one_row_per_status();
        let out = apply(&rows, &FilterSelection::new(StatusTab::Live, LeagueTag::All));
        assert_eq!(
            statuses(&out),
            vec![
                FixtureStatus::FirstHalf,
                FixtureStatus::HalfTime,
                FixtureStatus::SecondHalf,
                FixtureStatus::ExtraTime,
                FixtureStatus::BreakTime,
                FixtureStatus::Penalties,
                FixtureStatus::Live,
            ]
        );
    }

    #[test]
    fn finished_and_unknown_are_in_no_tab() {
        let rows = vec![
            row(1, "L", FixtureStatus::Finished, Some(prediction(90.0, Some(90.0)))),
            row(2, "L", FixtureStatus::Unknown("AET".to_string()), Some(prediction(90.0, Some(90.0)))),
        ];
        for tab in StatusTab::ALL {
            assert!(apply(&rows, &FilterSelection::new(tab, LeagueTag::All)).is_empty(), "{tab}");
        }
    }

    #[test]
    fn value_threshold_is_strict() {
        let rows = vec![
            row(1, "L", FixtureStatus::NotStarted, Some(prediction(61.0, None))),
            row(2, "L", FixtureStatus::NotStarted, Some(prediction(60.0, None))),
            row(3, "L", FixtureStatus::NotStarted, None),
            row(4, "L", FixtureStatus::FirstHalf, Some(prediction(80.0, None))),
        ];
        let out = apply(&rows, &FilterSelection::new(StatusTab::Value, LeagueTag::All));
        let ids: Vec<_> = out.iter().map(|r| r.fixture.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn first_half_goal_covers_pre_match_first_half_and_live() {
        let rows = vec![
            row(1, "L", FixtureStatus::NotStarted, Some(prediction(10.0, Some(61.0)))),
            row(2, "L", FixtureStatus::FirstHalf, Some(prediction(10.0, Some(75.0)))),
            row(3, "L", FixtureStatus::Live, Some(prediction(10.0, Some(62.5)))),
            row(4, "L", FixtureStatus::HalfTime, Some(prediction(10.0, Some(90.0)))),
            row(5, "L", FixtureStatus::Postponed, Some(prediction(10.0, Some(60.0)))),
            row(6, "L", FixtureStatus::NotStarted, Some(prediction(99.0, None))),
            row(7, "L", FixtureStatus::NotStarted, None),
        ];
        let out = apply(&rows, &FilterSelection::new(StatusTab::FirstHalfGoal, LeagueTag::All));
        let ids: Vec<_> = out.iter().map(|r| r.fixture.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn league_match_is_exact_and_case_sensitive() {
        let rows = vec![
            row(1, "Premier League", FixtureStatus::NotStarted, None),
            row(2, "premier league", FixtureStatus::NotStarted, None),
            row(3, "La Liga", FixtureStatus::NotStarted, None),
            row(4, "Premier League", FixtureStatus::Postponed, None),
        ];
        let sel = FilterSelection::new(StatusTab::Upcoming, LeagueTag::League("Premier League".to_string()));
        let ids: Vec<_> = apply(&rows, &sel).iter().map(|r| r.fixture.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn apply_is_idempotent() {
        let rows = vec![
            row(1, "A", FixtureStatus::NotStarted, Some(prediction(70.0, Some(70.0)))),
            row(2, "B", FixtureStatus::FirstHalf, Some(prediction(65.0, Some(65.0)))),
            row(3, "A", FixtureStatus::Postponed, None),
            row(4, "A", FixtureStatus::Live, Some(prediction(10.0, Some(80.0)))),
            row(5, "B", FixtureStatus::ToBeDetermined, Some(prediction(61.0, Some(20.0)))),
        ];
        let leagues = [LeagueTag::All, LeagueTag::League("A".to_string())];
        for tab in StatusTab::ALL {
            for league in &leagues {
                let sel = FilterSelection::new(tab, league.clone());
                let once = apply(&rows, &sel);
                let twice = apply(&once, &sel);
                assert_eq!(once, twice, "{tab} / {}", league.label());
            }
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let rows: Vec<FeedRow> = Vec::new();
        assert!(apply(&rows, &FilterSelection::default()).is_empty());
        assert_eq!(available_leagues(&rows), vec![LeagueTag::All]);
    }

    #[test]
    fn available_leagues_are_sorted_distinct_with_sentinel_first() {
        let rows = vec![
            row(1, "Serie A", FixtureStatus::Finished, None),
            row(2, "La Liga", FixtureStatus::NotStarted, None),
            row(3, "Serie A", FixtureStatus::NotStarted, None),
        ];
        assert_eq!(
            available_leagues(&rows),
            vec![
                LeagueTag::All,
                LeagueTag::League("La Liga".to_string()),
                LeagueTag::League("Serie A".to_string()),
            ]
        );
    }

    #[test]
    fn tab_parsing_and_cycling() {
        assert_eq!("1H Goal".parse::<StatusTab>(), Ok(StatusTab::FirstHalfGoal));
        assert_eq!("LIVE".parse::<StatusTab>(), Ok(StatusTab::Live));
        assert!("finished".parse::<StatusTab>().is_err());
        assert_eq!(StatusTab::FirstHalfGoal.next(), StatusTab::Upcoming);
        assert_eq!(StatusTab::Upcoming.prev(), StatusTab::FirstHalfGoal);
    }

    #[test]
    fn league_sentinel_labels() {
        assert_eq!(LeagueTag::from_label("All Leagues"), LeagueTag::All);
        assert_eq!(LeagueTag::from_label("All"), LeagueTag::All);
        assert_eq!(LeagueTag::from_label("Eredivisie"), LeagueTag::League("Eredivisie".to_string()));
    }
}
