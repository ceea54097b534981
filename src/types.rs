use serde::{Deserialize, Serialize};

pub type FixtureId = u64;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_logo: Option<String>,
    #[serde(default)]
    pub away_logo: Option<String>,
    pub league: String,
    #[serde(default)]
    pub league_logo: Option<String>,
    /// ISO-8601 kickoff timestamp as sent by the backend.
    pub kickoff_time: String,
    pub status: FixtureStatus,
}

/// Short status code of a fixture. Codes outside the known vocabulary decode
/// to `Unknown` rather than failing the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FixtureStatus {
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    ExtraTime,
    BreakTime,
    Penalties,
    Live,
    Finished,
    ToBeDetermined,
    Postponed,
    Unknown(String),
}

impl FixtureStatus {
    pub const KNOWN: [FixtureStatus; 11] = [
        FixtureStatus::NotStarted,
        FixtureStatus::FirstHalf,
        FixtureStatus::HalfTime,
        FixtureStatus::SecondHalf,
        FixtureStatus::ExtraTime,
        FixtureStatus::BreakTime,
        FixtureStatus::Penalties,
        FixtureStatus::Live,
        FixtureStatus::Finished,
        FixtureStatus::ToBeDetermined,
        FixtureStatus::Postponed,
    ];

    pub fn from_code(code: &str) -> Self {
        match code {
            "NS" => FixtureStatus::NotStarted,
            "1H" => FixtureStatus::FirstHalf,
            "HT" => FixtureStatus::HalfTime,
            "2H" => FixtureStatus::SecondHalf,
            "ET" => FixtureStatus::ExtraTime,
            "BT" => FixtureStatus::BreakTime,
            "P" => FixtureStatus::Penalties,
            "LIVE" => FixtureStatus::Live,
            "FT" => FixtureStatus::Finished,
            "TBD" => FixtureStatus::ToBeDetermined,
            "PST" => FixtureStatus::Postponed,
            other => FixtureStatus::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            FixtureStatus::NotStarted => "NS",
            FixtureStatus::FirstHalf => "1H",
            FixtureStatus::HalfTime => "HT",
            FixtureStatus::SecondHalf => "2H",
            FixtureStatus::ExtraTime => "ET",
            FixtureStatus::BreakTime => "BT",
            FixtureStatus::Penalties => "P",
            FixtureStatus::Live => "LIVE",
            FixtureStatus::Finished => "FT",
            FixtureStatus::ToBeDetermined => "TBD",
            FixtureStatus::Postponed => "PST",
            FixtureStatus::Unknown(code) => code,
        }
    }

    /// Kickoff has not happened yet (including fixtures without a date).
    pub fn is_pre_match(&self) -> bool {
        matches!(
            self,
            FixtureStatus::NotStarted | FixtureStatus::ToBeDetermined | FixtureStatus::Postponed
        )
    }

    pub fn is_in_play(&self) -> bool {
        matches!(
            self,
            FixtureStatus::FirstHalf
                | FixtureStatus::HalfTime
                | FixtureStatus::SecondHalf
                | FixtureStatus::ExtraTime
                | FixtureStatus::BreakTime
                | FixtureStatus::Penalties
                | FixtureStatus::Live
        )
    }
}

impl From<String> for FixtureStatus {
    fn from(code: String) -> Self {
        FixtureStatus::from_code(&code)
    }
}

impl From<FixtureStatus> for String {
    fn from(status: FixtureStatus) -> Self {
        status.code().to_string()
    }
}

impl std::fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Percentages are independently rounded by the backend and need not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstHalfAnalysis {
    pub has_value: bool,
    pub probability: f64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsMarket {
    #[serde(default)]
    pub over_2_5: f64,
    /// Over/under line the probability refers to.
    pub real_line: f64,
    pub probability: f64,
    #[serde(default)]
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandicapMarket {
    pub suggested_line: String,
    #[serde(default)]
    pub expected_goal_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInsight {
    pub main_pick: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub momentum_analysis: Option<String>,
    #[serde(default)]
    pub lineup_analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAnalysis {
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub advice: Option<String>,
    pub probabilities: Probabilities,
    #[serde(default)]
    pub first_half_analysis: Option<FirstHalfAnalysis>,
    pub goals_market: GoalsMarket,
    #[serde(default)]
    pub expected_score: Option<String>,
    #[serde(default)]
    pub handicap_market: Option<HandicapMarket>,
    #[serde(default)]
    pub ai_insight: Option<AiInsight>,
    #[serde(default)]
    pub form_analysis: Option<FormAnalysis>,
}

impl Prediction {
    /// Advisory label, falling back to the insight's main pick.
    pub fn advice(&self) -> &str {
        self.advice
            .as_deref()
            .or_else(|| self.ai_insight.as_ref().map(|i| i.main_pick.as_str()))
            .unwrap_or("No Advice")
    }

    /// Headline figure for a row: the stronger of the two win outcomes.
    pub fn confidence(&self) -> f64 {
        self.probabilities.home_win.max(self.probabilities.away_win)
    }

    /// 0 when the backend sent no first-half analysis.
    pub fn first_half_goal_probability(&self) -> f64 {
        self.first_half_analysis
            .as_ref()
            .map_or(0.0, |h| h.probability)
    }

    pub fn goals_market_probability(&self) -> f64 {
        self.goals_market.probability
    }
}

// ---------------------------------------------------------------------------
// Match context (lineups, injuries, head-to-head)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub player: PlayerRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLineup {
    #[serde(default)]
    pub formation: Option<String>,
    #[serde(rename = "startXI", default)]
    pub start_xi: Vec<LineupEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub name: String,
}

/// A player ruled out of the fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injury {
    pub player: PlayerRef,
    pub team: TeamRef,
    /// "Missing Fixture", "Questionable", ...
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// One past meeting of the two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchContext {
    pub lineups: Vec<TeamLineup>,
    pub injuries: Vec<Injury>,
    pub history: Vec<HeadToHead>,
}

/// A successful analysis: the prediction plus the match context sent with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub prediction: Prediction,
    pub context: MatchContext,
}

/// Body of `GET /fixtures/{id}/analyze`. The context lists may be missing
/// or null.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisEnvelope {
    #[serde(alias = "match_info")]
    pub fixture: Fixture,
    #[serde(alias = "ai_analysis")]
    pub analysis: Prediction,
    #[serde(default)]
    pub history: Option<Vec<HeadToHead>>,
    #[serde(default)]
    pub injuries: Option<Vec<Injury>>,
    #[serde(default)]
    pub lineups: Option<Vec<TeamLineup>>,
}

impl AnalysisEnvelope {
    pub fn into_analysis(self) -> Analysis {
        Analysis {
            prediction: self.analysis,
            context: MatchContext {
                lineups: self.lineups.unwrap_or_default(),
                injuries: self.injuries.unwrap_or_default(),
                history: self.history.unwrap_or_default(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Feed rows
// ---------------------------------------------------------------------------

/// A fixture merged with its prediction, when the prediction fetch succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRow {
    pub fixture: Fixture,
    pub prediction: Option<Prediction>,
    /// Empty when the analysis is absent.
    pub context: MatchContext,
}

impl FeedRow {
    pub fn new(fixture: Fixture, prediction: Option<Prediction>) -> Self {
        Self { fixture, prediction, context: MatchContext::default() }
    }

    pub fn from_analysis(fixture: Fixture, analysis: Option<Analysis>) -> Self {
        match analysis {
            Some(a) => Self { fixture, prediction: Some(a.prediction), context: a.context },
            None => Self::new(fixture, None),
        }
    }

    pub fn status(&self) -> &FixtureStatus {
        &self.fixture.status
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct HistorySummary {
    pub win: u32,
    pub loss: u32,
    pub draw: u32,
    pub total: u32,
}

impl HistorySummary {
    /// Share of graded picks that won, in percent.
    pub fn hit_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(f64::from(self.win) * 100.0 / f64::from(self.total))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinishedMatch {
    pub id: FixtureId,
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub score_home: Option<u32>,
    pub score_away: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PickOutcome {
    Win,
    Loss,
    Push,
    #[serde(rename = "N/A")]
    Ungraded,
}

impl std::fmt::Display for PickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PickOutcome::Win => "Win",
            PickOutcome::Loss => "Loss",
            PickOutcome::Push => "Push",
            PickOutcome::Ungraded => "N/A",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradedPick {
    #[serde(rename = "match")]
    pub fixture: FinishedMatch,
    pub prediction: String,
    pub outcome: PickOutcome,
}

/// Body of `GET /history?date=`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryReport {
    pub date: String,
    pub summary: HistorySummary,
    pub matches: Vec<GradedPick>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
