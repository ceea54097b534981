use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result, VerificationFailure, DEFAULT_REJECTION};
use crate::session::Session;
use crate::types::{Analysis, AnalysisEnvelope, Fixture, FixtureId, HistoryReport};

/// Body of `POST /payment/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub tx_ref: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default, alias = "reason")]
    detail: Option<serde_json::Value>,
}

/// The backend collaborator as the core sees it. `HttpBackend` is the real
/// one; tests script their own.
#[allow(async_fn_in_trait)]
pub trait FeedBackend {
    async fn fixtures(&self) -> Result<Vec<Fixture>>;

    async fn analysis(&self, fixture_id: FixtureId) -> Result<Analysis>;

    async fn verify(&self, request: &VerifyRequest) -> std::result::Result<(), VerificationFailure>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(cfg: &Config, session: &Session) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: cfg.api_base_url.clone(),
            token: session.token().map(str::to_string),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with the session's bearer credential attached.
    fn authed_get(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.client.get(self.url(path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// AI performance report for one finished-match day (`YYYY-MM-DD`).
    pub async fn history(&self, date: &str) -> Result<HistoryReport> {
        let resp = self
            .authed_get("/history")
            .query(&[("date", date)])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

impl FeedBackend for HttpBackend {
    async fn fixtures(&self) -> Result<Vec<Fixture>> {
        let resp = self.authed_get("/fixtures").send().await?.error_for_status()?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            AppError::FixtureList(format!("GET /fixtures response was not a fixture array: {e}"))
        })
    }

    async fn analysis(&self, fixture_id: FixtureId) -> Result<Analysis> {
        let path = format!("/fixtures/{fixture_id}/analyze");
        let resp = self.authed_get(&path).send().await?.error_for_status()?;
        let envelope: AnalysisEnvelope = resp.json().await?;
        if envelope.fixture.id != fixture_id {
            debug!(
                fixture_id,
                returned = envelope.fixture.id,
                "analysis envelope names a different fixture"
            );
        }
        Ok(envelope.into_analysis())
    }

    async fn verify(&self, request: &VerifyRequest) -> std::result::Result<(), VerificationFailure> {
        let resp = self
            .client
            .post(self.url("/payment/verify"))
            .json(request)
            .send()
            .await
            .map_err(|e| VerificationFailure::Transport(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let reason = resp
            .json::<RejectionBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .and_then(|detail| detail.as_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
        debug!(%status, %reason, "verification rejected");
        Err(VerificationFailure::Rejected(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_request_uses_camel_case_keys() {
        let req = VerifyRequest { tx_ref: "0xabc".to_string(), user_id: "42".to_string() };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"txRef": "0xabc", "userId": "42"}));
    }

    #[test]
    fn rejection_body_accepts_reason_alias() {
        let body: RejectionBody = serde_json::from_str(r#"{"reason":"Unconfirmed"}"#).unwrap();
        assert_eq!(body.detail.and_then(|d| d.as_str().map(str::to_string)).as_deref(), Some("Unconfirmed"));
    }
}

/// Scripted in-memory backend and row builders shared by unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::types::{FeedRow, FirstHalfAnalysis, FixtureStatus, GoalsMarket, MatchContext, Prediction, Probabilities};

    pub fn fixture(id: FixtureId, league: &str, status: FixtureStatus) -> Fixture {
        Fixture {
            id,
            home_team: format!("Home {id}"),
            away_team: format!("Away {id}"),
            home_logo: None,
            away_logo: None,
            league: league.to_string(),
            league_logo: None,
            kickoff_time: "2026-10-14T19:00:00+00:00".to_string(),
            status,
        }
    }

    pub fn prediction(goals_probability: f64, first_half_probability: Option<f64>) -> Prediction {
        Prediction {
            advice: Some("GOAL: OVER 2.5".to_string()),
            probabilities: Probabilities { home_win: 45.0, draw: 25.0, away_win: 31.0 },
            first_half_analysis: first_half_probability.map(|p| FirstHalfAnalysis {
                has_value: p > 50.0,
                probability: p,
                text: "Moderate Chance".to_string(),
            }),
            goals_market: GoalsMarket {
                over_2_5: goals_probability,
                real_line: 2.5,
                probability: goals_probability,
                analysis: format!("Over 2.5: {goals_probability:.1}%"),
            },
            expected_score: None,
            handicap_market: None,
            ai_insight: None,
            form_analysis: None,
        }
    }

    pub fn row(id: FixtureId, league: &str, status: FixtureStatus, prediction: Option<Prediction>) -> FeedRow {
        FeedRow::new(fixture(id, league, status), prediction)
    }

    /// One scripted reply per fixture: settle after `delay`, with a prediction
    /// or (None) a failure.
    pub struct ScriptedBackend {
        pub fixtures: std::result::Result<Vec<Fixture>, String>,
        pub replies: HashMap<FixtureId, (Duration, Option<Analysis>)>,
        pub verify_outcome: std::result::Result<(), VerificationFailure>,
        pub analysis_calls: Mutex<Vec<FixtureId>>,
        pub verify_calls: Mutex<Vec<VerifyRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(fixtures: Vec<Fixture>) -> Self {
            Self {
                fixtures: Ok(fixtures),
                replies: HashMap::new(),
                verify_outcome: Ok(()),
                analysis_calls: Mutex::new(Vec::new()),
                verify_calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_fixture_list(reason: &str) -> Self {
            let mut backend = Self::new(Vec::new());
            backend.fixtures = Err(reason.to_string());
            backend
        }

        pub fn reply(mut self, id: FixtureId, delay_ms: u64, prediction: Option<Prediction>) -> Self {
            let analysis = prediction.map(|prediction| Analysis { prediction, context: MatchContext::default() });
            self.replies.insert(id, (Duration::from_millis(delay_ms), analysis));
            self
        }
    }

    impl FeedBackend for ScriptedBackend {
        async fn fixtures(&self) -> Result<Vec<Fixture>> {
            self.fixtures.clone().map_err(AppError::FixtureList)
        }

        async fn analysis(&self, fixture_id: FixtureId) -> Result<Analysis> {
            self.analysis_calls.lock().unwrap().push(fixture_id);
            let (delay, reply) = self
                .replies
                .get(&fixture_id)
                .cloned()
                .unwrap_or((Duration::ZERO, None));
            tokio::time::sleep(delay).await;
            reply.ok_or_else(|| AppError::Config(format!("no analysis for {fixture_id}")))
        }

        async fn verify(&self, request: &VerifyRequest) -> std::result::Result<(), VerificationFailure> {
            self.verify_calls.lock().unwrap().push(request.clone());
            self.verify_outcome.clone()
        }
    }
}
