use crate::error::{AppError, Result};
use crate::filter::{LeagueTag, StatusTab};

pub const API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Rows at the top of the filtered list that stay visible without premium.
pub const FREE_PREVIEW_ROWS: usize = 2;

/// Goals-market probability a row must strictly exceed to count as value.
pub const VALUE_PROBABILITY_THRESHOLD: f64 = 60.0;

/// First-half-goal probability a row must strictly exceed for the 1H Goal tab.
pub const FIRST_HALF_GOAL_THRESHOLD: f64 = 60.0;

/// How long the Verified confirmation stays on screen before the dialog closes.
pub const VERIFY_DISPLAY_MS: u64 = 2000;

/// Channel capacity for verification results routed back to the UI task.
pub const CHANNEL_CAPACITY: usize = 16;

/// User id sent with verification when the session carries no user.
pub const FALLBACK_USER_ID: &str = "current_user_id";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, including any API prefix (API_BASE_URL)
    pub api_base_url: String,
    pub log_level: String,
    /// Session document with the bearer credential and language (SESSION_PATH)
    pub session_path: String,
    /// TUI log destination (LOG_FILE)
    pub log_file: String,
    /// Initial status tab (FEED_TAB)
    pub feed_tab: StatusTab,
    /// Initial league (FEED_LEAGUE)
    pub feed_league: LeagueTag,
    pub verify_display_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let feed_tab = var("FEED_TAB", "upcoming");
        let feed_tab = feed_tab.parse::<StatusTab>().map_err(|_| {
            AppError::Config(format!(
                "FEED_TAB must be one of upcoming, live, value, 1h-goal (got {feed_tab:?})"
            ))
        })?;

        Ok(Self {
            api_base_url: var("API_BASE_URL", API_BASE_URL).trim_end_matches('/').to_string(),
            log_level: var("LOG_LEVEL", "info"),
            session_path: var("SESSION_PATH", "session.json"),
            log_file: var("LOG_FILE", "goalsnap-tui.log"),
            feed_tab,
            feed_league: LeagueTag::from_label(&var("FEED_LEAGUE", "All")),
            verify_display_ms: var("VERIFY_DISPLAY_MS", &VERIFY_DISPLAY_MS.to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("VERIFY_DISPLAY_MS must be a whole number of milliseconds".to_string())
                })?,
        })
    }
}
