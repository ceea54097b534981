use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    /// The fixture list could not be obtained; nothing was merged.
    #[error("Fixture list unavailable: {0}")]
    FixtureList(String),

    #[error("No session credential; log in first")]
    MissingCredential,
}

pub type Result<T> = std::result::Result<T, AppError>;

pub const DEFAULT_REJECTION: &str = "Verification failed";

/// Why a payment verification did not succeed. Both kinds land the machine
/// in the same Failed state; only the text differs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    /// Backend answered with a non-success status. Carries its reason verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Verification failed: {0}")]
    Transport(String),
}

impl VerificationFailure {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
