//! Session-scoped client storage: the bearer credential, the signed-in user
//! and the language preference. The core only reads these; writing them is
//! the job of the login flow.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::FALLBACK_USER_ID;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Th,
    Zh,
}

impl Language {
    /// Unrecognised preferences fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "th" => Language::Th,
            "zh" => Language::Zh,
            _ => Language::En,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Language::En => "EN",
            Language::Th => "TH",
            Language::Zh => "ZH",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct SessionDocument {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<SessionUser>,
    #[serde(default)]
    app_lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<SessionUser>,
    language: Language,
}

impl Session {
    /// Read the session document at `path` (a missing file is an empty
    /// session), then apply `GOALSNAP_TOKEN` / `GOALSNAP_LANG` overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no session document at {}", path.display());
                None
            }
            Err(e) => return Err(e.into()),
        };
        let mut session = match raw {
            Some(raw) => Self::parse(&raw)?,
            None => Self::default(),
        };
        if let Ok(token) = std::env::var("GOALSNAP_TOKEN") {
            session.token = Some(token);
        }
        if let Ok(lang) = std::env::var("GOALSNAP_LANG") {
            session.language = Language::from_code(&lang);
        }
        Ok(session)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let doc: SessionDocument = serde_json::from_str(raw)
            .map_err(|e| AppError::Session(format!("malformed session document: {e}")))?;
        Ok(Self {
            token: doc.token.filter(|t| !t.trim().is_empty()),
            user: doc.user,
            language: doc.app_lang.as_deref().map(Language::from_code).unwrap_or_default(),
        })
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()), ..Self::default() }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Bearer credential, or `MissingCredential` when the user is signed out.
    pub fn require_token(&self) -> Result<&str> {
        self.token().ok_or(AppError::MissingCredential)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Local part of the user's e-mail, "User" when unknown.
    pub fn display_name(&self) -> String {
        self.user
            .as_ref()
            .and_then(|u| u.email.as_deref())
            .and_then(|email| email.split('@').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("User")
            .to_string()
    }

    pub fn user_id(&self) -> String {
        self.user
            .as_ref()
            .and_then(|u| u.id.clone().or_else(|| u.email.clone()))
            .unwrap_or_else(|| FALLBACK_USER_ID.to_string())
    }
}
