use session_errors::ConfigError;

use crate::{
    config::SessionConfig,
    presets::{API_USER, BIDDING_USER, FREELANCE_PORTAL},
};

pub const SCENARIOS_VAR: &str = "HUB_SCENARIOS";
pub const SCENARIO_FILE_VAR: &str = "HUB_SCENARIO_FILE";
pub const EMAIL_VAR: &str = "HUB_EMAIL";
pub const PASSWORD_VAR: &str = "HUB_PASSWORD";

/// Session kinds selected for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSettings {
    pub sessions: Vec<SessionConfig>,
}

impl LoadSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    ///
    /// A scenario file replaces the preset list entirely; credential
    /// overrides apply to every session either way.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sessions = match lookup(SCENARIO_FILE_VAR) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Io {
                        path: path.clone(),
                        source,
                    }
                })?;
                Self::parse_sessions(&raw)?
            }
            None => {
                let names = lookup(SCENARIOS_VAR).unwrap_or_else(|| {
                    [FREELANCE_PORTAL, API_USER, BIDDING_USER].join(",")
                });
                names
                    .split(',')
                    .filter(|name| !name.trim().is_empty())
                    .map(SessionConfig::preset)
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let email = lookup(EMAIL_VAR);
        let password = lookup(PASSWORD_VAR);
        for session in &mut sessions {
            if let Some(email) = &email {
                session.credentials.email = email.clone();
            }
            if let Some(password) = &password {
                session.credentials.password = password.clone();
            }
            session.validate()?;
        }

        Ok(Self { sessions })
    }

    pub fn parse_sessions(raw: &str) -> Result<Vec<SessionConfig>, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}
