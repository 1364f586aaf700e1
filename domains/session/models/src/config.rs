use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use session_errors::ConfigError;

use crate::{action::ActionKind, identity::LoginShape};

/// Everything that distinguishes one kind of synthetic user from another.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub name: String,
    /// Relative share of users assigned to this session kind.
    pub scenario_weight: usize,
    pub wait_time: WaitTime,
    pub credentials: Credentials,
    pub login: LoginConfig,
    pub endpoints: Endpoints,
    /// Ordered profile URL templates; `{id}` is replaced by the user id.
    pub profile_candidates: Vec<String>,
    pub weights: TaskWeights,
    pub timeouts: Timeouts,
    pub keepalive: KeepaliveConfig,
}

impl Default for SessionConfig {
    fn default() -> Self { Self::freelance_portal() }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wait_time.min_ms > self.wait_time.max_ms {
            return Err(ConfigError::InvalidWaitTime {
                session: self.name.clone(),
                min_ms: self.wait_time.min_ms,
                max_ms: self.wait_time.max_ms,
            });
        }
        if self.weights.enabled().is_empty() {
            return Err(ConfigError::NoActions(self.name.clone()));
        }
        if self.login.path.trim().is_empty() {
            return Err(ConfigError::EmptyLoginPath(self.name.clone()));
        }
        if self.scenario_weight == 0 {
            return Err(ConfigError::ZeroScenarioWeight(self.name.clone()));
        }
        if let Some(field) = self.timeouts.first_zero() {
            return Err(ConfigError::ZeroTimeout {
                session: self.name.clone(),
                field,
            });
        }
        Ok(())
    }

    /// Expand the profile templates for the given user id, skipping any
    /// template that needs an id when none is known.
    pub fn profile_urls(&self, user_id: Option<&str>) -> Vec<String> {
        self.profile_candidates
            .iter()
            .filter_map(|template| {
                match (template.contains("{id}"), user_id) {
                    (false, _) => Some(template.clone()),
                    (true, Some(id)) => Some(template.replace("{id}", id)),
                    (true, None) => None,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitTime {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl WaitTime {
    pub fn between_secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 1000,
            max_ms: max * 1000,
        }
    }

    pub fn min(&self) -> Duration { Duration::from_millis(self.min_ms) }

    pub fn max(&self) -> Duration { Duration::from_millis(self.max_ms) }
}

impl Default for WaitTime {
    fn default() -> Self { Self::between_secs(1, 3) }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "free@gmail.com".into(),
            password: "test@123".into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub path: String,
    pub shape: LoginShape,
    pub token_prefix: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            path: default_login_path(),
            shape: LoginShape::UserId,
            token_prefix: default_token_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub health: String,
    pub listing: String,
    pub current_user: String,
    /// WebSocket path; only connection-oriented sessions set it.
    pub channel: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            health: "/api/health".into(),
            listing: "/api/projects/open".into(),
            current_user: "/api/auth/me".into(),
            channel: None,
        }
    }
}

/// Relative selection weight per action; zero leaves the action out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskWeights {
    pub health_check: usize,
    pub browse_listing: usize,
    pub view_profile: usize,
    pub current_user: usize,
    pub anonymous_listing: usize,
    pub keepalive: usize,
    pub login_probe: usize,
}

impl TaskWeights {
    pub fn weight(&self, action: ActionKind) -> usize {
        match action {
            ActionKind::HealthCheck => self.health_check,
            ActionKind::BrowseListing => self.browse_listing,
            ActionKind::ViewProfile => self.view_profile,
            ActionKind::CurrentUser => self.current_user,
            ActionKind::AnonymousListing => self.anonymous_listing,
            ActionKind::Keepalive => self.keepalive,
            ActionKind::LoginProbe => self.login_probe,
        }
    }

    pub fn enabled(&self) -> Vec<(ActionKind, usize)> {
        ActionKind::ALL
            .into_iter()
            .map(|action| (action, self.weight(action)))
            .filter(|(_, weight)| *weight > 0)
            .collect()
    }
}

/// Per-call timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub login_secs: u64,
    pub health_secs: u64,
    pub browse_secs: u64,
    pub profile_secs: u64,
    pub current_user_secs: u64,
    pub anonymous_secs: u64,
    pub channel_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login_secs: 10,
            health_secs: 5,
            browse_secs: 15,
            profile_secs: 10,
            current_user_secs: 10,
            anonymous_secs: 10,
            channel_secs: 10,
        }
    }
}

impl Timeouts {
    fn first_zero(&self) -> Option<&'static str> {
        [
            ("login", self.login_secs),
            ("health", self.health_secs),
            ("browse", self.browse_secs),
            ("profile", self.profile_secs),
            ("current_user", self.current_user_secs),
            ("anonymous", self.anonymous_secs),
            ("channel", self.channel_secs),
        ]
        .into_iter()
        .find_map(|(field, secs)| (secs == 0).then_some(field))
    }

    pub fn login(&self) -> Duration { Duration::from_secs(self.login_secs) }

    pub fn channel(&self) -> Duration {
        Duration::from_secs(self.channel_secs)
    }

    pub fn for_action(&self, action: ActionKind) -> Duration {
        let secs = match action {
            ActionKind::HealthCheck => self.health_secs,
            ActionKind::BrowseListing => self.browse_secs,
            ActionKind::ViewProfile => self.profile_secs,
            ActionKind::CurrentUser => self.current_user_secs,
            ActionKind::AnonymousListing => self.anonymous_secs,
            ActionKind::Keepalive => self.channel_secs,
            ActionKind::LoginProbe => self.login_secs,
        };
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    pub pause_ms: u64,
    pub probe_event: String,
    pub ping_event: String,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            pause_ms: 1000,
            probe_event: "connection_test".into(),
            ping_event: "ping".into(),
        }
    }
}

impl KeepaliveConfig {
    pub fn pause(&self) -> Duration { Duration::from_millis(self.pause_ms) }
}

fn default_login_path() -> String { "/api/auth/login".into() }
fn default_token_prefix() -> String { "fake-token-".into() }

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_profile_urls_substitute_id() {
        let config = SessionConfig::freelance_portal();

        assert_eq!(config.profile_urls(Some("42")), vec![
            "/api/profile/freelancer/42".to_string(),
            "/api/profile/freelancer".to_string(),
            "/api/profile/42".to_string(),
        ]);
    }

    #[test]
    fn test_profile_urls_skip_id_templates_without_id() {
        let config = SessionConfig::freelance_portal();

        assert_eq!(config.profile_urls(None), vec![
            "/api/profile/freelancer".to_string()
        ]);
    }

    #[test]
    fn test_partial_weights_override_whole_table() {
        let config: SessionConfig = serde_json::from_value(json!({
            "name": "custom",
            "weights": {"health_check": 2}
        }))
        .unwrap();

        assert_eq!(config.weights.enabled(), vec![(
            ActionKind::HealthCheck,
            2
        )]);
        assert_eq!(config.login.shape, LoginShape::UserId);
    }

    #[test]
    fn test_validate_rejects_inverted_wait_time() {
        let mut config = SessionConfig::api_user();
        config.wait_time = WaitTime {
            min_ms: 5000,
            max_ms: 1000,
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWaitTime { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_no_actions() {
        let mut config = SessionConfig::api_user();
        config.weights = TaskWeights::default();

        assert!(matches!(config.validate(), Err(ConfigError::NoActions(_))));
    }

    #[test]
    fn test_validate_rejects_zero_scenario_weight() {
        let config: SessionConfig = serde_json::from_value(json!({
            "name": "idle",
            "scenario_weight": 0
        }))
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroScenarioWeight(name)) if name == "idle"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config: SessionConfig = serde_json::from_value(json!({
            "name": "impatient",
            "timeouts": {"browse_secs": 0}
        }))
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTimeout { field: "browse", .. })
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::default());

        assert!(rendered.contains("free@gmail.com"));
        assert!(!rendered.contains("test@123"));
    }
}
