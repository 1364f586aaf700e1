use session_errors::ConfigError;

use crate::{
    config::{
        Credentials, Endpoints, KeepaliveConfig, LoginConfig, SessionConfig,
        TaskWeights, Timeouts, WaitTime,
    },
    identity::LoginShape,
};

pub const FREELANCE_PORTAL: &str = "freelance-portal";
pub const API_USER: &str = "api-user";
pub const BIDDING_USER: &str = "bidding-user";
pub const LOGIN_SMOKE: &str = "login-smoke";

pub const PRESET_NAMES: [&str; 4] =
    [FREELANCE_PORTAL, API_USER, BIDDING_USER, LOGIN_SMOKE];

impl SessionConfig {
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim() {
            FREELANCE_PORTAL => Ok(Self::freelance_portal()),
            API_USER => Ok(Self::api_user()),
            BIDDING_USER => Ok(Self::bidding_user()),
            LOGIN_SMOKE => Ok(Self::login_smoke()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    /// Freelancer browsing the portal; login returns the user record.
    pub fn freelance_portal() -> Self {
        Self {
            name: FREELANCE_PORTAL.into(),
            scenario_weight: 5,
            wait_time: WaitTime::between_secs(2, 4),
            credentials: Credentials::default(),
            login: LoginConfig::default(),
            endpoints: Endpoints::default(),
            profile_candidates: vec![
                "/api/profile/freelancer/{id}".into(),
                "/api/profile/freelancer".into(),
                "/api/profile/{id}".into(),
            ],
            weights: TaskWeights {
                health_check: 10,
                browse_listing: 8,
                view_profile: 6,
                current_user: 5,
                anonymous_listing: 3,
                ..TaskWeights::default()
            },
            timeouts: Timeouts::default(),
            keepalive: KeepaliveConfig::default(),
        }
    }

    /// API client expecting a bearer token in the login response.
    pub fn api_user() -> Self {
        Self {
            name: API_USER.into(),
            scenario_weight: 5,
            wait_time: WaitTime::between_secs(1, 3),
            login: token_login(),
            endpoints: Endpoints {
                listing: "/api/projects".into(),
                ..Endpoints::default()
            },
            profile_candidates: vec!["/api/profile".into()],
            weights: TaskWeights {
                health_check: 1,
                browse_listing: 3,
                view_profile: 2,
                ..TaskWeights::default()
            },
            timeouts: uniform_timeouts(10),
            ..Self::freelance_portal()
        }
    }

    /// Bidder holding a WebSocket open and pinging it.
    pub fn bidding_user() -> Self {
        Self {
            name: BIDDING_USER.into(),
            scenario_weight: 3,
            wait_time: WaitTime::between_secs(2, 5),
            login: token_login(),
            endpoints: Endpoints {
                channel: Some("/socket.io/?EIO=4&transport=websocket".into()),
                ..Endpoints::default()
            },
            profile_candidates: Vec::new(),
            weights: TaskWeights {
                keepalive: 1,
                ..TaskWeights::default()
            },
            timeouts: uniform_timeouts(10),
            ..Self::freelance_portal()
        }
    }

    /// Login-heavy smoke load with no session-dependent traffic.
    pub fn login_smoke() -> Self {
        Self {
            name: LOGIN_SMOKE.into(),
            scenario_weight: 1,
            wait_time: WaitTime::between_secs(1, 3),
            profile_candidates: Vec::new(),
            weights: TaskWeights {
                login_probe: 5,
                health_check: 3,
                anonymous_listing: 2,
                ..TaskWeights::default()
            },
            timeouts: uniform_timeouts(10),
            ..Self::freelance_portal()
        }
    }
}

fn token_login() -> LoginConfig {
    LoginConfig {
        shape: LoginShape::Token,
        ..LoginConfig::default()
    }
}

fn uniform_timeouts(secs: u64) -> Timeouts {
    Timeouts {
        login_secs: secs,
        health_secs: secs,
        browse_secs: secs,
        profile_secs: secs,
        current_user_secs: secs,
        anonymous_secs: secs,
        channel_secs: secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    #[test]
    fn test_freelance_portal_weights() {
        let weights = SessionConfig::freelance_portal().weights.enabled();

        assert_eq!(weights, vec![
            (ActionKind::HealthCheck, 10),
            (ActionKind::BrowseListing, 8),
            (ActionKind::ViewProfile, 6),
            (ActionKind::CurrentUser, 5),
            (ActionKind::AnonymousListing, 3),
        ]);
    }

    #[test]
    fn test_api_user_weights_and_shape() {
        let config = SessionConfig::api_user();

        assert_eq!(config.login.shape, LoginShape::Token);
        assert_eq!(config.weights.enabled(), vec![
            (ActionKind::HealthCheck, 1),
            (ActionKind::BrowseListing, 3),
            (ActionKind::ViewProfile, 2),
        ]);
        assert_eq!(config.endpoints.listing, "/api/projects");
        assert!(config.endpoints.channel.is_none());
    }

    #[test]
    fn test_bidding_user_only_keeps_connection_alive() {
        let config = SessionConfig::bidding_user();

        assert_eq!(config.weights.enabled(), vec![(ActionKind::Keepalive, 1)]);
        assert!(config.endpoints.channel.is_some());
    }

    #[test]
    fn test_every_preset_is_valid() {
        for name in PRESET_NAMES {
            let config = SessionConfig::preset(name).unwrap();
            assert_eq!(config.name, name);
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(
            SessionConfig::preset("nope"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_freelance_portal_timeouts() {
        let timeouts = SessionConfig::freelance_portal().timeouts;

        assert_eq!(
            timeouts.for_action(ActionKind::BrowseListing).as_secs(),
            15
        );
        assert_eq!(timeouts.for_action(ActionKind::HealthCheck).as_secs(), 5);
        assert_eq!(timeouts.login().as_secs(), 10);
    }
}
