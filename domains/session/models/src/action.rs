use std::fmt;

use serde::{Deserialize, Serialize};

/// Repeatable actions a session can be scheduled to perform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    HealthCheck,
    BrowseListing,
    ViewProfile,
    CurrentUser,
    AnonymousListing,
    Keepalive,
    LoginProbe,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::HealthCheck,
        ActionKind::BrowseListing,
        ActionKind::ViewProfile,
        ActionKind::CurrentUser,
        ActionKind::AnonymousListing,
        ActionKind::Keepalive,
        ActionKind::LoginProbe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HealthCheck => "health_check",
            Self::BrowseListing => "browse_listing",
            Self::ViewProfile => "view_profile",
            Self::CurrentUser => "current_user",
            Self::AnonymousListing => "anonymous_listing",
            Self::Keepalive => "keepalive",
            Self::LoginProbe => "login_probe",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
