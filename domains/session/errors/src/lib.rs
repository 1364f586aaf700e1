use std::time::Duration;

use thiserror::Error;

/// Failure observed by a synthetic session.
///
/// None of these are fatal: the session records them against the action
/// that produced them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Authentication failed with status {status}")]
    AuthFailed { status: u16 },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Persistent connection closed by peer")]
    ChannelClosed,
    #[error("Persistent connection probe rejected: {0}")]
    ChannelRejected(String),
}

impl SessionError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Stable name used as the `error` field on log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthFailed { .. } => "auth_failed",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::Timeout(_) => "timeout",
            Self::ChannelClosed => "channel_closed",
            Self::ChannelRejected(_) => "channel_rejected",
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self { Self::decode(err) }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown session preset: {0}")]
    UnknownPreset(String),
    #[error("Invalid wait time for {session}: min {min_ms}ms > max {max_ms}ms")]
    InvalidWaitTime {
        session: String,
        min_ms: u64,
        max_ms: u64,
    },
    #[error("Session {0} has no enabled actions")]
    NoActions(String),
    #[error("Session {0} has an empty login path")]
    EmptyLoginPath(String),
    #[error("Session {0} has a zero scenario weight")]
    ZeroScenarioWeight(String),
    #[error("Session {session} has a zero {field} timeout")]
    ZeroTimeout {
        session: String,
        field: &'static str,
    },
    #[error("Failed to read scenario file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse scenario file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_from_serde() {
        let err: SessionError =
            serde_json::from_str::<serde_json::Value>("{not json")
                .unwrap_err()
                .into();

        assert_eq!(err.kind(), "decode");
    }
}
