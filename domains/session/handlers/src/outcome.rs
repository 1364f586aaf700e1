use session_errors::SessionError;
use session_models::ActionKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Success status, or a frame came back over the channel.
    Succeeded { status: Option<u16> },
    /// The target answered, but not with success.
    Rejected { status: u16 },
    Failed(SessionError),
    Skipped { reason: &'static str },
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            Self::Succeeded {
                status: Some(status),
            }
        }
        else {
            Self::Rejected { status }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Rejected { .. } => "rejected",
            Self::Failed(_) => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Succeeded { status } => *status,
            Self::Rejected { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool { matches!(self, Self::Succeeded { .. }) }
}

/// What one invocation of a repeatable action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub action: ActionKind,
    /// Requests or frames actually issued.
    pub requests: usize,
    pub outcome: Outcome,
    /// Profile URL the probe settled on, if any.
    pub resolved: Option<String>,
}

impl ActionReport {
    pub fn new(action: ActionKind, requests: usize, outcome: Outcome) -> Self {
        Self {
            action,
            requests,
            outcome,
            resolved: None,
        }
    }

    pub fn skipped(action: ActionKind, reason: &'static str) -> Self {
        Self::new(action, 0, Outcome::Skipped { reason })
    }

    pub fn with_resolved(mut self, path: String) -> Self {
        self.resolved = Some(path);
        self
    }
}
