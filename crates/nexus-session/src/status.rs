use serde::{Deserialize, Serialize};

/// Status of a streaming session, as exposed to the presentation layer.
///
/// Transitions are monotonic along
/// `Idle → Submitted → Streaming → {Ready, Error}`; the reset back to
/// `Idle` happens implicitly on the next submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No request in flight; ready for a first submission.
    Idle,
    /// Request dispatched, no chunk received yet.
    Submitted,
    /// At least one chunk received; more may follow.
    Streaming,
    /// Finished gracefully (completion or cancellation).
    Ready,
    /// Finished with a failure; carries a display message on the session.
    Error,
}

impl SessionStatus {
    /// Whether a request is currently in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Submitted | Self::Streaming)
    }

    /// Whether a new submission is accepted from this status.
    pub fn accepts_submission(self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Submitted => "submitted",
            Self::Streaming => "streaming",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states() {
        assert!(SessionStatus::Submitted.is_active());
        assert!(SessionStatus::Streaming.is_active());
        assert!(!SessionStatus::Idle.is_active());
        assert!(!SessionStatus::Ready.is_active());
        assert!(!SessionStatus::Error.is_active());
    }

    #[test]
    fn submission_gate() {
        assert!(SessionStatus::Idle.accepts_submission());
        assert!(SessionStatus::Ready.accepts_submission());
        assert!(SessionStatus::Error.accepts_submission());
        assert!(!SessionStatus::Streaming.accepts_submission());
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(SessionStatus::Streaming.to_string(), "streaming");
        assert_eq!(
            serde_json::to_string(&SessionStatus::Submitted).unwrap(),
            "\"submitted\""
        );
    }
}
