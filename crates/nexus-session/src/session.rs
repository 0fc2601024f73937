use crate::cancel::SessionCancellationToken;
use crate::status::SessionStatus;
use nexus_protocol::UiMessage;
use thiserror::Error;

/// Errors produced by illegal session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Submission with empty (or whitespace-only) input; a no-op.
    #[error("submission rejected: input is empty")]
    EmptyInput,

    /// Submission while a session is already in flight.
    #[error("submission rejected: a session is already active")]
    AlreadyActive,

    /// Stream operation while no session is in flight.
    #[error("no active session (status: {0})")]
    NotActive(SessionStatus),
}

/// One request/stream cycle initiated by a single submission.
///
/// Holds the accumulated partial output, the current [`SessionStatus`], and
/// the cancellation token for the underlying transport. Exactly one session
/// may be active per conversational surface; the submit guard enforces it.
#[derive(Debug)]
pub struct StreamSession {
    status: SessionStatus,
    buffer: String,
    error: Option<String>,
    cancel: SessionCancellationToken,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            buffer: String::new(),
            error: None,
            cancel: SessionCancellationToken::new(),
        }
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Accumulated output so far. Preserved across error and cancellation.
    pub fn output(&self) -> &str {
        &self.buffer
    }

    /// Display message of the last failure, if the session is in `Error`.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Token for the in-flight transport. Fresh per submission.
    pub fn cancellation_token(&self) -> SessionCancellationToken {
        self.cancel.clone()
    }

    /// Whether a request is in flight.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Begin a new session for `input`.
    ///
    /// Rejected while a session is active, and for empty input (in which
    /// case nothing changes and no request must be dispatched). From `Ready`
    /// or `Error` the session implicitly resets: buffer and error are
    /// cleared and a fresh cancellation token is issued; re-submission
    /// after cancellation starts a brand-new session, never a resumption.
    pub fn submit(&mut self, input: &str) -> Result<(), SessionError> {
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.status.is_active() {
            return Err(SessionError::AlreadyActive);
        }
        self.buffer.clear();
        self.error = None;
        self.cancel = SessionCancellationToken::new();
        self.status = SessionStatus::Submitted;
        Ok(())
    }

    /// Record one arrived chunk, appending it to the output buffer.
    ///
    /// The first chunk moves `Submitted → Streaming`; later chunks keep
    /// `Streaming`. Chunks are applied in arrival order, sequentially.
    pub fn append_chunk(&mut self, delta: &str) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Submitted => self.status = SessionStatus::Streaming,
            SessionStatus::Streaming => {}
            other => return Err(SessionError::NotActive(other)),
        }
        self.buffer.push_str(delta);
        Ok(())
    }

    /// Graceful completion: `Submitted|Streaming → Ready`.
    pub fn complete(&mut self) -> Result<(), SessionError> {
        if !self.status.is_active() {
            return Err(SessionError::NotActive(self.status));
        }
        self.status = SessionStatus::Ready;
        Ok(())
    }

    /// Failure: `Submitted|Streaming → Error`, keeping accumulated output.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        if !self.status.is_active() {
            return Err(SessionError::NotActive(self.status));
        }
        self.error = Some(message.into());
        self.status = SessionStatus::Error;
        Ok(())
    }

    /// Cancel the in-flight session: signal the transport, stop consuming
    /// further chunks, land on `Ready` with the output kept.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if !self.status.is_active() {
            return Err(SessionError::NotActive(self.status));
        }
        self.cancel.cancel();
        self.status = SessionStatus::Ready;
        Ok(())
    }
}

/// Append-only, session-scoped message list.
///
/// Only the single active session (or a user submission) ever appends;
/// finalized messages are immutable.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<UiMessage>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized message.
    pub fn append(&mut self, message: UiMessage) {
        self.messages.push(message);
    }

    /// All messages, in append order.
    pub fn messages(&self) -> &[UiMessage] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Last appended message.
    pub fn last(&self) -> Option<&UiMessage> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let mut s = StreamSession::new();
        assert_eq!(s.status(), SessionStatus::Idle);

        s.submit("Hello").unwrap();
        assert_eq!(s.status(), SessionStatus::Submitted);

        s.append_chunk("Hi ").unwrap();
        assert_eq!(s.status(), SessionStatus::Streaming);
        s.append_chunk("there").unwrap();

        s.complete().unwrap();
        assert_eq!(s.status(), SessionStatus::Ready);
        assert_eq!(s.output(), "Hi there");
    }

    #[test]
    fn output_is_ordered_concatenation_of_chunks() {
        let chunks = ["alpha ", "beta ", "gamma", "", " delta"];
        let mut s = StreamSession::new();
        s.submit("go").unwrap();
        for c in chunks {
            s.append_chunk(c).unwrap();
        }
        assert_eq!(s.output(), chunks.concat());
    }

    #[test]
    fn empty_submit_is_noop() {
        let mut s = StreamSession::new();
        assert_eq!(s.submit("   "), Err(SessionError::EmptyInput));
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.submit(""), Err(SessionError::EmptyInput));
    }

    #[test]
    fn submit_while_active_is_rejected() {
        let mut s = StreamSession::new();
        s.submit("one").unwrap();
        assert_eq!(s.submit("two"), Err(SessionError::AlreadyActive));
        s.append_chunk("x").unwrap();
        assert_eq!(s.submit("three"), Err(SessionError::AlreadyActive));
    }

    #[test]
    fn cancel_during_streaming_keeps_output() {
        let mut s = StreamSession::new();
        s.submit("go").unwrap();
        s.append_chunk("partial out").unwrap();
        let token = s.cancellation_token();

        s.cancel().unwrap();
        assert_eq!(s.status(), SessionStatus::Ready);
        assert_eq!(s.output(), "partial out");
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_from_submitted_is_legal() {
        let mut s = StreamSession::new();
        s.submit("go").unwrap();
        s.cancel().unwrap();
        assert_eq!(s.status(), SessionStatus::Ready);
        assert_eq!(s.output(), "");
    }

    #[test]
    fn cancel_when_not_active_is_rejected() {
        let mut s = StreamSession::new();
        assert!(matches!(s.cancel(), Err(SessionError::NotActive(_))));
        s.submit("go").unwrap();
        s.complete().unwrap();
        assert!(matches!(s.cancel(), Err(SessionError::NotActive(_))));
    }

    #[test]
    fn error_preserves_partial_output() {
        let mut s = StreamSession::new();
        s.submit("go").unwrap();
        s.append_chunk("kept").unwrap();
        s.fail("connection reset").unwrap();
        assert_eq!(s.status(), SessionStatus::Error);
        assert_eq!(s.output(), "kept");
        assert_eq!(s.error_message(), Some("connection reset"));
    }

    #[test]
    fn resubmission_after_cancel_is_a_fresh_session() {
        let mut s = StreamSession::new();
        s.submit("first").unwrap();
        s.append_chunk("old").unwrap();
        let old_token = s.cancellation_token();
        s.cancel().unwrap();

        s.submit("second").unwrap();
        assert_eq!(s.status(), SessionStatus::Submitted);
        assert_eq!(s.output(), "");
        assert!(s.error_message().is_none());
        assert!(!s.cancellation_token().is_cancelled());
        assert!(old_token.is_cancelled());
    }

    #[test]
    fn chunks_after_completion_are_rejected() {
        let mut s = StreamSession::new();
        s.submit("go").unwrap();
        s.complete().unwrap();
        assert!(matches!(
            s.append_chunk("late"),
            Err(SessionError::NotActive(SessionStatus::Ready))
        ));
        assert_eq!(s.output(), "");
    }

    #[test]
    fn message_log_is_append_only() {
        let mut log = MessageLog::new();
        assert!(log.is_empty());
        log.append(UiMessage::user("u1", "hi"));
        log.append(UiMessage::assistant("a1"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().id, "a1");
        assert_eq!(log.messages()[0].text_content(), "hi");
    }
}
