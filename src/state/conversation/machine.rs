use crate::runtime::UiUpdate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shown in place of the assistant turn when a request fails before any text arrived.
pub const FALLBACK_MESSAGE: &str = "Sorry, I couldn't finish answering that. Please try again, \
or ask to be connected with a human support agent if the problem continues.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Request sent, no response yet.
    Submitting,
    Streaming,
    /// Failure recorded; `finalize` returns to `Idle`.
    Failed,
}

/// Identifies one submission. Updates carrying an older id are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// An accepted submission: the message to send and the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub session: SessionId,
    pub message: String,
}

/// Turn list plus the submit/stream/fail lifecycle of the latest assistant turn.
///
/// Only the last turn is ever mutated, and only while its session is current
/// and a request is in flight.
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
    phase: Phase,
    error_banner: Option<String>,
    active_session: Option<SessionId>,
    last_session: u64,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active_session
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Submitting | Phase::Streaming)
    }

    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Starts a new exchange. Blank input or a request already in flight is a no-op.
    pub fn submit(&mut self, input: &str) -> Option<Submission> {
        let message = input.trim();
        if message.is_empty() || !self.can_submit() {
            return None;
        }

        self.last_session += 1;
        let session = SessionId(self.last_session);

        self.error_banner = None;
        self.turns.push(Turn::user(message));
        self.turns.push(Turn::assistant(String::new()));
        self.phase = Phase::Submitting;
        self.active_session = Some(session);
        debug!(session = session.get(), "submission accepted");

        Some(Submission {
            session,
            message: message.to_string(),
        })
    }

    pub fn request_opened(&mut self, session: SessionId) -> bool {
        if !self.is_current(session) || self.phase != Phase::Submitting {
            return false;
        }
        self.phase = Phase::Streaming;
        true
    }

    /// Appends to the in-progress assistant turn; anything stale is discarded.
    pub fn apply_fragment(&mut self, session: SessionId, text: &str) -> bool {
        if !self.is_current(session) || !self.is_loading() {
            return false;
        }
        match self.turns.last_mut() {
            Some(turn) if turn.speaker == Speaker::Assistant => {
                turn.text.push_str(text);
                true
            }
            _ => false,
        }
    }

    pub fn complete(&mut self, session: SessionId) -> bool {
        if !self.is_current(session) || !self.is_loading() {
            return false;
        }
        self.phase = Phase::Idle;
        self.active_session = None;
        true
    }

    /// Records a failure. Partial assistant text is kept as-is, whitespace
    /// included; only an empty turn gets `FALLBACK_MESSAGE`.
    pub fn fail(&mut self, session: SessionId, message: impl Into<String>) -> bool {
        if !self.is_current(session) || !self.is_loading() {
            return false;
        }
        if let Some(turn) = self.turns.last_mut() {
            if turn.speaker == Speaker::Assistant && turn.text.is_empty() {
                turn.text = FALLBACK_MESSAGE.to_string();
            }
        }
        self.error_banner = Some(message.into());
        self.phase = Phase::Failed;
        true
    }

    pub fn finalize(&mut self) -> bool {
        if self.phase != Phase::Failed {
            return false;
        }
        self.phase = Phase::Idle;
        self.active_session = None;
        true
    }

    pub fn dismiss_error(&mut self) {
        self.error_banner = None;
    }

    /// Clears the conversation. A stream still running for the old session
    /// can no longer touch the turn list.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.error_banner = None;
        self.phase = Phase::Idle;
        self.active_session = None;
    }

    /// Applies one update from a request task. Returns false if it was stale.
    pub fn apply(&mut self, update: UiUpdate) -> bool {
        match update {
            UiUpdate::RequestOpened { session } => self.request_opened(session),
            UiUpdate::StreamDelta { session, text } => self.apply_fragment(session, &text),
            UiUpdate::TurnComplete { session } => self.complete(session),
            UiUpdate::Error { session, message } => {
                let failed = self.fail(session, message);
                if failed {
                    self.finalize();
                }
                failed
            }
        }
    }

    fn is_current(&self, session: SessionId) -> bool {
        self.active_session == Some(session)
    }
}
