use crate::state::SessionId;

/// Updates a request task sends to the owner of the conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    RequestOpened { session: SessionId },
    StreamDelta { session: SessionId, text: String },
    TurnComplete { session: SessionId },
    Error { session: SessionId, message: String },
}

impl UiUpdate {
    /// The submission this update belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            Self::RequestOpened { session }
            | Self::StreamDelta { session, .. }
            | Self::TurnComplete { session }
            | Self::Error { session, .. } => *session,
        }
    }
}
