//! Per-session conversation state.

use std::fmt;

use serde::Serialize;

/// Who produced a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only list of turns. Role alternation is not enforced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Stable identifier of a chat session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the current (or last) turn of a session stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingModel,
    Streaming,
    Done,
    Failed,
}

impl TurnState {
    pub fn label(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingModel => "thinking",
            TurnState::Streaming => "streaming",
            TurnState::Done => "done",
            TurnState::Failed => "failed",
        }
    }

    /// Whether a turn is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, TurnState::AwaitingModel | TurnState::Streaming)
    }
}

/// A chat session: its id, transcript, and turn state.
///
/// The host hands a session to the turn handler by exclusive reference, so
/// a session never has more than one turn in flight.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub transcript: Transcript,
    pub state: TurnState,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            transcript: Transcript::default(),
            state: TurnState::Idle,
        }
    }
}
