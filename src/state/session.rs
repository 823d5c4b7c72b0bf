use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the chat session. Cyclic, starts and ends every send at `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Thinking,
    Coding,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Generating => "Generating...",
            Phase::Thinking => "Thinking...",
            Phase::Coding => "Coding...",
        }
    }

    pub fn is_idle(self) -> bool {
        self == Phase::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Assistant,
    /// Informational turn produced by the playground itself.
    System,
    /// A sandbox runtime error offering an "improve" follow-up.
    SystemAsk,
    Error,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::SystemAsk => "system-ask",
            Role::Error => "error",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: usize,
    pub role: Role,
    /// Reasoning text; hidden while empty.
    pub thinking: String,
    pub thinking_open: bool,
    pub body: String,
    /// Set on `SystemAsk` turns until the improve offer is used.
    pub improve_pending: bool,
}

impl Turn {
    pub fn thinking_visible(&self) -> bool {
        !self.thinking.is_empty()
    }
}

/// One conversation as the playground sees it.
#[derive(Debug, Clone)]
pub struct Session {
    turns: Vec<Turn>,
    next_turn_id: usize,
    phase: Phase,
    pub(crate) code: String,
    pub(crate) default_code: String,
    /// The code differs from what the model last saw.
    pub(crate) code_has_changed: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            turns: Vec::new(),
            next_turn_id: 0,
            phase: Phase::Idle,
            code: String::new(),
            default_code: String::new(),
            code_has_changed: true,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `next`, returning whether the phase actually changed.
    pub(crate) fn set_phase(&mut self, next: Phase) -> bool {
        if self.phase == next {
            return false;
        }
        tracing::debug!(from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
        true
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn(&self, id: usize) -> Option<&Turn> {
        self.turns.iter().find(|turn| turn.id == id)
    }

    pub(crate) fn turn_mut(&mut self, id: usize) -> Option<&mut Turn> {
        self.turns.iter_mut().find(|turn| turn.id == id)
    }

    pub(crate) fn push_turn(&mut self, role: Role, body: impl Into<String>) -> usize {
        let id = self.next_turn_id;
        self.next_turn_id += 1;
        self.turns.push(Turn {
            id,
            role,
            thinking: String::new(),
            thinking_open: true,
            body: body.into(),
            improve_pending: role == Role::SystemAsk,
        });
        id
    }

    pub(crate) fn clear_turns(&mut self) {
        self.turns.clear();
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn default_code(&self) -> &str {
        &self.default_code
    }

    pub fn code_has_changed(&self) -> bool {
        self.code_has_changed
    }
}
