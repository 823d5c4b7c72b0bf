use crate::state::{Phase, Turn};

/// A change the front end has to reflect. Emitted after every mutation, in the
/// order the mutations happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaygroundUpdate {
    PhaseChanged(Phase),
    TurnAppended(Turn),
    ThinkingChanged { id: usize, thinking: String },
    BodyChanged { id: usize, body: String },
    ThinkingCollapsed { id: usize },
    /// The improve offer of a `system-ask` turn was used.
    ImproveConsumed { id: usize },
    TurnsCleared,
    CodeChanged(String),
    RunningChanged(bool),
    ScrollToEnd,
}
