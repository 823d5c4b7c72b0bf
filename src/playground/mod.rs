//! The playground controller: one chat session, one sandbox, and the phase
//! machine that keeps them consistent.

mod compose;
mod update;

pub use compose::compose_messages;
pub use update::PlaygroundUpdate;

use crate::api::ApiClient;
use crate::sandbox::{Frame, SandboxManager};
use crate::state::reconciler::{finalize_body, PREPARING_MARKER};
use crate::state::{ChunkEffect, ConversationManager, Phase, Role, Session, StreamReconciler};
use crate::templates::{
    startup_suggestion, EMPTY_CODE, NO_CODE_UPDATE, STARTUP_CODE, WELCOME_ASSISTANT_MESSAGE,
    WELCOME_USER_MESSAGE,
};
use crate::types::OutgoingMessage;
use crate::util::parse_error_message;
use anyhow::Result;
use futures::StreamExt;
use tokio::sync::mpsc;

pub type UpdateSender = mpsc::UnboundedSender<PlaygroundUpdate>;
pub type UpdateReceiver = mpsc::UnboundedReceiver<PlaygroundUpdate>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Another send is in flight.
    Rejected,
    /// Nothing to send after trimming.
    Empty,
    Completed,
    /// The backend failed; an error turn was appended.
    Failed,
}

pub struct Playground {
    session: Session,
    conversation: ConversationManager,
    sandbox: SandboxManager,
    updates: Option<UpdateSender>,
    suggestion: String,
}

impl Playground {
    /// Build a playground in its startup state: welcome turns and the startup
    /// sketch loaded into the frame.
    pub fn new(client: ApiClient, frame: Box<dyn Frame>, updates: Option<UpdateSender>) -> Self {
        let mut playground = Self {
            session: Session::new(),
            conversation: ConversationManager::new(client),
            sandbox: SandboxManager::new(frame),
            updates,
            suggestion: startup_suggestion(),
        };

        playground.session.default_code = EMPTY_CODE.to_string();
        playground.append_turn(Role::User, WELCOME_USER_MESSAGE);
        playground.append_turn(Role::Assistant, WELCOME_ASSISTANT_MESSAGE);
        playground.set_code(STARTUP_CODE);
        playground
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn code(&self) -> &str {
        self.session.code()
    }

    pub fn is_running(&self) -> bool {
        self.sandbox.is_running()
    }

    pub fn reload_pending(&self) -> bool {
        self.sandbox.reload_pending()
    }

    pub fn conversation(&self) -> &ConversationManager {
        &self.conversation
    }

    /// Prompt suggested to the user at startup.
    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    /// Send `input` to the model and drive the reply to completion.
    ///
    /// Only one send runs at a time; a send while the phase is not idle changes
    /// nothing. The phase is idle again when this returns, whatever happened.
    pub async fn send(&mut self, input: &str, role: Role) -> SendOutcome {
        if !self.session.phase().is_idle() {
            tracing::debug!(phase = ?self.session.phase(), "send rejected while busy");
            return SendOutcome::Rejected;
        }

        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Empty;
        }

        self.set_phase(Phase::Generating);
        if role == Role::User {
            self.append_turn(Role::User, text);
        }

        let messages = compose_messages(
            text,
            role,
            self.session.code(),
            self.session.code_has_changed(),
        );
        let turn_id = self.append_turn(Role::Assistant, PREPARING_MARKER);
        let mut reconciler = StreamReconciler::new();

        let outcome = match self.stream_reply(turn_id, &messages, &mut reconciler).await {
            Ok(()) => {
                self.conversation.complete_turn(reconciler.answer());
                self.close_turn(turn_id);
                self.apply_reply_code(reconciler.code());
                SendOutcome::Completed
            }
            Err(error) => {
                self.conversation.abandon_turn();
                self.close_turn(turn_id);
                let message = parse_error_message(&error.to_string());
                tracing::warn!(error = %message, "model request failed");
                self.append_turn(Role::Error, message);
                SendOutcome::Failed
            }
        };

        self.session.code_has_changed = false;
        self.set_phase(Phase::Idle);
        outcome
    }

    /// Ask the model to fix the runtime error shown in a `system-ask` turn.
    /// Each offer can be used once.
    pub async fn improve(&mut self, turn_id: usize) -> SendOutcome {
        if !self.session.phase().is_idle() {
            return SendOutcome::Rejected;
        }
        let report = match self.session.turn_mut(turn_id) {
            Some(turn) if turn.role == Role::SystemAsk && turn.improve_pending => {
                turn.improve_pending = false;
                turn.body.clone()
            }
            _ => return SendOutcome::Empty,
        };
        self.emit(PlaygroundUpdate::ImproveConsumed { id: turn_id });
        self.send(&report, Role::System).await
    }

    /// Latest `system-ask` turn whose improve offer is still open.
    pub fn pending_improve(&self) -> Option<usize> {
        self.session
            .turns()
            .iter()
            .rev()
            .find(|turn| turn.role == Role::SystemAsk && turn.improve_pending)
            .map(|turn| turn.id)
    }

    /// Replace the code with a local edit. Never executes; returns false while
    /// a reply is being generated.
    pub fn edit_code(&mut self, code: &str) -> bool {
        if !self.session.phase().is_idle() {
            tracing::debug!("code edit rejected while busy");
            return false;
        }
        self.session.code = code.to_string();
        self.session.code_has_changed = true;
        self.sandbox.mark_reload_pending();
        self.emit(PlaygroundUpdate::CodeChanged(code.to_string()));
        true
    }

    /// Commit `code` and run it. Identical code is left alone.
    pub fn set_code(&mut self, code: &str) {
        if self.session.code == code {
            return;
        }
        self.session.code = code.to_string();
        self.emit(PlaygroundUpdate::CodeChanged(code.to_string()));
        self.execute();
    }

    pub fn reload(&mut self) {
        self.execute();
    }

    pub fn play(&mut self) {
        if self.sandbox.is_running() {
            return;
        }
        if self.sandbox.reload_pending() {
            self.execute();
            return;
        }
        let resumed = self.sandbox.resume();
        self.emit(PlaygroundUpdate::RunningChanged(true));
        if let Err(error) = resumed {
            self.report_runtime_error(&error.to_string());
        }
    }

    pub fn stop(&mut self) {
        match self.sandbox.stop() {
            Ok(true) => self.emit(PlaygroundUpdate::RunningChanged(false)),
            Ok(false) => {}
            Err(error) => {
                self.emit(PlaygroundUpdate::RunningChanged(false));
                self.report_runtime_error(&error.to_string());
            }
        }
    }

    /// Back to the empty sketch with a chat session that remembers nothing.
    pub fn reset(&mut self) {
        let default_code = self.session.default_code.clone();
        self.set_code(&default_code);
        self.session.clear_turns();
        self.emit(PlaygroundUpdate::TurnsCleared);
        self.session.code_has_changed = true;
        self.conversation.reset();
    }

    /// Handle a raw payload posted by the frame.
    pub fn on_frame_message(&mut self, raw: &str) {
        if let Some(message) = SandboxManager::parse_frame_message(raw) {
            self.report_runtime_error(&message);
        }
    }

    async fn stream_reply(
        &mut self,
        turn_id: usize,
        messages: &[OutgoingMessage],
        reconciler: &mut StreamReconciler,
    ) -> Result<()> {
        let mut stream = self.conversation.send_message_stream(messages).await?;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            match reconciler.apply(&chunk) {
                ChunkEffect::Thought { thinking } => {
                    self.set_phase(Phase::Thinking);
                    if let Some(turn) = self.session.turn_mut(turn_id) {
                        turn.thinking = thinking.clone();
                    }
                    self.emit(PlaygroundUpdate::ThinkingChanged {
                        id: turn_id,
                        thinking,
                    });
                }
                ChunkEffect::Answer { explanation, .. } => {
                    self.set_phase(Phase::Coding);
                    self.set_body(turn_id, explanation);
                }
                ChunkEffect::Ignored => {}
            }
            self.emit(PlaygroundUpdate::ScrollToEnd);
        }
        Ok(())
    }

    fn close_turn(&mut self, turn_id: usize) {
        let Some(turn) = self.session.turn_mut(turn_id) else {
            return;
        };
        turn.thinking_open = false;
        let body = finalize_body(&turn.body);
        self.emit(PlaygroundUpdate::ThinkingCollapsed { id: turn_id });
        self.set_body(turn_id, body);
    }

    fn apply_reply_code(&mut self, code: &str) {
        if code.trim().is_empty() {
            self.append_turn(Role::System, NO_CODE_UPDATE);
        } else {
            tracing::info!(bytes = code.len(), "applying generated code");
            self.set_code(code);
        }
    }

    fn execute(&mut self) {
        let code = self.session.code.clone();
        let was_running = self.sandbox.is_running();
        let result = self.sandbox.execute(&code);
        if !was_running {
            self.emit(PlaygroundUpdate::RunningChanged(true));
        }
        if let Err(error) = result {
            self.report_runtime_error(&parse_error_message(&error.to_string()));
        }
    }

    fn report_runtime_error(&mut self, message: &str) {
        if self.sandbox.record_error(message) {
            self.append_turn(Role::SystemAsk, message);
        } else {
            tracing::debug!(error = message, "repeated sketch error suppressed");
        }
    }

    fn set_body(&mut self, turn_id: usize, body: String) {
        let Some(turn) = self.session.turn_mut(turn_id) else {
            return;
        };
        if turn.body == body {
            return;
        }
        turn.body = body.clone();
        self.emit(PlaygroundUpdate::BodyChanged { id: turn_id, body });
    }

    fn set_phase(&mut self, next: Phase) {
        if self.session.set_phase(next) {
            self.emit(PlaygroundUpdate::PhaseChanged(next));
        }
    }

    fn append_turn(&mut self, role: Role, body: impl Into<String>) -> usize {
        let id = self.session.push_turn(role, body);
        if let Some(turn) = self.session.turn(id) {
            let turn = turn.clone();
            self.emit(PlaygroundUpdate::TurnAppended(turn));
        }
        self.emit(PlaygroundUpdate::ScrollToEnd);
        id
    }

    fn emit(&self, update: PlaygroundUpdate) {
        if let Some(tx) = &self.updates {
            let _ = tx.send(update);
        }
    }
}
