use super::history::{compose_user_content, MODEL_ROLE};
use super::streaming::{chunk_stream, ChunkStream};
use super::ConversationManager;
use crate::types::{ApiContent, OutgoingMessage};
use anyhow::Result;

impl ConversationManager {
    /// Open the streaming call for one send.
    ///
    /// The composed user content is held back until [`complete_turn`] so a
    /// failed turn leaves the history as it was.
    ///
    /// [`complete_turn`]: ConversationManager::complete_turn
    pub async fn send_message_stream(
        &mut self,
        messages: &[OutgoingMessage],
    ) -> Result<ChunkStream> {
        let user_content = compose_user_content(messages);
        tracing::debug!(
            roles = ?messages.iter().map(|m| m.role.as_str()).collect::<Vec<_>>(),
            history = self.history.len(),
            "sending message"
        );

        let mut contents = self.history.clone();
        contents.push(user_content.clone());
        self.pending_user_content = None;

        let bytes = self.client.create_stream(&contents).await?;
        self.pending_user_content = Some(user_content);
        Ok(chunk_stream(bytes))
    }

    /// Record the finished turn: the pending user content and the model's answer.
    pub fn complete_turn(&mut self, answer: &str) {
        let Some(user_content) = self.pending_user_content.take() else {
            return;
        };
        self.history.push(user_content);
        if !answer.is_empty() {
            self.history.push(ApiContent::text(MODEL_ROLE, answer));
        }
        self.prune_history();
    }

    /// Drop the in-flight turn without touching history.
    pub fn abandon_turn(&mut self) {
        self.pending_user_content = None;
    }
}
