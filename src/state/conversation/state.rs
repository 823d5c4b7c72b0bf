use crate::api::ApiClient;
use crate::types::ApiContent;
use std::sync::Arc;

/// The backend chat session: history kept client-side and replayed on every call.
pub struct ConversationManager {
    pub(super) client: Arc<ApiClient>,
    pub(super) history: Vec<ApiContent>,
    /// User content of the turn currently streaming; joins `history` on success.
    pub(super) pending_user_content: Option<ApiContent>,
    pub(super) max_history_contents: usize,
}

impl ConversationManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
            history: Vec::new(),
            pending_user_content: None,
            max_history_contents: super::history::resolve_max_history_contents(),
        }
    }

    /// Start over with a session that has no memory of earlier turns.
    pub fn reset(&mut self) {
        self.history.clear();
        self.pending_user_content = None;
        tracing::info!(model = self.client.model(), "chat session reset");
    }

    pub fn history(&self) -> &[ApiContent] {
        &self.history
    }
}
