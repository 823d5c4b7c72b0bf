use super::ConversationManager;
use crate::types::{ApiContent, OutgoingMessage, Part};

const DEFAULT_MAX_HISTORY_CONTENTS: usize = 40;
const MIN_HISTORY_CONTENTS: usize = 2;
const MAX_HISTORY_ENV: &str = "SKETCH_MAX_HISTORY";

pub(super) const USER_ROLE: &str = "user";
pub(super) const MODEL_ROLE: &str = "model";

pub(super) fn resolve_max_history_contents() -> usize {
    std::env::var(MAX_HISTORY_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .map(|v| v.max(MIN_HISTORY_CONTENTS))
        .unwrap_or(DEFAULT_MAX_HISTORY_CONTENTS)
}

/// All messages of one send travel as the parts of a single user content.
pub(super) fn compose_user_content(messages: &[OutgoingMessage]) -> ApiContent {
    ApiContent {
        role: USER_ROLE.to_string(),
        parts: messages
            .iter()
            .map(|message| Part::text(message.text.clone()))
            .collect(),
    }
}

impl ConversationManager {
    pub(super) fn prune_history(&mut self) {
        let len = self.history.len();
        if len <= self.max_history_contents {
            return;
        }

        let mut keep_start = len - self.max_history_contents;
        // History must open with a user content.
        while keep_start < len && self.history[keep_start].role != USER_ROLE {
            keep_start += 1;
        }

        self.history.drain(0..keep_start);
    }
}
