use crate::extract::{extract_code, strip_code_block};
use crate::types::StreamChunk;

pub const PREPARING_MARKER: &str = "⏳ Preparing...";
pub const DONE_MARKER: &str = "✅ Done";
const PENDING_GLYPH: char = '⏳';

/// What one chunk changed in the visible turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEffect {
    /// The thought buffer grew; only the thinking region needs a re-render.
    Thought { thinking: String },
    /// The answer buffer grew; code and explanation were recomputed.
    Answer { code: String, explanation: String },
    /// Empty answer content, nothing to show.
    Ignored,
}

/// Accumulates the thought and answer buffers of one assistant turn.
#[derive(Debug, Default)]
pub struct StreamReconciler {
    thought: String,
    answer: String,
}

impl StreamReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, chunk: &StreamChunk) -> ChunkEffect {
        if chunk.is_thought {
            self.thought.push_str(&chunk.content);
            return ChunkEffect::Thought {
                thinking: self.thought.clone(),
            };
        }

        if chunk.content.is_empty() {
            return ChunkEffect::Ignored;
        }

        self.answer.push_str(&chunk.content);
        ChunkEffect::Answer {
            code: self.code().to_string(),
            explanation: self.explanation(),
        }
    }

    pub fn thought(&self) -> &str {
        &self.thought
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn code(&self) -> &str {
        extract_code(&self.answer)
    }

    /// The answer with the closed code block cut out.
    pub fn explanation(&self) -> String {
        strip_code_block(&self.answer, self.code())
    }
}

/// Body shown once the stream is over: bare-code answers and answers that never
/// replaced the placeholder collapse to the done marker.
pub fn finalize_body(body: &str) -> String {
    if body.trim().is_empty() || body.contains(PENDING_GLYPH) {
        DONE_MARKER.to_string()
    } else {
        body.to_string()
    }
}
