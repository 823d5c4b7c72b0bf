//! Code extraction from a growing markdown answer.
//!
//! Both functions are pure and are called again on every streamed chunk.

pub const CODE_FENCE_OPEN: &str = "```javascript";
pub const CODE_FENCE: &str = "```";

/// Return the payload of the first `javascript` fenced block in `text`.
///
/// - no opening fence: `""`
/// - opening fence without a closing one: everything after the marker
/// - otherwise: the text between the marker and the *last* fence in the buffer,
///   so stray fences inside explanatory prose end up inside the payload rather
///   than truncating it
pub fn extract_code(text: &str) -> &str {
    let Some(code_start) = text.find(CODE_FENCE_OPEN) else {
        return "";
    };
    let payload_start = code_start + CODE_FENCE_OPEN.len();

    match text[payload_start..].rfind(CODE_FENCE) {
        Some(offset) => &text[payload_start..payload_start + offset],
        None => &text[payload_start..],
    }
}

/// Remove the closed fenced block carrying `code` from `answer`.
///
/// While the block is still open nothing matches and the answer comes back
/// unchanged.
pub fn strip_code_block(answer: &str, code: &str) -> String {
    let block = format!("{CODE_FENCE_OPEN}{code}{CODE_FENCE}");
    answer.replacen(&block, "", 1)
}
