use super::logging::emit_sse_parse_error;
use crate::types::{StreamChunk, StreamResponse};
use anyhow::{bail, Result};

/// Incremental SSE decoder. Bytes are held raw until a whole event has
/// arrived, so neither a UTF-8 sequence nor a CRLF pair can be cut in half by
/// a chunk boundary.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<StreamChunk>> {
        self.buffer.extend_from_slice(chunk);
        let mut chunks = Vec::new();
        let mut start = 0;

        while let Some(len) = event_len(&self.buffer[start..]) {
            let event_end = start + len;
            let event_text = String::from_utf8_lossy(&self.buffer[start..event_end]);
            start = event_end;

            let data = event_text
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n");

            if data.is_empty() || data == "[DONE]" {
                continue;
            }

            match serde_json::from_str::<StreamResponse>(&data) {
                Ok(response) => {
                    if let Some(error) = response.error {
                        bail!("Request failed {}", serde_json::json!({ "error": error }));
                    }
                    for candidate in response.candidates {
                        let Some(content) = candidate.content else {
                            continue;
                        };
                        for part in content.parts {
                            chunks.push(StreamChunk {
                                is_thought: part.thought.unwrap_or(false),
                                content: part.text.unwrap_or_default(),
                            });
                        }
                    }
                }
                Err(e) => emit_sse_parse_error(&data, &e),
            }
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(chunks)
    }

    /// Decode whatever is left once the body has ended. A last event may
    /// arrive without its blank-line terminator.
    pub fn finish(&mut self) -> Result<Vec<StreamChunk>> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.buffer.clear();
            return Ok(Vec::new());
        }
        let chunks = self.process(b"\n\n");
        self.buffer.clear();
        chunks
    }
}

/// Length of the first complete event in `buffer`, blank line included.
/// Lines end with `\n`; a `\r` before it is ignored.
fn event_len(buffer: &[u8]) -> Option<usize> {
    let mut line_start = 0;
    while let Some(offset) = buffer[line_start..].iter().position(|&b| b == b'\n') {
        let line_end = line_start + offset;
        if matches!(&buffer[line_start..line_end], b"" | b"\r") {
            return Some(line_end + 1);
        }
        line_start = line_end + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thought_flag_defaults_to_false() {
        let mut parser = StreamParser::new();
        let chunks = parser
            .process(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"hi\"}]}}]}\n\n")
            .unwrap();
        assert_eq!(chunks, vec![StreamChunk::answer("hi")]);
        assert!(parser.finish().unwrap().is_empty());
    }

    #[test]
    fn test_crlf_framing_is_accepted() {
        let mut parser = StreamParser::new();
        let chunks = parser
            .process(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"x\",\"thought\":true}]}}]}\r\n\r\n")
            .unwrap();
        assert_eq!(chunks, vec![StreamChunk::thought("x")]);
    }

    #[test]
    fn test_error_payload_fails_the_stream() {
        let mut parser = StreamParser::new();
        let err = parser
            .process(b"data: {\"error\":{\"code\":429,\"message\":\"quota exceeded\"}}\n\n")
            .expect_err("error payload must fail");
        assert_eq!(
            crate::util::parse_error_message(&err.to_string()),
            "quota exceeded"
        );
    }

    #[test]
    fn test_event_len_accepts_lf_and_crlf_blank_lines() {
        assert_eq!(event_len(b"data: a\n\nrest"), Some(9));
        assert_eq!(event_len(b"data: a\r\n\r\nrest"), Some(11));
        assert_eq!(event_len(b"data: a\r\n\r"), None);
        assert_eq!(event_len(b"data: a\n"), None);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks_survives() {
        let mut parser = StreamParser::new();
        let event = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Here's the code! 🎨\"}]}}]}\n\n";
        let bytes = event.as_bytes();
        let split = event.find('🎨').unwrap() + 2;

        assert!(parser.process(&bytes[..split]).unwrap().is_empty());
        let chunks = parser.process(&bytes[split..]).unwrap();
        assert_eq!(chunks, vec![StreamChunk::answer("Here's the code! 🎨")]);
    }

    #[test]
    fn test_finish_decodes_unterminated_last_event() {
        let mut parser = StreamParser::new();
        assert!(parser
            .process(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"tail\"}]}}]}")
            .unwrap()
            .is_empty());
        assert_eq!(parser.finish().unwrap(), vec![StreamChunk::answer("tail")]);
        assert!(parser.finish().unwrap().is_empty());
    }
}
