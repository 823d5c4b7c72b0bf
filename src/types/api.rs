use serde::{Deserialize, Serialize};

/// One message of the backend conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiContent {
    pub role: String,
    pub parts: Vec<Part>,
}

impl ApiContent {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub contents: &'a [ApiContent],
    pub system_instruction: SystemInstruction,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub include_thoughts: bool,
}

/// One `data:` payload of the streaming response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Incremental unit surfaced to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub is_thought: bool,
    pub content: String,
}

impl StreamChunk {
    pub fn thought(content: impl Into<String>) -> Self {
        Self {
            is_thought: true,
            content: content.into(),
        }
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            is_thought: false,
            content: content.into(),
        }
    }
}

/// A composed role + text pair handed to the chat session for one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub role: String,
    pub text: String,
}

impl OutgoingMessage {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case_keys() {
        let contents = vec![ApiContent::text("user", "draw")];
        let request = GenerateRequest {
            contents: &contents,
            system_instruction: SystemInstruction {
                parts: vec![Part::text("sys")],
            },
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig {
                    include_thoughts: true,
                },
            },
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "draw");
        assert!(value["contents"][0]["parts"][0].get("thought").is_none());
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(
            value["generationConfig"]["thinkingConfig"]["includeThoughts"],
            true
        );
    }

    #[test]
    fn test_stream_response_tolerates_missing_fields() {
        let parsed: StreamResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{}}"#)
                .unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert!(parsed.candidates[0].content.is_none());
        assert!(parsed.error.is_none());
    }
}
