use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::ApiContent;
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// One scripted backend reaction to a streaming call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// SSE `data:` payloads delivered one per network chunk.
    Events(Vec<String>),
    /// Payloads delivered before the stream itself fails with the message.
    EventsThenError(Vec<String>, String),
    /// Network chunks delivered exactly as given, with no SSE framing added.
    Raw(Vec<String>),
    /// The call is rejected before any chunk arrives.
    Reject(String),
}

#[derive(Clone)]
pub struct MockApiClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<Vec<ApiContent>>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Histories seen by each streaming call, in call order.
    pub fn requests(&self) -> Vec<Vec<ApiContent>> {
        self.requests.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, contents: &[ApiContent]) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(contents.to_vec());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow!("MockApiClient: No more responses configured"));
        }
        let (events, trailing_error) = match responses_guard.remove(0) {
            MockResponse::Events(events) => (events, None),
            MockResponse::EventsThenError(events, error) => (events, Some(error)),
            MockResponse::Raw(chunks) => {
                let byte_chunks: Vec<Result<Bytes>> =
                    chunks.into_iter().map(|s| Ok(Bytes::from(s))).collect();
                return Ok(Box::pin(stream::iter(byte_chunks)));
            }
            MockResponse::Reject(error) => return Err(anyhow!(error)),
        };

        let mut byte_chunks: Vec<Result<Bytes>> = events
            .into_iter()
            .map(|s| Ok(Bytes::from(format!("data: {s}\n\n"))))
            .collect();
        if let Some(error) = trailing_error {
            byte_chunks.push(Err(anyhow!(error)));
        }

        Ok(Box::pin(stream::iter(byte_chunks)))
    }
}

/// Build the `data:` payload of one streamed part.
pub fn part_event(text: &str, thought: bool) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text, "thought": thought }]
            }
        }]
    })
    .to_string()
}
