use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::types::{
    ApiContent, GenerateRequest, GenerationConfig, Part, SystemInstruction, ThinkingConfig,
};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

pub(crate) const SYSTEM_PROMPT: &str = "You are a highly skilled creative-coding assistant: you can code effects, games, generative art and audio visualizations.\n\
Write javascript code and assume it runs in a live p5js environment.\n\
Both p5.js and p5.sound are available, so sound functions such as FFT, audio analysis and microphone input may be used.\n\
\n\
IMPORTANT SOUND RULES:\n\
- Use p5.Oscillator instead of p5.Synth: let osc = new p5.Oscillator('sine');\n\
- For sound use p5.SoundFile, p5.AudioIn, p5.FFT, p5.Amplitude, p5.Filter\n\
- Start and stop oscillators with osc.start(); osc.stop();\n\
- Set frequency with osc.freq(440);\n\
- Sound files: let sound = loadSound('url'); sound.play();\n\
- Never use p5.Synth, its constructor fails in this environment!\n\
\n\
Return one javascript code block.\n\
You may add a short paragraph explaining the logic and the result.\n\
There can be no external dependencies: every function must be defined in the code or be part of p5js/p5.sound.\n\
Make sure every function is either defined in the code or part of p5js/p5.sound.\n\
The user may edit the code; adapt to the user's changes.";

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, contents: &[ApiContent]) -> Result<ByteStream>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
    api_version: String,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            api_version: config.api_version.clone(),
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: "mock-key".to_string(),
            model: "mock-model".to_string(),
            api_url: "http://localhost:8000".to_string(),
            api_version: "v1alpha".to_string(),
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Open one streaming generation call over the given history.
    pub async fn create_stream(&self, contents: &[ApiContent]) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(contents);
            }
        }

        let request_url = self.request_url();
        let request = GenerateRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![Part::text(SYSTEM_PROMPT)],
            },
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig {
                    include_thoughts: true,
                },
            },
        };

        if debug_payload_enabled() {
            match serde_json::to_value(&request) {
                Ok(payload) => emit_debug_payload(&request_url, &payload),
                Err(error) => tracing::warn!(%error, "failed to serialize debug payload"),
            }
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_status_error(status, &body));
        }

        tracing::debug!(url = %request_url, model = %self.model, "stream opened");
        let stream = response
            .bytes_stream()
            .map(move |item| item.map_err(|error| map_api_request_error(error, &request_url)));
        Ok(Box::pin(stream))
    }

    fn request_url(&self) -> String {
        format!(
            "{}/{}/models/{}:streamGenerateContent?alt=sse",
            self.api_url.trim_end_matches('/'),
            self.api_version.trim_matches('/'),
            self.model
        )
    }
}

fn api_status_error(status: reqwest::StatusCode, body: &str) -> anyhow::Error {
    let body = body.trim();
    if body.is_empty() {
        anyhow!("Request failed with HTTP {status}")
    } else {
        anyhow!("Request failed {body}")
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    let reason = if error.is_connect() {
        "cannot reach the model endpoint"
    } else if error.is_timeout() {
        "model request timed out"
    } else if error.is_body() || error.is_decode() {
        "model stream was interrupted"
    } else {
        "model request failed"
    };
    anyhow!("{reason} ({request_url}): {error}")
}
