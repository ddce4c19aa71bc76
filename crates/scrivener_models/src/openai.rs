//! OpenAI-compatible chat client.

use crate::{ChatCompletionRequest, ChatCompletionResponse, WireMessage, text_deltas};
use async_trait::async_trait;
use scrivener_config::LlmConfig;
use scrivener_core::ChatRequest;
use scrivener_error::{ModelError, ModelErrorKind, ScrivenerResult};
use scrivener_interface::{ChatDriver, Streaming, TextStream};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct OpenAiClient {
    /// API base including the version segment, e.g. `https://api.openai.com/v1`
    base_url: String,
    /// Default model
    model: String,
    /// Default temperature
    temperature: Option<f32>,
    #[getter(skip)]
    api_key: Option<String>,
    #[getter(skip)]
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client with default HTTP settings.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            temperature: None,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the `[llm]` configuration section.
    #[instrument(skip(config), fields(base_url = %config.base_url(), model = %config.model()))]
    pub fn from_config(config: &LlmConfig) -> ScrivenerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(*config.timeout_secs()))
            .build()
            .map_err(|e| {
                ModelError::new(ModelErrorKind::Configuration(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        debug!("Creating chat client");
        Ok(Self {
            base_url: config.base_url().clone(),
            model: config.model().clone(),
            temperature: Some(*config.temperature()),
            api_key: config.api_key().clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn wire_request(&self, req: &ChatRequest, stream: bool) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(req.messages().len() + 1);
        if let Some(system) = req.system_prompt() {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(req.messages().iter().map(WireMessage::from));

        ChatCompletionRequest {
            model: req.model().clone().unwrap_or_else(|| self.model.clone()),
            messages,
            temperature: req.temperature().or(self.temperature),
            stream: stream.then_some(true),
        }
    }

    async fn send(&self, body: &ChatCompletionRequest) -> Result<reqwest::Response, ModelError> {
        let url = self.endpoint();
        debug!(url = %url, stream = ?body.stream, "Sending chat completion request");

        let mut request = self.client.post(&url).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request failed: {}", e);
            ModelError::new(ModelErrorKind::Http(format!("Request failed: {}", e)))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            error!(status = status.as_u16(), "Chat endpoint returned error");
            return Err(ModelError::new(ModelErrorKind::Api {
                status: status.as_u16(),
                message,
            }));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatDriver for OpenAiClient {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn chat(&self, req: &ChatRequest) -> ScrivenerResult<String> {
        let response = self.send(&self.wire_request(req, false)).await?;
        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse response: {}", e);
            ModelError::new(ModelErrorKind::Deserialization(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        if let Some(api_error) = body.error.as_ref() {
            return Err(ModelError::new(ModelErrorKind::Api {
                status: 200,
                message: api_error.message.clone(),
            })
            .into());
        }

        let content = body.first_content().ok_or_else(|| {
            ModelError::new(ModelErrorKind::EmptyResponse(
                "no choices in chat completion".to_string(),
            ))
        })?;
        debug!(chars = content.chars().count(), "Chat completion successful");
        Ok(content.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Streaming for OpenAiClient {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn chat_stream(&self, req: &ChatRequest) -> ScrivenerResult<TextStream> {
        let response = self.send(&self.wire_request(req, true)).await?;
        debug!("Streaming request accepted, decoding SSE");
        Ok(text_deltas(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_core::Message;

    #[test]
    fn system_prompt_leads_and_request_overrides_win() {
        let client = OpenAiClient::new("https://example.test/v1/", "base-model", None);
        let req = ChatRequest::builder()
            .messages(vec![Message::user("hi")])
            .system_prompt("sys")
            .temperature(0.1)
            .model("override")
            .build()
            .unwrap();

        let wire = client.wire_request(&req, true);
        assert_eq!(wire.model, "override");
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].content, "hi");
        assert_eq!(wire.temperature, Some(0.1));
        assert_eq!(wire.stream, Some(true));
        assert_eq!(client.endpoint(), "https://example.test/v1/chat/completions");
    }

    #[test]
    fn non_streaming_request_omits_stream_flag() {
        let client = OpenAiClient::new("http://localhost:8080/v1", "m", None);
        let wire = client.wire_request(&ChatRequest::single("x", None), false);
        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("stream").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["model"], "m");
    }
}
