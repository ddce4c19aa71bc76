//! OpenAI-compatible wire types.
//!
//! Response types are lenient: providers disagree on which fields they send.

use scrivener_core::Message;
use serde::{Deserialize, Serialize};

/// Chat completion request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<WireMessage>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Enable streaming mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WireMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    /// Message content
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.to_string(),
            content: message.content.clone(),
        }
    }
}

/// Error object some providers return in place of a result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiErrorBody {
    /// Human-readable message
    pub message: String,
    /// Provider error code
    pub code: Option<serde_json::Value>,
}

/// Chat completion response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatCompletionResponse {
    /// Generated completions
    pub choices: Vec<Choice>,
    /// Provider error, if any
    pub error: Option<ApiErrorBody>,
}

impl ChatCompletionResponse {
    /// Content of the first choice.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// A completion choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Choice {
    /// The generated message
    pub message: Delta,
    /// Reason generation finished
    pub finish_reason: Option<String>,
}

/// Streaming chat completion chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatCompletionChunk {
    /// Delta choices
    pub choices: Vec<ChunkChoice>,
    /// Provider error, if any
    pub error: Option<ApiErrorBody>,
}

impl ChatCompletionChunk {
    /// Concatenated delta text across choices, `None` when empty.
    pub fn delta_text(&self) -> Option<String> {
        let text: String = self
            .choices
            .iter()
            .filter_map(|choice| choice.delta.content.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// A choice in a streaming chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkChoice {
    /// Delta content
    pub delta: Delta,
    /// Finish reason (if complete)
    pub finish_reason: Option<String>,
}

/// Message or delta content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Delta {
    /// Role (only in first chunk)
    pub role: Option<String>,
    /// Incremental content
    pub content: Option<String>,
}

/// Image generation request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageGenerationRequest {
    /// Model identifier
    pub model: String,
    /// Prompt
    pub prompt: String,
    /// Size label or `WxH`
    pub size: String,
    /// Always `url`
    pub response_format: String,
    /// Always false
    pub stream: bool,
    /// Always false
    pub watermark: bool,
}

/// Image generation response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageGenerationResponse {
    /// Generated images
    pub data: Vec<ImageData>,
    /// Provider error, if any
    pub error: Option<ApiErrorBody>,
}

/// One generated image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageData {
    /// Image URL
    pub url: Option<String>,
    /// Actual pixel size
    pub size: Option<String>,
}
