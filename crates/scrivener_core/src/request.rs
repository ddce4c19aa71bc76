//! Chat request type shared by the blocking and streaming model calls.

use crate::Message;
use serde::{Deserialize, Serialize};

/// A chat completion request.
///
/// The system prompt is kept apart from `messages` so drivers can place it
/// wherever their wire format expects.
///
/// # Examples
///
/// ```
/// use scrivener_core::{ChatRequest, Message};
///
/// let request = ChatRequest::builder()
///     .messages(vec![Message::user("Hello!")])
///     .system_prompt("Be brief.")
///     .temperature(0.7)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages().len(), 1);
/// assert_eq!(request.system_prompt().as_deref(), Some("Be brief."));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Default,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into), default)]
pub struct ChatRequest {
    /// The conversation messages to send
    messages: Vec<Message>,
    /// Optional system prompt
    #[builder(setter(into, strip_option))]
    system_prompt: Option<String>,
    /// Sampling temperature
    #[builder(setter(strip_option))]
    temperature: Option<f32>,
    /// Model override; drivers fall back to their configured model
    #[builder(setter(into, strip_option))]
    model: Option<String>,
}

impl ChatRequest {
    /// Creates a new request builder.
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }

    /// A single-turn request with an optional system prompt.
    pub fn single(prompt: impl Into<String>, system_prompt: Option<&str>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            system_prompt: system_prompt.map(str::to_string),
            temperature: None,
            model: None,
        }
    }
}
