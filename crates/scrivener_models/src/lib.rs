//! Model clients for Scrivener.
//!
//! - [`OpenAiClient`]: chat and streaming chat against any OpenAI-compatible
//!   `/chat/completions` endpoint
//! - [`OpenAiImageClient`]: `/images/generations`
//! - [`HttpArticleFetcher`]: URL to article text

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod fetch;
mod image;
mod openai;
mod sse;
mod wire;

pub use fetch::{HttpArticleFetcher, extract_article};
pub use image::OpenAiImageClient;
pub use openai::OpenAiClient;
pub use sse::{SseDecoder, text_deltas};
pub use wire::{
    ApiErrorBody, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChunkChoice,
    Delta, ImageData, ImageGenerationRequest, ImageGenerationResponse, WireMessage,
};
