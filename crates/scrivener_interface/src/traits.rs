//! Trait definitions for model backends and other external capabilities.

use crate::{CoverRequest, GeneratedImage};
use async_trait::async_trait;
use futures_util::stream::Stream;
use scrivener_core::{ChatRequest, CoverReference, Snippet};
use scrivener_error::ScrivenerResult;
use std::pin::Pin;

/// Ordered, finite, single-pass stream of text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = ScrivenerResult<String>> + Send>>;

/// Core trait every chat backend implements.
#[async_trait]
pub trait ChatDriver: Send + Sync {
    /// Send a request and wait for the complete reply.
    async fn chat(&self, req: &ChatRequest) -> ScrivenerResult<String>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Backends that can stream their reply.
#[async_trait]
pub trait Streaming: ChatDriver {
    /// Start a streaming reply.
    ///
    /// Connection failures surface here; failures mid-stream surface as
    /// `Err` items.
    async fn chat_stream(&self, req: &ChatRequest) -> ScrivenerResult<TextStream>;
}

/// Best-effort lookup of reference material.
#[async_trait]
pub trait Retrieval: Send + Sync {
    /// Up to `top_k` snippets ranked best first. Failures yield an empty list.
    async fn search(&self, query: &str, top_k: usize) -> Vec<Snippet>;
}

/// Text-to-image backends.
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    /// Generate one image. `size` is a pixel size such as `2048x2048`.
    async fn generate_image(&self, prompt: &str, size: &str) -> ScrivenerResult<GeneratedImage>;
}

/// Turns a URL into article text.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Article text, or `None` when the page could not be fetched or was empty.
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// Produces a cover image for finished content.
#[async_trait]
pub trait CoverGenerator: Send + Sync {
    /// Generate a cover.
    async fn generate_cover(&self, req: &CoverRequest) -> ScrivenerResult<CoverReference>;
}
