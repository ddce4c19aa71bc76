//! Rewrite, review and decision workflow engine for Scrivener.
//!
//! A run rewrites a source article in a target style, has a second model
//! pass review it, retries failed reviews up to a ceiling, then suspends
//! for a human decision before finishing with an optional cover image.
//!
//! # Pieces
//!
//! - [`ThinkTagFilter`] strips `<think>`-style spans from streamed model output
//! - [`ensure_image_placeholders`] guarantees image slots in finished text
//! - [`RewriteStep`] and [`ReviewStep`] run one model pass each and persist results
//! - [`WorkflowOrchestrator`] sequences the steps and resumes suspended runs
//! - [`PromptedCoverGenerator`] turns finished text into a cover image
//! - [`StyleExtraction`] builds a reusable writing style from reference articles

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cover;
mod extraction;
mod in_memory_repository;
mod orchestrator;
mod placeholders;
mod prompts;
mod retrieval;
mod review;
mod rewrite;
mod sanitizer;
mod store;
mod style;
mod template;
mod transition;

pub use cover::{
    MIN_COVER_CONTENT_CHARS, PromptedCoverGenerator, RENDER_GUARD, append_render_guard,
    resolve_image_size, strip_control_meta,
};
pub use extraction::{extract_json_object, parse_review_feedback};
pub use in_memory_repository::InMemoryRepository;
pub use orchestrator::{WorkflowOrchestrator, collect_step, last_state};
pub use placeholders::{PLACEHOLDER, count_actual_words, ensure_image_placeholders};
pub use prompts::{
    NO_MATERIALS, rag_query, render_materials, review_prompt, rewrite_prompt, style_prompt,
    word_bounds,
};
pub use retrieval::{InMemoryMaterialStore, NoRetrieval};
pub use review::{DEFAULT_PASS_THRESHOLD, ReviewStep};
pub use rewrite::{DEFAULT_MAX_SOURCE_CHARS, RewriteStep, is_article_url};
pub use sanitizer::{ThinkTagFilter, sanitize, sanitized};
pub use store::InMemorySuspendedStore;
pub use style::{
    EXAMPLE_TEXT_CHARS, MAX_REFERENCE_ARTICLES, StyleExtraction, StyleRequest, clean_style_json,
    combine_articles,
};
pub use template::{render_cover_prompt, render_template};
pub use transition::{AfterReview, after_decision, after_review};

use futures_util::Stream;
use scrivener_core::{StepEvent, WorkflowEvent};
use std::pin::Pin;

/// Events of one step run.
pub type StepStream = Pin<Box<dyn Stream<Item = StepEvent> + Send>>;

/// Events of a workflow run.
pub type WorkflowStream = Pin<Box<dyn Stream<Item = WorkflowEvent> + Send>>;
