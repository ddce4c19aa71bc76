//! Scrivener - style-guided article rewriting.
//!
//! Scrivener rewrites a source article in a chosen writing style, has a
//! second model pass review the result for machine-written tells, retries
//! until the review passes or a retry ceiling is hit, and then waits for a
//! human to either edit the text or move on to cover generation.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scrivener::{
//!     InMemoryRepository, OpenAiClient, ScrivenerConfig, WorkflowInput, WorkflowOrchestrator,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScrivenerConfig::load()?;
//!     let llm = Arc::new(OpenAiClient::from_config(config.llm())?);
//!     let repo = Arc::new(InMemoryRepository::new());
//!     let style_id = repo.add_style(my_style()).await;
//!
//!     let orchestrator = WorkflowOrchestrator::new(llm, repo).with_config(config.workflow());
//!     let input = WorkflowInput::builder()
//!         .source_article("……")
//!         .style_id(style_id)
//!         .build()?;
//!     let state = orchestrator.run(&input).await?;
//!     println!("{:?}", state.status);
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `otel` - export tracing spans through OpenTelemetry
//!
//! # Architecture
//!
//! - `scrivener_error` - Error types
//! - `scrivener_core` - Data types, events and tracing setup
//! - `scrivener_interface` - Collaborator traits
//! - `scrivener_config` - Layered configuration
//! - `scrivener_models` - OpenAI-compatible clients and article fetching
//! - `scrivener_workflow` - Steps and the workflow state machine
//!
//! This crate (`scrivener`) re-exports everything for convenience.

pub use scrivener_config::*;
pub use scrivener_core::*;
pub use scrivener_error::*;
pub use scrivener_interface::*;
pub use scrivener_models::*;
pub use scrivener_workflow::*;
