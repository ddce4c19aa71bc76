//! Layered configuration for Scrivener.
//!
//! Precedence, lowest first: bundled `scrivener.toml`,
//! `~/.config/scrivener/scrivener.toml`, `./scrivener.toml`, then
//! `SCRIVENER_<SECTION>__<KEY>` environment variables.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::{
    ImageConfig, LlmConfig, LoggingConfig, MAX_RETRY_CEILING, MAX_REVIEW_TOTAL, ScrivenerConfig,
    WorkflowConfig,
};
