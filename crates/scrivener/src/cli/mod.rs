//! Command-line interface module.

mod commands;
mod inputs;
mod review;
mod run;
mod style;

pub use commands::{Cli, Commands};
pub use review::run_review;
pub use run::run_workflow;
pub use style::run_style;
