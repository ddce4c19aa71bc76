//! Test utilities for workflow tests.
//!
//! This module provides a scripted language model and fixtures.

pub mod mock_llm;

#[allow(unused_imports)]
pub use mock_llm::{MockLlm, MockReply};

use scrivener_core::WritingStyle;
use scrivener_workflow::InMemoryRepository;

/// A review verdict as the model would print it.
#[allow(dead_code)]
pub fn verdict(passed: bool, total: u32) -> String {
    format!(
        r#"{{"ai_detection":{{"has_ai_smell":false,"issues":[],"examples":[]}},"quality_scores":{{"directness":8,"rhythm":8,"trust":8,"authenticity":7,"conciseness":8,"total":{total}}},"issues":[],"passed":{passed},"reason":"测试结论"}}"#
    )
}

/// Repository with one style, returning the style id.
#[allow(dead_code)]
pub async fn repo_with_style() -> (InMemoryRepository, i64) {
    let repo = InMemoryRepository::new();
    let id = repo
        .add_style(WritingStyle {
            id: 0,
            name: "冷静叙事".into(),
            style_description: "句子短，少形容词，多用具体细节".into(),
            example_text: None,
            tags: vec!["叙事".into()],
        })
        .await;
    (repo, id)
}
