//! Retrieved material snippets.

use serde::{Deserialize, Serialize};

/// One ranked retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Material the snippet came from, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<i64>,
    /// Snippet text
    pub content: String,
    /// Relevance score, higher is better
    pub score: f32,
}

impl Snippet {
    /// Create a snippet without a material reference.
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            material_id: None,
            content: content.into(),
            score,
        }
    }
}
