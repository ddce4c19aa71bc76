//! Persisted record shapes for styles, rewrites and reviews.

use crate::Snippet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a rewrite or review record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordStatus {
    /// Generation in progress
    #[default]
    Running,
    /// Generation finished
    Completed,
    /// Generation failed; see `error_message`
    Failed,
}

/// Verdict stored on a review record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewResult {
    /// Not yet decided
    #[default]
    Pending,
    /// Review passed
    Passed,
    /// Review failed
    Failed,
}

/// A target writing style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingStyle {
    /// Record id
    #[serde(default)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Free-form description of the voice
    #[serde(default)]
    pub style_description: String,
    /// Optional sample passage
    #[serde(default)]
    pub example_text: Option<String>,
    /// Labels
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WritingStyle {
    /// Short summary handed to the reviewer.
    ///
    /// ```
    /// use scrivener_core::WritingStyle;
    ///
    /// let style = WritingStyle {
    ///     id: 1,
    ///     name: "冷静".into(),
    ///     style_description: "短句".into(),
    ///     example_text: None,
    ///     tags: vec![],
    /// };
    /// assert_eq!(style.to_summary(), "风格名称: 冷静\n标签: 无\n风格描述: 短句");
    /// ```
    pub fn to_summary(&self) -> String {
        let tags = if self.tags.is_empty() {
            "无".to_string()
        } else {
            self.tags.join(", ")
        };
        let description: String = self.style_description.chars().take(500).collect();
        format!(
            "风格名称: {}\n标签: {}\n风格描述: {}",
            self.name, tags, description
        )
    }
}

/// Fields supplied when a rewrite record is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRewrite {
    /// Source text
    pub source_article: String,
    /// Target style
    pub style_id: i64,
    /// Desired length
    pub target_words: u32,
    /// Retrieval enabled
    pub enable_rag: bool,
    /// Retrieval limit
    pub rag_top_k: usize,
}

/// A persisted rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRecord {
    /// Record id
    pub id: i64,
    /// Source text
    pub source_article: String,
    /// Target style
    pub style_id: i64,
    /// Desired length
    pub target_words: u32,
    /// Measured length of `final_content`
    pub actual_words: usize,
    /// Retrieval enabled
    pub enable_rag: bool,
    /// Retrieval limit
    pub rag_top_k: usize,
    /// Snippets the prompt was built with
    pub rag_retrieved: Vec<Snippet>,
    /// Rewritten text
    pub final_content: String,
    /// Lifecycle status
    pub status: RecordStatus,
    /// Failure message
    pub error_message: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl RewriteRecord {
    /// Build a running record from creation fields.
    pub fn from_new(id: i64, new: NewRewrite) -> Self {
        let now = Utc::now();
        Self {
            id,
            source_article: new.source_article,
            style_id: new.style_id,
            target_words: new.target_words,
            actual_words: 0,
            enable_rag: new.enable_rag,
            rag_top_k: new.rag_top_k,
            rag_retrieved: Vec::new(),
            final_content: String::new(),
            status: RecordStatus::Running,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields supplied when a review record is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// Rewrite under review
    pub rewrite_id: i64,
    /// Content being reviewed
    pub content: String,
    /// 1-based review round for this rewrite
    pub round: u32,
    /// Retry counter at the time of review
    pub retry_count: u32,
}

/// A persisted review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Record id
    pub id: i64,
    /// Rewrite under review
    pub rewrite_id: i64,
    /// Content being reviewed
    pub content: String,
    /// Verdict
    pub result: ReviewResult,
    /// Parsed or error-shaped feedback
    pub feedback: Option<serde_json::Value>,
    /// Authenticity sub-score
    pub ai_score: Option<i64>,
    /// Total score out of 50
    pub total_score: Option<i64>,
    /// 1-based review round
    pub round: u32,
    /// Retry counter at the time of review
    pub retry_count: u32,
    /// Lifecycle status
    pub status: RecordStatus,
    /// Failure message
    pub error_message: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Build a running record from creation fields.
    pub fn from_new(id: i64, new: NewReview) -> Self {
        let now = Utc::now();
        Self {
            id,
            rewrite_id: new.rewrite_id,
            content: new.content,
            result: ReviewResult::Pending,
            feedback: None,
            ai_score: None,
            total_score: None,
            round: new.round,
            retry_count: new.retry_count,
            status: RecordStatus::Running,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
