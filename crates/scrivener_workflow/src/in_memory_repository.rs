//! In-memory implementation of the style, rewrite and review repositories.
//!
//! Backs the CLI and the tests. All data is lost when the repository is
//! dropped.

use async_trait::async_trait;
use chrono::Utc;
use scrivener_core::{NewReview, NewRewrite, ReviewRecord, RewriteRecord, WritingStyle};
use scrivener_error::{ScrivenerError, ScrivenerResult, StorageError};
use scrivener_interface::{ReviewRepository, RewriteRepository, StyleRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// HashMap-backed repository for styles, rewrites and reviews.
///
/// Clones share the same storage.
///
/// # Example
/// ```
/// use scrivener_core::WritingStyle;
/// use scrivener_interface::StyleRepository;
/// use scrivener_workflow::InMemoryRepository;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let repo = InMemoryRepository::new();
/// let id = repo
///     .add_style(WritingStyle {
///         id: 0,
///         name: "随笔".into(),
///         style_description: "松弛、口语化".into(),
///         example_text: None,
///         tags: vec![],
///     })
///     .await;
/// assert_eq!(repo.get_style(id).await.unwrap().unwrap().name, "随笔");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    styles: Arc<RwLock<HashMap<i64, WritingStyle>>>,
    rewrites: Arc<RwLock<HashMap<i64, RewriteRecord>>>,
    reviews: Arc<RwLock<HashMap<i64, ReviewRecord>>>,
    /// Next ID to assign, shared across entity kinds
    next_id: Arc<RwLock<i64>>,
}

impl InMemoryRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self {
            styles: Arc::new(RwLock::new(HashMap::new())),
            rewrites: Arc::new(RwLock::new(HashMap::new())),
            reviews: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    async fn allocate_id(&self) -> i64 {
        let mut next_id = self.next_id.write().await;
        let id = *next_id;
        *next_id += 1;
        id
    }

    /// Store a style under a fresh id and return the id.
    pub async fn add_style(&self, mut style: WritingStyle) -> i64 {
        let id = self.allocate_id().await;
        style.id = id;
        self.styles.write().await.insert(id, style);
        id
    }

    /// Number of stored rewrite records.
    pub async fn rewrite_count(&self) -> usize {
        self.rewrites.read().await.len()
    }

    /// Number of stored review records.
    pub async fn review_count(&self) -> usize {
        self.reviews.read().await.len()
    }

    /// Clear all records.
    pub async fn clear(&self) {
        self.styles.write().await.clear();
        self.rewrites.write().await.clear();
        self.reviews.write().await.clear();
        *self.next_id.write().await = 1;
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StyleRepository for InMemoryRepository {
    async fn get_style(&self, id: i64) -> ScrivenerResult<Option<WritingStyle>> {
        Ok(self.styles.read().await.get(&id).cloned())
    }

    async fn insert_style(&self, mut style: WritingStyle) -> ScrivenerResult<WritingStyle> {
        style.id = self.add_style(style.clone()).await;
        tracing::debug!(style_id = style.id, "Inserted writing style");
        Ok(style)
    }
}

#[async_trait]
impl RewriteRepository for InMemoryRepository {
    async fn insert_rewrite(&self, new: NewRewrite) -> ScrivenerResult<RewriteRecord> {
        let id = self.allocate_id().await;
        let record = RewriteRecord::from_new(id, new);
        self.rewrites.write().await.insert(id, record.clone());
        tracing::debug!(rewrite_id = id, "Inserted rewrite record");
        Ok(record)
    }

    async fn get_rewrite(&self, id: i64) -> ScrivenerResult<Option<RewriteRecord>> {
        Ok(self.rewrites.read().await.get(&id).cloned())
    }

    async fn update_rewrite(&self, record: &RewriteRecord) -> ScrivenerResult<()> {
        let mut rewrites = self.rewrites.write().await;
        let stored = rewrites
            .get_mut(&record.id)
            .ok_or_else(|| ScrivenerError::from(StorageError::not_found("rewrite", record.id)))?;
        *stored = record.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryRepository {
    async fn insert_review(&self, new: NewReview) -> ScrivenerResult<ReviewRecord> {
        let id = self.allocate_id().await;
        let record = ReviewRecord::from_new(id, new);
        self.reviews.write().await.insert(id, record.clone());
        tracing::debug!(review_id = id, round = record.round, "Inserted review record");
        Ok(record)
    }

    async fn get_review(&self, id: i64) -> ScrivenerResult<Option<ReviewRecord>> {
        Ok(self.reviews.read().await.get(&id).cloned())
    }

    async fn update_review(&self, record: &ReviewRecord) -> ScrivenerResult<()> {
        let mut reviews = self.reviews.write().await;
        let stored = reviews
            .get_mut(&record.id)
            .ok_or_else(|| ScrivenerError::from(StorageError::not_found("review", record.id)))?;
        *stored = record.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn list_reviews(&self, rewrite_id: i64) -> ScrivenerResult<Vec<ReviewRecord>> {
        let reviews = self.reviews.read().await;
        let mut results: Vec<ReviewRecord> = reviews
            .values()
            .filter(|review| review.rewrite_id == rewrite_id)
            .cloned()
            .collect();
        results.sort_by_key(|review| (review.round, review.id));
        Ok(results)
    }
}
