//! Persistence traits for styles, rewrites and reviews.
//!
//! Writes are last-writer-wins per record; callers guarantee a single
//! workflow mutates a given record at a time.

use async_trait::async_trait;
use scrivener_core::{NewReview, NewRewrite, ReviewRecord, RewriteRecord, WritingStyle};
use scrivener_error::ScrivenerResult;

/// Writing style persistence.
#[async_trait]
pub trait StyleRepository: Send + Sync {
    /// Look up a style by id.
    async fn get_style(&self, id: i64) -> ScrivenerResult<Option<WritingStyle>>;

    /// Store a new style, ignoring its `id` and returning it with the assigned one.
    async fn insert_style(&self, style: WritingStyle) -> ScrivenerResult<WritingStyle>;
}

/// Rewrite record persistence.
#[async_trait]
pub trait RewriteRepository: Send + Sync {
    /// Create a running record and assign its id.
    async fn insert_rewrite(&self, new: NewRewrite) -> ScrivenerResult<RewriteRecord>;

    /// Look up a rewrite by id.
    async fn get_rewrite(&self, id: i64) -> ScrivenerResult<Option<RewriteRecord>>;

    /// Overwrite an existing record.
    ///
    /// # Errors
    ///
    /// Fails with a not-found storage error when the id is unknown.
    async fn update_rewrite(&self, record: &RewriteRecord) -> ScrivenerResult<()>;
}

/// Review record persistence.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Create a running record and assign its id.
    async fn insert_review(&self, new: NewReview) -> ScrivenerResult<ReviewRecord>;

    /// Look up a review by id.
    async fn get_review(&self, id: i64) -> ScrivenerResult<Option<ReviewRecord>>;

    /// Overwrite an existing record.
    async fn update_review(&self, record: &ReviewRecord) -> ScrivenerResult<()>;

    /// All reviews of a rewrite, oldest round first.
    async fn list_reviews(&self, rewrite_id: i64) -> ScrivenerResult<Vec<ReviewRecord>>;
}
