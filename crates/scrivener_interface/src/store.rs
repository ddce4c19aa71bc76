//! Storage for workflows suspended at the decision gate.

use async_trait::async_trait;
use scrivener_core::WorkflowState;
use scrivener_error::ScrivenerResult;

/// Suspended workflow states keyed by rewrite id.
///
/// A second `put` under the same key replaces the first.
#[async_trait]
pub trait SuspendedWorkflowStore: Send + Sync {
    /// Store a suspended state.
    async fn put(&self, rewrite_id: i64, state: WorkflowState) -> ScrivenerResult<()>;

    /// Read a suspended state without removing it.
    async fn get(&self, rewrite_id: i64) -> ScrivenerResult<Option<WorkflowState>>;

    /// Remove and return a suspended state. At most one caller gets `Some`.
    async fn take(&self, rewrite_id: i64) -> ScrivenerResult<Option<WorkflowState>>;

    /// Drop a suspended state, returning whether one existed.
    async fn remove(&self, rewrite_id: i64) -> ScrivenerResult<bool>;

    /// Number of suspended workflows.
    async fn len(&self) -> usize;

    /// Whether nothing is suspended.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
