//! Process-local store for workflows paused at the decision gate.

use async_trait::async_trait;
use scrivener_core::WorkflowState;
use scrivener_error::ScrivenerResult;
use scrivener_interface::SuspendedWorkflowStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`SuspendedWorkflowStore`].
///
/// Single-process and non-durable: suspended workflows do not survive a
/// restart and never expire. Two runs that share a rewrite id overwrite
/// each other. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySuspendedStore {
    states: Arc<RwLock<HashMap<i64, WorkflowState>>>,
}

impl InMemorySuspendedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SuspendedWorkflowStore for InMemorySuspendedStore {
    async fn put(&self, rewrite_id: i64, state: WorkflowState) -> ScrivenerResult<()> {
        if self.states.write().await.insert(rewrite_id, state).is_some() {
            tracing::warn!(rewrite_id, "Replaced an existing suspended workflow");
        }
        Ok(())
    }

    async fn get(&self, rewrite_id: i64) -> ScrivenerResult<Option<WorkflowState>> {
        Ok(self.states.read().await.get(&rewrite_id).cloned())
    }

    async fn take(&self, rewrite_id: i64) -> ScrivenerResult<Option<WorkflowState>> {
        Ok(self.states.write().await.remove(&rewrite_id))
    }

    async fn remove(&self, rewrite_id: i64) -> ScrivenerResult<bool> {
        Ok(self.states.write().await.remove(&rewrite_id).is_some())
    }

    async fn len(&self) -> usize {
        self.states.read().await.len()
    }
}
