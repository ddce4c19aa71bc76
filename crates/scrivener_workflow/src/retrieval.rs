//! Local material search used when no external retrieval service is wired in.

use async_trait::async_trait;
use scrivener_core::Snippet;
use scrivener_interface::Retrieval;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Retrieval that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetrieval;

#[async_trait]
impl Retrieval for NoRetrieval {
    async fn search(&self, _query: &str, _top_k: usize) -> Vec<Snippet> {
        Vec::new()
    }
}

#[derive(Debug, Clone)]
struct Material {
    id: i64,
    content: String,
    bigrams: HashSet<(char, char)>,
}

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Ranks stored materials by character-bigram overlap with the query.
///
/// Scores are the fraction of query bigrams found in the material, so
/// they fall in `0.0..=1.0`. Materials with no overlap are not returned.
///
/// ```
/// use scrivener_interface::Retrieval;
/// use scrivener_workflow::InMemoryMaterialStore;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = InMemoryMaterialStore::new();
/// store.add_material("城市夜跑的人越来越多").await;
/// store.add_material("咖啡豆的烘焙程度").await;
/// let hits = store.search("夜跑", 3).await;
/// assert_eq!(hits.len(), 1);
/// assert!(hits[0].content.contains("夜跑"));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryMaterialStore {
    materials: Arc<RwLock<Vec<Material>>>,
}

impl InMemoryMaterialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material and return its id.
    pub async fn add_material(&self, content: impl Into<String>) -> i64 {
        let content = content.into();
        let mut materials = self.materials.write().await;
        let id = materials.len() as i64 + 1;
        materials.push(Material {
            id,
            bigrams: bigrams(&content),
            content,
        });
        id
    }

    /// Number of stored materials.
    pub async fn len(&self) -> usize {
        self.materials.read().await.len()
    }

    /// Whether the store holds no materials.
    pub async fn is_empty(&self) -> bool {
        self.materials.read().await.is_empty()
    }
}

#[async_trait]
impl Retrieval for InMemoryMaterialStore {
    #[tracing::instrument(skip(self, query), fields(query_len = query.len()))]
    async fn search(&self, query: &str, top_k: usize) -> Vec<Snippet> {
        let wanted = bigrams(query);
        if wanted.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let materials = self.materials.read().await;
        let mut hits: Vec<Snippet> = materials
            .iter()
            .filter_map(|material| {
                let shared = wanted.intersection(&material.bigrams).count();
                (shared > 0).then(|| Snippet {
                    material_id: Some(material.id),
                    content: material.content.clone(),
                    score: shared as f32 / wanted.len() as f32,
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        tracing::debug!(hits = hits.len(), "Material search finished");
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ranks_by_overlap() {
        let store = InMemoryMaterialStore::new();
        store.add_material("秋天的银杏叶").await;
        store.add_material("秋天的银杏叶铺满了校园小路").await;
        store.add_material("无关内容").await;

        let hits = store.search("校园小路的银杏叶", 5).await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].material_id, Some(2));
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn respects_top_k_and_empty_query() {
        let store = InMemoryMaterialStore::new();
        for i in 0..5 {
            store.add_material(format!("素材内容{i}")).await;
        }
        assert_eq!(store.search("素材内容", 2).await.len(), 2);
        assert!(store.search(" ", 2).await.is_empty());
        assert!(NoRetrieval.search("素材", 2).await.is_empty());
    }
}
