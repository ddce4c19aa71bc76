//! Loading command inputs from disk.

use anyhow::Context;
use scrivener::{InMemoryMaterialStore, WritingStyle, is_article_url};
use std::path::{Path, PathBuf};

/// Extensions picked up as reference material.
const MATERIAL_EXTENSIONS: &[&str] = &["txt", "md"];

/// Read a writing style from a TOML file.
///
/// ```toml
/// name = "冷静克制"
/// style_description = "短句为主，少用形容词"
/// tags = ["随笔"]
/// ```
pub async fn load_style(path: &Path) -> anyhow::Result<WritingStyle> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading style {}", path.display()))?;
    let style: WritingStyle =
        toml::from_str(&text).with_context(|| format!("parsing style {}", path.display()))?;
    if style.name.trim().is_empty() {
        anyhow::bail!("style {} has an empty name", path.display());
    }
    Ok(style)
}

/// Write a style as TOML that [`load_style`] reads back.
pub async fn save_style(path: &Path, style: &WritingStyle) -> anyhow::Result<()> {
    let text = toml::to_string(style).context("serializing style")?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("writing style {}", path.display()))
}

/// Read each reference article file.
pub async fn load_articles(paths: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    let mut articles = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading article {}", path.display()))?;
        articles.push(text);
    }
    Ok(articles)
}

/// URLs pass through for the fetcher; anything else is read as a file.
pub async fn load_source(source: &str) -> anyhow::Result<String> {
    if is_article_url(source) {
        return Ok(source.to_string());
    }
    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("reading source {source}"))
}

/// Load every `.txt`/`.md` file directly under `dir` as one material.
pub async fn load_materials(dir: &Path) -> anyhow::Result<InMemoryMaterialStore> {
    let store = InMemoryMaterialStore::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading material directory {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let wanted = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MATERIAL_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if wanted && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading material {}", path.display()))?;
        if text.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Skipping empty material");
            continue;
        }
        store.add_material(text.trim()).await;
    }

    tracing::info!(count = store.len().await, dir = %dir.display(), "Loaded materials");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener::Retrieval;

    #[tokio::test]
    async fn style_file_parses_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.toml");
        std::fs::write(&path, "name = \"冷静\"\nstyle_description = \"短句\"\n").unwrap();

        let style = load_style(&path).await.unwrap();
        assert_eq!(style.name, "冷静");
        assert_eq!(style.style_description, "短句");
        assert!(style.tags.is_empty());
        assert!(style.example_text.is_none());
    }

    #[tokio::test]
    async fn blank_style_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.toml");
        std::fs::write(&path, "name = \"  \"\n").unwrap();

        assert!(load_style(&path).await.is_err());
    }

    #[tokio::test]
    async fn saved_style_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted.toml");
        let style = WritingStyle {
            id: 3,
            name: "抬杠体".into(),
            style_description: "{\n  \"persona\": \"老朋友\"\n}".into(),
            example_text: Some("第一篇\n\n---\n\n第二篇".into()),
            tags: vec!["随笔".into()],
        };

        save_style(&path, &style).await.unwrap();
        assert_eq!(load_style(&path).await.unwrap(), style);
    }

    #[tokio::test]
    async fn missing_article_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.md");
        std::fs::write(&present, "正文").unwrap();

        let articles = load_articles(std::slice::from_ref(&present)).await.unwrap();
        assert_eq!(articles, vec!["正文".to_string()]);
        assert!(load_articles(&[present, dir.path().join("missing.md")]).await.is_err());
    }

    #[tokio::test]
    async fn urls_are_not_read_from_disk() {
        let source = load_source("https://example.com/post/1").await.unwrap();
        assert_eq!(source, "https://example.com/post/1");
        assert!(load_source("/definitely/missing/article.txt").await.is_err());
    }

    #[tokio::test]
    async fn materials_skip_other_extensions_and_blank_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "秋天的落叶").unwrap();
        std::fs::write(dir.path().join("b.MD"), "落叶与小路").unwrap();
        std::fs::write(dir.path().join("c.json"), "{\"落叶\": 1}").unwrap();
        std::fs::write(dir.path().join("d.txt"), "   \n").unwrap();

        let store = load_materials(dir.path()).await.unwrap();
        assert_eq!(store.len().await, 2);

        let hits = store.search("落叶", 5).await;
        assert_eq!(hits.len(), 2);
    }
}
