//! The rewrite step: one streamed generation per attempt.

use crate::prompts::{REWRITE_SYSTEM, rag_query, rewrite_prompt};
use crate::{NoRetrieval, StepStream, count_actual_words, ensure_image_placeholders, sanitized};
use futures_util::StreamExt;
use scrivener_core::{
    ChatRequest, DonePayload, NewRewrite, RecordStatus, RewriteDone, RewriteRecord, Step,
    StepEvent, WritingStyle,
};
use scrivener_error::{
    ModelError, ModelErrorKind, ScrivenerError, ScrivenerResult, ValidationError,
    ValidationErrorKind,
};
use scrivener_interface::{
    ArticleFetcher, Retrieval, RewriteRepository, Streaming, StyleRepository,
};
use std::sync::Arc;

/// Default cap on fetched article length, in characters.
pub const DEFAULT_MAX_SOURCE_CHARS: usize = 50_000;

/// Whether the text is an http(s) URL with a host.
pub fn is_article_url(text: &str) -> bool {
    match url::Url::parse(text.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Rewrites a source article in a target style.
///
/// Each call to [`execute`](Self::execute) runs one attempt against an
/// existing record; retries reuse the record and overwrite its content.
#[derive(Clone)]
pub struct RewriteStep {
    llm: Arc<dyn Streaming>,
    styles: Arc<dyn StyleRepository>,
    rewrites: Arc<dyn RewriteRepository>,
    retrieval: Arc<dyn Retrieval>,
    fetcher: Option<Arc<dyn ArticleFetcher>>,
    max_source_chars: usize,
}

impl std::fmt::Debug for RewriteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteStep")
            .field("model", &self.llm.model_name())
            .field("has_fetcher", &self.fetcher.is_some())
            .field("max_source_chars", &self.max_source_chars)
            .finish()
    }
}

impl RewriteStep {
    /// Create a step with no retrieval and no URL support.
    pub fn new(
        llm: Arc<dyn Streaming>,
        styles: Arc<dyn StyleRepository>,
        rewrites: Arc<dyn RewriteRepository>,
    ) -> Self {
        Self {
            llm,
            styles,
            rewrites,
            retrieval: Arc::new(NoRetrieval),
            fetcher: None,
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
        }
    }

    /// Use a retrieval backend for RAG-enabled records.
    pub fn with_retrieval(mut self, retrieval: Arc<dyn Retrieval>) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Accept URLs as sources, fetched with this fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ArticleFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Cap fetched article length.
    pub fn with_max_source_chars(mut self, max_source_chars: usize) -> Self {
        self.max_source_chars = max_source_chars;
        self
    }

    /// Turn caller input into article text.
    ///
    /// A URL is fetched and truncated; anything else is used as given.
    ///
    /// # Errors
    ///
    /// Validation errors for blank input, or for a URL when no fetcher is
    /// configured or the page yields no text.
    #[tracing::instrument(skip(self, raw), fields(raw_len = raw.len()))]
    pub async fn resolve_source(&self, raw: &str) -> ScrivenerResult<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::EmptySource).into());
        }
        if !is_article_url(trimmed) {
            return Ok(raw.to_string());
        }

        let Some(fetcher) = &self.fetcher else {
            return Err(ValidationError::new(ValidationErrorKind::UrlFetch(format!(
                "{trimmed} (URL input is not enabled)"
            )))
            .into());
        };
        match fetcher.fetch(trimmed).await {
            Some(text) if !text.trim().is_empty() => {
                tracing::info!(url = trimmed, chars = text.chars().count(), "Fetched article");
                Ok(text.trim().chars().take(self.max_source_chars).collect())
            }
            _ => Err(ValidationError::new(ValidationErrorKind::UrlFetch(trimmed.to_string())).into()),
        }
    }

    /// Look up a style, failing when it does not exist.
    pub async fn require_style(&self, style_id: i64) -> ScrivenerResult<WritingStyle> {
        self.styles
            .get_style(style_id)
            .await?
            .ok_or_else(|| ValidationError::new(ValidationErrorKind::StyleNotFound(style_id)).into())
    }

    /// Validate the request and create a running record.
    #[tracing::instrument(skip(self, new), fields(style_id = new.style_id))]
    pub async fn create(&self, mut new: NewRewrite) -> ScrivenerResult<RewriteRecord> {
        if new.target_words == 0 {
            return Err(
                ValidationError::new(ValidationErrorKind::InvalidTargetWords(new.target_words))
                    .into(),
            );
        }
        new.source_article = self.resolve_source(&new.source_article).await?;
        self.require_style(new.style_id).await?;
        let record = self.rewrites.insert_rewrite(new).await?;
        tracing::info!(rewrite_id = record.id, "Created rewrite record");
        Ok(record)
    }

    async fn mark_failed(&self, record: &mut RewriteRecord, err: &ScrivenerError) -> StepEvent {
        tracing::error!(rewrite_id = record.id, error = %err, "Rewrite failed");
        record.status = RecordStatus::Failed;
        record.error_message = Some(err.user_message());
        if let Err(e) = self.rewrites.update_rewrite(record).await {
            tracing::error!(rewrite_id = record.id, error = %e, "Could not persist rewrite failure");
        }
        StepEvent::error(err.user_message())
    }

    /// Run one rewrite attempt against an existing record.
    ///
    /// Events: `start`, a `rag` progress event when retrieval is enabled,
    /// a `rewrite` progress event, `content` deltas, then `done`. Any
    /// failure marks the record failed and ends the stream with `error`.
    pub fn execute(&self, rewrite_id: i64) -> StepStream {
        let step = self.clone();
        Box::pin(async_stream::stream! {
            let mut record = match step.rewrites.get_rewrite(rewrite_id).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    let err = ValidationError::new(ValidationErrorKind::RewriteNotFound(rewrite_id));
                    yield StepEvent::error(err.kind.to_string());
                    return;
                }
                Err(e) => {
                    yield StepEvent::error(e.user_message());
                    return;
                }
            };

            yield StepEvent::Start { step: Step::Rewrite, record_id: record.id };

            record.status = RecordStatus::Running;
            record.error_message = None;
            if let Err(e) = step.rewrites.update_rewrite(&record).await {
                yield step.mark_failed(&mut record, &e).await;
                return;
            }

            let style = match step.require_style(record.style_id).await {
                Ok(style) => style,
                Err(e) => {
                    yield step.mark_failed(&mut record, &e).await;
                    return;
                }
            };

            let snippets = if record.enable_rag {
                yield StepEvent::progress("rag", "检索相关素材...");
                let hits = step
                    .retrieval
                    .search(&rag_query(&record.source_article), record.rag_top_k)
                    .await;
                tracing::debug!(rewrite_id, hits = hits.len(), "Retrieved materials");
                hits
            } else {
                Vec::new()
            };

            yield StepEvent::progress("rewrite", "正在改写...");

            let request = ChatRequest::single(
                rewrite_prompt(
                    &style.style_description,
                    record.target_words,
                    &record.source_article,
                    &snippets,
                ),
                Some(REWRITE_SYSTEM),
            );
            let mut fragments = match step.llm.chat_stream(&request).await {
                Ok(stream) => sanitized(stream),
                Err(e) => {
                    yield step.mark_failed(&mut record, &e).await;
                    return;
                }
            };

            let mut content = String::new();
            let mut failure = None;
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(delta) => {
                        content.push_str(&delta);
                        yield StepEvent::content(delta);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            if let Some(e) = failure {
                yield step.mark_failed(&mut record, &e).await;
                return;
            }
            if content.trim().is_empty() {
                let e = ScrivenerError::from(ModelError::new(ModelErrorKind::EmptyResponse(
                    "rewrite produced no visible text".to_string(),
                )));
                yield step.mark_failed(&mut record, &e).await;
                return;
            }

            let final_content = ensure_image_placeholders(content.trim());
            let actual_words = count_actual_words(&final_content);

            record.final_content = final_content.clone();
            record.actual_words = actual_words;
            record.rag_retrieved = snippets;
            record.status = RecordStatus::Completed;
            if let Err(e) = step.rewrites.update_rewrite(&record).await {
                yield step.mark_failed(&mut record, &e).await;
                return;
            }
            tracing::info!(rewrite_id, actual_words, "Rewrite completed");

            yield StepEvent::Done(DonePayload::Rewrite(RewriteDone {
                final_content,
                actual_words,
            }));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_article_urls() {
        assert!(is_article_url("https://mp.weixin.qq.com/s/abc"));
        assert!(is_article_url("  http://example.com/post  "));
        assert!(!is_article_url("ftp://example.com/file"));
        assert!(!is_article_url("今天天气不错 https://example.com"));
        assert!(!is_article_url("mailto:someone@example.com"));
    }
}
