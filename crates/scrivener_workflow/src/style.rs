//! Style extraction: turn reference articles into a reusable writing style.

use crate::prompts::{STYLE_SYSTEM, style_prompt};
use crate::{StepStream, extract_json_object, sanitize, sanitized};
use futures_util::StreamExt;
use scrivener_core::{ChatRequest, DonePayload, StepEvent, StyleDone, WritingStyle};
use scrivener_error::{
    ModelError, ModelErrorKind, ScrivenerError, ScrivenerResult, ValidationError,
    ValidationErrorKind,
};
use scrivener_interface::{StyleRepository, Streaming};
use serde_json::Value;
use std::sync::Arc;

/// At most this many reference articles are analyzed.
pub const MAX_REFERENCE_ARTICLES: usize = 5;

/// Characters of the combined articles kept as the style's sample text.
pub const EXAMPLE_TEXT_CHARS: usize = 1000;

const ARTICLE_SEPARATOR: &str = "\n\n---\n\n";

/// Trim the articles, drop blank ones and join the first five.
///
/// ```
/// use scrivener_workflow::combine_articles;
///
/// let combined = combine_articles(&[" 第一篇 ".into(), "  ".into(), "第二篇".into()]);
/// assert_eq!(combined, "第一篇\n\n---\n\n第二篇");
/// ```
pub fn combine_articles(articles: &[String]) -> String {
    articles
        .iter()
        .map(|article| article.trim())
        .filter(|article| !article.is_empty())
        .take(MAX_REFERENCE_ARTICLES)
        .collect::<Vec<_>>()
        .join(ARTICLE_SEPARATOR)
}

/// The style JSON object in a model reply, re-serialized.
///
/// # Errors
///
/// A deserialization model error when the reply holds no JSON object.
pub fn clean_style_json(reply: &str) -> ScrivenerResult<String> {
    match extract_json_object(reply) {
        Some(value @ Value::Object(_)) => {
            Ok(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
        }
        _ => Err(ModelError::new(ModelErrorKind::Deserialization(
            "模型未返回有效的 JSON 风格描述".to_string(),
        ))
        .into()),
    }
}

/// Reference articles and labels for one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRequest {
    /// Name of the new style
    pub name: String,
    /// Reference articles; blank ones are ignored
    pub articles: Vec<String>,
    /// Labels stored with the style
    pub tags: Vec<String>,
}

/// Extracts a writing style from reference articles with a language model
/// and stores it.
#[derive(Clone)]
pub struct StyleExtraction {
    llm: Arc<dyn Streaming>,
    styles: Arc<dyn StyleRepository>,
}

impl std::fmt::Debug for StyleExtraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleExtraction")
            .field("model", &self.llm.model_name())
            .finish()
    }
}

impl StyleExtraction {
    /// Create the step.
    pub fn new(llm: Arc<dyn Streaming>, styles: Arc<dyn StyleRepository>) -> Self {
        Self { llm, styles }
    }

    /// Check the request, returning the combined article text.
    ///
    /// # Errors
    ///
    /// Validation errors for a blank name or no non-blank article.
    pub fn prepare(&self, request: &StyleRequest) -> ScrivenerResult<String> {
        if request.name.trim().is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::EmptyStyleName).into());
        }
        let combined = combine_articles(&request.articles);
        if combined.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::NoReferenceArticles).into());
        }
        Ok(combined)
    }

    /// Stream one extraction.
    ///
    /// Events: `progress` (`analyzing`), `content` deltas of the model's
    /// reply, then `done` with the stored style. A reply without a JSON
    /// object, a model failure or a storage failure ends the stream with
    /// `error` and stores nothing.
    ///
    /// # Errors
    ///
    /// Validation errors from [`prepare`](Self::prepare), before anything streams.
    #[tracing::instrument(skip(self, request), fields(name = %request.name, articles = request.articles.len()))]
    pub fn execute(&self, request: StyleRequest) -> ScrivenerResult<StepStream> {
        let combined = self.prepare(&request)?;
        let step = self.clone();
        let count = request
            .articles
            .iter()
            .filter(|article| !article.trim().is_empty())
            .count()
            .min(MAX_REFERENCE_ARTICLES);

        Ok(Box::pin(async_stream::stream! {
            yield StepEvent::progress(
                "analyzing",
                format!("正在分析 {count} 篇参考文章并提取12维风格特征..."),
            );

            let chat = ChatRequest::single(style_prompt(&combined), Some(STYLE_SYSTEM));
            let mut fragments = match step.llm.chat_stream(&chat).await {
                Ok(stream) => sanitized(stream),
                Err(e) => {
                    yield failed(&request.name, &e);
                    return;
                }
            };

            let mut reply = String::new();
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(delta) => {
                        reply.push_str(&delta);
                        yield StepEvent::content(delta);
                    }
                    Err(e) => {
                        yield failed(&request.name, &e);
                        return;
                    }
                }
            }

            let style = match step.store(&request, &combined, &reply).await {
                Ok(style) => style,
                Err(e) => {
                    yield failed(&request.name, &e);
                    return;
                }
            };
            yield StepEvent::Done(DonePayload::Style(StyleDone {
                id: style.id,
                name: style.name,
                style_description: style.style_description,
                tags: style.tags,
            }));
        }))
    }

    /// Extract with a single blocking model call and return the stored style.
    ///
    /// # Errors
    ///
    /// Validation errors from [`prepare`](Self::prepare), model errors, a
    /// deserialization error when the reply holds no JSON object, and
    /// storage errors.
    #[tracing::instrument(skip(self, request), fields(name = %request.name, articles = request.articles.len()))]
    pub async fn extract(&self, request: StyleRequest) -> ScrivenerResult<WritingStyle> {
        let combined = self.prepare(&request)?;
        let chat = ChatRequest::single(style_prompt(&combined), Some(STYLE_SYSTEM));
        let reply = sanitize(&self.llm.chat(&chat).await?);
        self.store(&request, &combined, &reply).await
    }

    async fn store(
        &self,
        request: &StyleRequest,
        combined: &str,
        reply: &str,
    ) -> ScrivenerResult<WritingStyle> {
        let style = WritingStyle {
            id: 0,
            name: request.name.trim().to_string(),
            style_description: clean_style_json(reply)?,
            example_text: Some(combined.chars().take(EXAMPLE_TEXT_CHARS).collect()),
            tags: request.tags.clone(),
        };
        let style = self.styles.insert_style(style).await?;
        tracing::info!(style_id = style.id, name = %style.name, "Style extracted");
        Ok(style)
    }
}

fn failed(name: &str, err: &ScrivenerError) -> StepEvent {
    tracing::error!(name, error = %err, "Style extraction failed");
    StepEvent::error(err.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_keeps_first_five_non_blank() {
        let articles: Vec<String> = (1..=7).map(|i| format!("第{i}篇")).collect();
        let combined = combine_articles(&articles);
        assert_eq!(combined.split(ARTICLE_SEPARATOR).count(), 5);
        assert!(combined.ends_with("第5篇"));
        assert_eq!(combine_articles(&[" ".into(), String::new()]), "");
    }

    #[test]
    fn fenced_style_json_is_cleaned() {
        let reply = "分析如下：\n```json\n{\"persona\": \"朋友\", \"signature_moves\": [\"自问自答\"]}\n```";
        let json = clean_style_json(reply).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["persona"], "朋友");
    }

    #[test]
    fn reply_without_object_is_rejected() {
        let err = clean_style_json("这位作者很幽默。").unwrap_err();
        assert!(err.user_message().contains("模型未返回有效的 JSON 风格描述"));
    }
}
