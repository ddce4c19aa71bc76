//! Cover image generation driven by a chat model.

use crate::prompts::{IMAGE_PROMPT_SYSTEM, IMAGE_PROMPT_TEMPLATE, KEYWORD_TEMPLATE};
use crate::{render_cover_prompt, render_template};
use async_trait::async_trait;
use regex::Regex;
use scrivener_core::{ChatRequest, CoverReference};
use scrivener_error::{ScrivenerResult, ValidationError, ValidationErrorKind};
use scrivener_interface::{ChatDriver, CoverGenerator, CoverRequest, ImageGeneration};
use std::sync::Arc;
use std::sync::LazyLock;

/// Shortest article, in characters, a cover can be generated for.
pub const MIN_COVER_CONTENT_CHARS: usize = 10;

const KEYWORD_SOURCE_CHARS: usize = 2000;
const TITLE_CHARS: usize = 100;

/// Appended to every image prompt.
pub const RENDER_GUARD: &str = "Hard constraint: do not render instruction text, metadata labels, ratio values, or platform tags in the image. Keep corner areas clean.";

static CONTROL_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(公众号|封面标准尺寸|尺寸版|比例为|2\.35:1|1:1|9:16|3:4)")
        .expect("Valid control metadata regex")
});

/// Drop lines that describe layout or platform rather than the picture.
///
/// Returns the trimmed input if every line would be dropped.
///
/// ```
/// use scrivener_workflow::strip_control_meta;
///
/// let prompt = "A quiet harbor at dawn\n公众号封面，比例为 2.35:1\nsoft light";
/// assert_eq!(strip_control_meta(prompt), "A quiet harbor at dawn\nsoft light");
/// ```
pub fn strip_control_meta(prompt: &str) -> String {
    let kept: Vec<&str> = prompt
        .lines()
        .filter(|line| !CONTROL_META.is_match(line))
        .collect();
    let joined = kept.join("\n");
    let joined = joined.trim();
    if joined.is_empty() {
        prompt.trim().to_string()
    } else {
        joined.to_string()
    }
}

/// Append [`RENDER_GUARD`] unless it is already present.
pub fn append_render_guard(prompt: &str) -> String {
    let prompt = prompt.trim();
    if prompt.contains(RENDER_GUARD) {
        prompt.to_string()
    } else {
        format!("{prompt}\n\n{RENDER_GUARD}")
    }
}

/// Pixel size for a size label.
///
/// Aspect ratios map to fixed sizes; `1k`/`2k`/`4k` and explicit `WxH`
/// pass through; anything else falls back to `2048x2048`.
///
/// ```
/// use scrivener_workflow::resolve_image_size;
///
/// assert_eq!(resolve_image_size("2.35:1"), "3072x1308");
/// assert_eq!(resolve_image_size("2K"), "2k");
/// assert_eq!(resolve_image_size("1024x768"), "1024x768");
/// assert_eq!(resolve_image_size("huge"), "2048x2048");
/// ```
pub fn resolve_image_size(label: &str) -> String {
    let label = label.trim().to_lowercase();
    let mapped = match label.as_str() {
        "2.35:1" => Some("3072x1308"),
        "1:1" => Some("2048x2048"),
        "9:16" => Some("1440x2560"),
        "3:4" => Some("1728x2304"),
        "1k" | "2k" | "4k" => Some(label.as_str()),
        _ => None,
    };
    if let Some(size) = mapped {
        return size.to_string();
    }
    let explicit = label.split_once('x').is_some_and(|(w, h)| {
        !w.is_empty()
            && !h.is_empty()
            && w.chars().all(|c| c.is_ascii_digit())
            && h.chars().all(|c| c.is_ascii_digit())
    });
    if explicit {
        label
    } else {
        tracing::warn!(label = %label, "Unknown image size, using 2048x2048");
        "2048x2048".to_string()
    }
}

/// Builds an image prompt from the article and renders it.
///
/// Without a style template the chat model extracts keywords and then
/// writes an English scene description. With a template the prompt is
/// rendered locally.
#[derive(Clone)]
pub struct PromptedCoverGenerator {
    chat: Arc<dyn ChatDriver>,
    images: Arc<dyn ImageGeneration>,
}

impl std::fmt::Debug for PromptedCoverGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptedCoverGenerator")
            .field("model", &self.chat.model_name())
            .finish()
    }
}

impl PromptedCoverGenerator {
    /// Create a generator.
    pub fn new(chat: Arc<dyn ChatDriver>, images: Arc<dyn ImageGeneration>) -> Self {
        Self { chat, images }
    }

    async fn describe_scene(&self, title: &str, content: &str) -> ScrivenerResult<String> {
        let excerpt: String = content.chars().take(KEYWORD_SOURCE_CHARS).collect();
        let keywords = self
            .chat
            .chat(&ChatRequest::single(
                render_template(KEYWORD_TEMPLATE, &[("content", &excerpt)]),
                None,
            ))
            .await?;
        let keywords = keywords.trim();
        tracing::debug!(keywords, "Extracted cover keywords");

        let prompt = self
            .chat
            .chat(&ChatRequest::single(
                render_template(
                    IMAGE_PROMPT_TEMPLATE,
                    &[("keywords", keywords), ("title", title)],
                ),
                Some(IMAGE_PROMPT_SYSTEM),
            ))
            .await?;
        Ok(prompt.trim().to_string())
    }
}

#[async_trait]
impl CoverGenerator for PromptedCoverGenerator {
    #[tracing::instrument(skip(self, req), fields(size = %req.size()))]
    async fn generate_cover(&self, req: &CoverRequest) -> ScrivenerResult<CoverReference> {
        let content = req.content().trim();
        let actual = content.chars().count();
        if actual < MIN_COVER_CONTENT_CHARS {
            return Err(ValidationError::new(ValidationErrorKind::ContentTooShort {
                min: MIN_COVER_CONTENT_CHARS,
                actual,
            })
            .into());
        }

        let title = if req.title().trim().is_empty() {
            content.chars().take(TITLE_CHARS).collect()
        } else {
            req.title().trim().to_string()
        };

        let draft = match req.style_template().as_deref().map(str::trim) {
            Some(template) if !template.is_empty() => {
                render_cover_prompt(template, &title, content)
            }
            _ => self.describe_scene(&title, content).await?,
        };
        let prompt = append_render_guard(&strip_control_meta(&draft));
        let size = resolve_image_size(req.size());

        let image = self.images.generate_image(&prompt, &size).await?;
        tracing::info!(url = %image.url, size = %image.size, "Cover generated");
        Ok(CoverReference {
            image_url: image.url,
            prompt,
            size: image.size,
        })
    }
}
