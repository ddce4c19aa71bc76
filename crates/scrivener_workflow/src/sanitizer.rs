//! Removal of model "thinking" spans from streamed text.

use futures_util::StreamExt;
use regex::Regex;
use scrivener_interface::TextStream;
use std::sync::LazyLock;

const OPEN_TAGS: &[&str] = &["<think>", "<thinking>", "<langchain>"];
const CLOSE_TAGS: &[&str] = &["</think>", "</thinking>", "</langchain>"];

/// Characters held back so a tag split across fragments is still seen whole.
const TAG_GUARD: usize = 11;

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:think|thinking|langchain)>").expect("Valid think tag regex")
});

/// Earliest occurrence of any tag, as (byte index, tag).
fn find_first(text: &str, tags: &[&'static str]) -> Option<(usize, &'static str)> {
    tags.iter()
        .filter_map(|tag| text.find(tag).map(|idx| (idx, *tag)))
        .min_by_key(|(idx, _)| *idx)
}

/// Byte index of the `n`th character, or the end of the string.
fn char_boundary(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(idx, _)| idx)
}

/// Streaming filter that drops `<think>`-style spans.
///
/// Feed fragments with [`push`](Self::push) and call
/// [`finish`](Self::finish) once the source ends. Emitted text never
/// contains more than two consecutive newlines, counted across fragments.
///
/// # Examples
///
/// ```
/// use scrivener_workflow::ThinkTagFilter;
///
/// let mut filter = ThinkTagFilter::new();
/// let mut out = filter.push("答案<thi");
/// out += &filter.push("nk>草稿</think>是42");
/// out += &filter.finish();
/// assert_eq!(out, "答案是42");
/// ```
#[derive(Debug, Default, Clone)]
pub struct ThinkTagFilter {
    buffer: String,
    in_think: bool,
    newline_run: usize,
}

impl ThinkTagFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the filter is inside a suppressed span.
    pub fn in_think(&self) -> bool {
        self.in_think
    }

    /// Feed one fragment, returning the text now safe to emit.
    pub fn push(&mut self, fragment: &str) -> String {
        self.buffer.push_str(fragment);
        let mut out = String::new();

        while !self.buffer.is_empty() {
            if self.in_think {
                match find_first(&self.buffer, CLOSE_TAGS) {
                    Some((idx, tag)) => {
                        self.buffer.drain(..idx + tag.len());
                        self.in_think = false;
                        continue;
                    }
                    None => {
                        let len = self.buffer.chars().count();
                        if len > TAG_GUARD {
                            let cut = char_boundary(&self.buffer, len - TAG_GUARD);
                            self.buffer.drain(..cut);
                        }
                        break;
                    }
                }
            }

            let open = find_first(&self.buffer, OPEN_TAGS);
            let stray_close = find_first(&self.buffer, CLOSE_TAGS);

            // A close tag with no open tag before it drops everything up to it.
            if let Some((close_idx, close_tag)) = stray_close {
                if open.is_none_or(|(open_idx, _)| close_idx < open_idx) {
                    self.buffer.drain(..close_idx + close_tag.len());
                    continue;
                }
            }

            match open {
                None => {
                    let len = self.buffer.chars().count();
                    if len <= TAG_GUARD {
                        break;
                    }
                    let cut = char_boundary(&self.buffer, len - TAG_GUARD);
                    let visible: String = self.buffer.drain(..cut).collect();
                    self.emit(&visible, &mut out);
                }
                Some((open_idx, open_tag)) => {
                    let visible: String = self.buffer.drain(..open_idx).collect();
                    self.buffer.drain(..open_tag.len());
                    self.in_think = true;
                    self.emit(&visible, &mut out);
                }
            }
        }

        out
    }

    /// Flush held-back text. Text inside an unterminated span is dropped.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.buffer);
        let mut out = String::new();
        if !self.in_think {
            let cleaned = ANY_TAG.replace_all(&rest, "");
            self.emit(&cleaned, &mut out);
        }
        self.in_think = false;
        out
    }

    fn emit(&mut self, text: &str, out: &mut String) {
        for ch in text.chars() {
            if ch == '\n' {
                if self.newline_run >= 2 {
                    continue;
                }
                self.newline_run += 1;
            } else {
                self.newline_run = 0;
            }
            out.push(ch);
        }
    }
}

/// Sanitize a complete text in one pass.
///
/// ```
/// use scrivener_workflow::sanitize;
///
/// assert_eq!(sanitize("a\n\n\n\nb<thinking>x</thinking>"), "a\n\nb");
/// ```
pub fn sanitize(text: &str) -> String {
    let mut filter = ThinkTagFilter::new();
    let mut out = filter.push(text);
    out.push_str(&filter.finish());
    out
}

/// Wrap a fragment stream so it yields only visible, non-empty text.
///
/// Errors pass through unchanged and end the stream.
pub fn sanitized(inner: TextStream) -> TextStream {
    Box::pin(async_stream::stream! {
        let mut inner = inner;
        let mut filter = ThinkTagFilter::new();
        while let Some(item) = inner.next().await {
            match item {
                Ok(fragment) => {
                    let visible = filter.push(&fragment);
                    if !visible.is_empty() {
                        yield Ok(visible);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
        let tail = filter.finish();
        if !tail.is_empty() {
            yield Ok(tail);
        }
    })
}
