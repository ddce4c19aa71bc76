//! Image placeholder markers and word counting.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a complete `[配图建议|名称:...]` marker.
pub static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[配图建议\|名称:[^\]]+\]").expect("Valid placeholder regex"));

const SNIPPET_CHARS: usize = 12;

fn is_snippet_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&ch)
}

fn placeholder_count(total_chars: usize) -> usize {
    if total_chars < 700 {
        1
    } else if total_chars < 1500 {
        2
    } else {
        3
    }
}

fn snippet_for(paragraph: &str, seq: usize) -> String {
    let snippet: String = paragraph
        .chars()
        .filter(|c| is_snippet_char(*c))
        .take(SNIPPET_CHARS)
        .collect();
    if snippet.is_empty() {
        format!("场景{seq}")
    } else {
        snippet
    }
}

fn marker(snippet: &str) -> String {
    format!("[配图建议|名称:{snippet}配图|说明:围绕“{snippet}”设计与段落语义一致的画面]")
}

/// Guarantee the text carries at least one image placeholder.
///
/// Text that is blank or already has a marker is returned unchanged.
/// Otherwise one to three markers are inserted after evenly spaced
/// paragraphs and paragraphs are re-joined with blank lines.
///
/// # Examples
///
/// ```
/// use scrivener_workflow::{PLACEHOLDER, ensure_image_placeholders};
///
/// let out = ensure_image_placeholders("清晨的山谷里雾气弥漫。\n午后阳光洒满田野。");
/// assert_eq!(PLACEHOLDER.find_iter(&out).count(), 1);
/// assert!(out.starts_with("清晨的山谷里雾气弥漫。"));
/// ```
pub fn ensure_image_placeholders(text: &str) -> String {
    if text.trim().is_empty() || PLACEHOLDER.is_match(text) {
        return text.to_string();
    }

    let paragraphs: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let total_chars: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
    let len = paragraphs.len();

    let mut indices: Vec<usize> = [len / 4, len / 2, 3 * len / 4]
        .into_iter()
        .take(placeholder_count(total_chars))
        .filter(|idx| *idx < len)
        .collect();
    indices.sort_unstable();
    indices.dedup();
    if indices.is_empty() {
        indices.push(0);
    }

    let mut blocks = Vec::with_capacity(len + indices.len());
    let mut seq = 0;
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        blocks.push((*paragraph).to_string());
        if indices.contains(&idx) {
            seq += 1;
            blocks.push(marker(&snippet_for(paragraph, seq)));
        }
    }
    blocks.join("\n\n")
}

/// Character count of the text with markers and whitespace removed.
///
/// ```
/// use scrivener_workflow::count_actual_words;
///
/// assert_eq!(count_actual_words("你好 世界\n[配图建议|名称:x|说明:y]"), 4);
/// ```
pub fn count_actual_words(text: &str) -> usize {
    PLACEHOLDER
        .replace_all(text, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .count()
}
