//! Pulling the review verdict out of free-form model output.
//!
//! Reviewers are asked for bare JSON but often wrap it in a code fence or
//! surround it with commentary. Extraction tries a fenced block first, then
//! every balanced `{...}` span in order until one parses.

use scrivener_core::{ReviewFeedback, ReviewVerdict};
use serde_json::Value;

/// Parse a reviewer reply into feedback.
///
/// Never fails: a reply with no parseable JSON object becomes
/// [`ReviewFeedback::Unparsed`] carrying the raw text. Any object is a
/// verdict, whatever the shape of its fields.
///
/// # Examples
///
/// ```
/// use scrivener_workflow::parse_review_feedback;
///
/// let reply = "审核如下：\n```json\n{\"passed\": true, \"quality_scores\": {\"total\": 41}}\n```";
/// let feedback = parse_review_feedback(reply);
/// assert_eq!(feedback.total_score(), 41);
/// assert!(feedback.claims_pass());
/// ```
pub fn parse_review_feedback(text: &str) -> ReviewFeedback {
    match extract_json_object(text) {
        Some(Value::Object(object)) => ReviewFeedback::Verdict(ReviewVerdict::from(object)),
        _ => {
            tracing::warn!(reply_len = text.len(), "No JSON object in review reply");
            ReviewFeedback::unparsed("无法解析响应", text)
        }
    }
}

/// First JSON object found in the text.
pub fn extract_json_object(text: &str) -> Option<Value> {
    if let Some(block) = extract_from_code_block(text) {
        if let Some(value) = first_object(&block) {
            return Some(value);
        }
    }
    first_object(text)
}

fn first_object(text: &str) -> Option<Value> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        if let Some(span) = extract_balanced(&text[start..], '{', '}') {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
                return Some(value);
            }
        }
        from = start + 1;
    }
    None
}

/// Content of the first fenced block, with or without a language tag.
fn extract_from_code_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let content_start = start + 3;
    let skip_to = text[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    match text[skip_to..].find("```") {
        Some(end) => Some(text[skip_to..skip_to + end].trim().to_string()),
        // Unclosed fence, likely a truncated reply
        None => Some(text[skip_to..].trim().to_string()),
    }
}

/// Span from the leading `open` to its matching `close`, skipping
/// delimiters inside string literals.
fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
