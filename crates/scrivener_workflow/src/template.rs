//! Named-placeholder rendering for prompt templates.

/// Replace `{name}` with its value for every known name.
///
/// Unknown `{keys}`, stray braces and unterminated placeholders are copied
/// through verbatim. Substituted values are not re-scanned.
///
/// # Examples
///
/// ```
/// use scrivener_workflow::render_template;
///
/// let out = render_template("《{title}》{mood} {", &[("title", "秋日")]);
/// assert_eq!(out, "《秋日》{mood} {");
/// ```
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

const TITLE_CHARS: usize = 100;
const CONTENT_CHARS: usize = 500;

/// Render a cover style template against an article.
///
/// The template sees `{title}` and `{content}`, cut to 100 and 500
/// characters. A template mentioning neither gets both appended as
/// reference lines.
pub fn render_cover_prompt(template: &str, title: &str, content: &str) -> String {
    let title: String = title.trim().chars().take(TITLE_CHARS).collect();
    let content: String = content.trim().chars().take(CONTENT_CHARS).collect();

    let mut rendered = render_template(template, &[("title", &title), ("content", &content)]);
    if !template.contains("{title}") && !template.contains("{content}") {
        rendered.push_str(&format!(
            "\n\n文章标题参考：{title}\n文章核心内容摘要：{content}"
        ));
    }
    rendered.trim().to_string()
}
