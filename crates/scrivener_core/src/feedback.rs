//! Structured review feedback.
//!
//! The orchestrator only reads the total and the pass flag; the rest is
//! carried through to persistence and callers untouched. Reviewers do not
//! always follow the requested schema, so the verdict keeps the object as
//! printed and every field is read leniently: a sub-score of `"8"` is 8, an
//! issue given as a bare string is an issue with only a description, and a
//! field of an unexpected shape is simply absent from the typed view.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// AI-likeness verdict and evidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AiDetection {
    /// Whether the text reads as machine-written, when the reviewer said so plainly
    pub has_ai_smell: Option<bool>,
    /// Patterns that gave it away
    pub issues: Vec<String>,
    /// Offending excerpts
    pub examples: Vec<String>,
}

/// Five sub-scores (0-10 each) and their total (0-50).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityScores {
    /// Gets to the point
    pub directness: Option<f64>,
    /// Sentence rhythm
    pub rhythm: Option<f64>,
    /// Reader trust
    pub trust: Option<f64>,
    /// Reads as human-written
    pub authenticity: Option<f64>,
    /// No filler
    pub conciseness: Option<f64>,
    /// Sum of the five
    pub total: Option<f64>,
}

/// One flagged problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewIssue {
    /// Issue category
    #[serde(rename = "type")]
    pub kind: String,
    /// `high`, `medium` or `low`
    pub severity: String,
    /// Where in the text
    pub location: String,
    /// What is wrong
    pub description: String,
    /// Suggested fix
    pub suggestion: String,
}

/// A parsed reviewer verdict: the JSON object exactly as the reviewer printed it.
///
/// # Examples
///
/// ```
/// use scrivener_core::ReviewVerdict;
/// use serde_json::json;
///
/// let verdict = ReviewVerdict::try_from(json!({
///     "quality_scores": {"total": "42", "authenticity": "7分"},
///     "issues": ["开头太套路"],
///     "passed": "true"
/// }))
/// .unwrap();
/// assert_eq!(verdict.quality_scores().unwrap().total, Some(42.0));
/// assert_eq!(verdict.quality_scores().unwrap().authenticity, Some(7.0));
/// assert_eq!(verdict.issues()[0].description, "开头太套路");
/// assert_eq!(verdict.passed(), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewVerdict(Map<String, Value>);

impl ReviewVerdict {
    /// The object as printed.
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Scores section, when the reviewer gave one as an object.
    pub fn quality_scores(&self) -> Option<QualityScores> {
        let scores = self.0.get("quality_scores")?.as_object()?;
        let score = |key: &str| scores.get(key).and_then(lenient_number);
        Some(QualityScores {
            directness: score("directness"),
            rhythm: score("rhythm"),
            trust: score("trust"),
            authenticity: score("authenticity"),
            conciseness: score("conciseness"),
            total: score("total"),
        })
    }

    /// AI-likeness section, when the reviewer gave one as an object.
    pub fn ai_detection(&self) -> Option<AiDetection> {
        let section = self.0.get("ai_detection")?.as_object()?;
        Some(AiDetection {
            has_ai_smell: section.get("has_ai_smell").and_then(lenient_bool),
            issues: text_list(section.get("issues")),
            examples: text_list(section.get("examples")),
        })
    }

    /// Flagged issues. Objects map field by field; bare strings become descriptions.
    pub fn issues(&self) -> Vec<ReviewIssue> {
        let Some(Value::Array(items)) = self.0.get("issues") else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::Object(fields) => {
                    let field = |key: &str| {
                        fields
                            .get(key)
                            .and_then(lenient_text)
                            .unwrap_or_default()
                    };
                    Some(ReviewIssue {
                        kind: field("type"),
                        severity: field("severity"),
                        location: field("location"),
                        description: field("description"),
                        suggestion: field("suggestion"),
                    })
                }
                other => lenient_text(other).map(|description| ReviewIssue {
                    description,
                    ..ReviewIssue::default()
                }),
            })
            .collect()
    }

    /// Reviewer's own pass flag.
    pub fn passed(&self) -> Option<bool> {
        self.0.get("passed").and_then(lenient_bool)
    }

    /// Rationale, when non-blank.
    pub fn reason(&self) -> Option<&str> {
        self.0
            .get("reason")
            .and_then(Value::as_str)
            .filter(|reason| !reason.trim().is_empty())
    }
}

impl From<Map<String, Value>> for ReviewVerdict {
    fn from(object: Map<String, Value>) -> Self {
        Self(object)
    }
}

impl TryFrom<Value> for ReviewVerdict {
    type Error = Value;

    /// Only JSON objects are verdicts; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(object) => Ok(Self(object)),
            other => Err(other),
        }
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            text.parse().ok().or_else(|| {
                // Leading number of text like "8分" or "42/50"
                let end = text
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(text.len());
                text[..end].parse().ok()
            })
        }
        _ => None,
    }
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "pass" | "passed" | "是" | "通过" => Some(true),
            "false" | "no" | "fail" | "failed" | "否" | "不通过" | "未通过" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(lenient_text).collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text.clone()],
        _ => Vec::new(),
    }
}

/// Review feedback: either a parsed verdict or the raw text that failed to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewFeedback {
    /// Reviewer output had no JSON object
    Unparsed {
        /// Parse failure description
        error: String,
        /// Full reviewer output
        raw: String,
    },
    /// Parsed verdict
    Verdict(ReviewVerdict),
}

impl ReviewFeedback {
    /// Error-shaped feedback carrying the raw reviewer output.
    pub fn unparsed(error: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Unparsed {
            error: error.into(),
            raw: raw.into(),
        }
    }

    /// Whether the reviewer produced a verdict at all.
    ///
    /// Unparsed feedback carries no scores; the review step reports it as
    /// a failed step rather than scoring it.
    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::Verdict(_))
    }

    /// Total score, rounded. A verdict without a readable total scores a
    /// full 50; unparsed feedback has no score and reports 0.
    ///
    /// ```
    /// use scrivener_core::ReviewFeedback;
    ///
    /// let feedback: ReviewFeedback =
    ///     serde_json::from_str(r#"{"quality_scores":{"total":41.6},"passed":true}"#).unwrap();
    /// assert_eq!(feedback.total_score(), 42);
    /// assert_eq!(ReviewFeedback::unparsed("bad", "").total_score(), 0);
    /// ```
    pub fn total_score(&self) -> i64 {
        match self {
            Self::Unparsed { .. } => 0,
            Self::Verdict(verdict) => verdict
                .quality_scores()
                .and_then(|scores| scores.total)
                .map(|total| total.round() as i64)
                .unwrap_or(50),
        }
    }

    /// Authenticity sub-score, defaulting to 10.
    pub fn ai_score(&self) -> i64 {
        match self {
            Self::Unparsed { .. } => 0,
            Self::Verdict(verdict) => verdict
                .quality_scores()
                .and_then(|scores| scores.authenticity)
                .map(|score| score.round() as i64)
                .unwrap_or(10),
        }
    }

    /// The reviewer's own pass flag, defaulting to true for verdicts.
    pub fn claims_pass(&self) -> bool {
        match self {
            Self::Unparsed { .. } => false,
            Self::Verdict(verdict) => verdict.passed().unwrap_or(true),
        }
    }

    /// Pass flag after the score floor: a total below `threshold` always fails.
    pub fn passes(&self, threshold: i64) -> bool {
        self.claims_pass() && self.total_score() >= threshold
    }

    /// Rationale, when the reviewer gave one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Unparsed { .. } => None,
            Self::Verdict(verdict) => verdict.reason(),
        }
    }

    /// JSON form for persistence and state snapshots.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
