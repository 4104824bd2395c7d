// Canonical suggestion model and the raw shape providers hand back.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Delimiter used when a two-part explanation crosses the UI boundary.
pub const EXPLANATION_DELIMITER: &str = " | ";

/// Confidence assigned when a provider omits it, by severity.
const DEFAULT_CONFIDENCE_ERROR: f32 = 0.9;
const DEFAULT_CONFIDENCE_WARNING: f32 = 0.7;
const DEFAULT_CONFIDENCE_SUGGESTION: f32 = 0.5;

// ---------------------------------------------------------------------------
// Category / Severity
// ---------------------------------------------------------------------------

/// What kind of problem a suggestion addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Grammar,
    Spelling,
    Vocabulary,
    Style,
    Clarity,
    Structure,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Grammar,
        Category::Spelling,
        Category::Vocabulary,
        Category::Style,
        Category::Clarity,
        Category::Structure,
    ];

    /// Map a free-form provider label to a category.
    ///
    /// Matching is case-insensitive and accepts the synonyms providers are
    /// known to use. Unknown labels return `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        let category = match label.as_str() {
            "grammar" | "grammatical" | "punctuation" | "agreement" | "tense" => Category::Grammar,
            "spelling" | "typo" | "misspelling" | "orthography" => Category::Spelling,
            "vocabulary" | "word choice" | "word_choice" | "enhancement" | "lexical" => {
                Category::Vocabulary
            }
            "style" | "tone" | "formality" => Category::Style,
            "clarity" | "readability" | "conciseness" => Category::Clarity,
            "structure" | "sentence structure" | "organization" | "organisation" => {
                Category::Structure
            }
            _ => return None,
        };
        Some(category)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Grammar => "grammar",
            Category::Spelling => "spelling",
            Category::Vocabulary => "vocabulary",
            Category::Style => "style",
            Category::Clarity => "clarity",
            Category::Structure => "structure",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity, ordered `Suggestion < Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Suggestion,
    Warning,
    Error,
}

impl Severity {
    /// Case-insensitive label mapping. Unknown labels return `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "error" | "critical" | "high" => Some(Severity::Error),
            "warning" | "warn" | "medium" => Some(Severity::Warning),
            "suggestion" | "info" | "hint" | "low" => Some(Severity::Suggestion),
            _ => None,
        }
    }

    /// Confidence used when the provider does not report one.
    pub fn default_confidence(&self) -> f32 {
        match self {
            Severity::Error => DEFAULT_CONFIDENCE_ERROR,
            Severity::Warning => DEFAULT_CONFIDENCE_WARNING,
            Severity::Suggestion => DEFAULT_CONFIDENCE_SUGGESTION,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        }
    }
}

// ---------------------------------------------------------------------------
// Explanation
// ---------------------------------------------------------------------------

/// Human-readable rationale, optionally with a second-language rendering.
///
/// The engine never looks inside; it is only split from and joined back into
/// the delimited form at the UI boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Explanation {
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl Explanation {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    pub fn bilingual(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Some(secondary.into()),
        }
    }

    /// Split `"english | native"` on the first delimiter. Empty halves are
    /// dropped.
    pub fn parse_delimited(s: &str) -> Self {
        match s.split_once(EXPLANATION_DELIMITER) {
            Some((primary, secondary)) => {
                let secondary = secondary.trim();
                Self {
                    primary: primary.trim().to_string(),
                    secondary: (!secondary.is_empty()).then(|| secondary.to_string()),
                }
            }
            None => Self::new(s.trim()),
        }
    }

    pub fn to_delimited(&self) -> String {
        match &self.secondary {
            Some(secondary) => format!("{}{}{}", self.primary, EXPLANATION_DELIMITER, secondary),
            None => self.primary.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

/// Opaque suggestion identifier. Never reused within a document session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(String);

impl SuggestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier in the `provider-seq-index-start` form.
    pub fn for_provider(provider: &str, issue_seq: u64, index: usize, start: usize) -> Self {
        Self(format!("{provider}-{issue_seq}-{index}-{start}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A located, canonical suggestion anchored to the current text buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: SuggestionId,
    pub category: Category,
    pub severity: Severity,
    pub span: Span,
    /// Exact text the span must reproduce in the buffer.
    pub original_text: String,
    pub replacement_text: String,
    pub explanation: Explanation,
    /// In `[0, 1]`.
    pub confidence: f32,
    /// Priority of the producing provider; lower wins overlaps.
    pub source_rank: u32,
}

impl Suggestion {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Whether two suggestions propose the same change at the same place.
    pub fn same_change(&self, other: &Suggestion) -> bool {
        self.span == other.span
            && self.category == other.category
            && self.original_text == other.original_text
            && self.replacement_text == other.replacement_text
    }
}

// ---------------------------------------------------------------------------
// RawSuggestion
// ---------------------------------------------------------------------------

/// One unvalidated item as reported by an analysis provider.
///
/// Offsets, when present, are char offsets into the text the provider saw,
/// which may no longer be the current text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSuggestion {
    pub category: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(alias = "original")]
    pub original_text: String,
    #[serde(alias = "replacement", alias = "suggestion")]
    pub replacement_text: String,
    #[serde(default, alias = "message")]
    pub explanation: String,
    #[serde(default, alias = "start")]
    pub reported_start: Option<usize>,
    #[serde(default, alias = "end")]
    pub reported_end: Option<usize>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl RawSuggestion {
    pub fn new(
        category: impl Into<String>,
        original_text: impl Into<String>,
        replacement_text: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            original_text: original_text.into(),
            replacement_text: replacement_text.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, start: usize, end: usize) -> Self {
        self.reported_start = Some(start);
        self.reported_end = Some(end);
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
