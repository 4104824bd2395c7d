// FallbackProvider: data-driven word/phrase replacement rules.
//
// Each rule is a regex fragment matched case-insensitively on word
// boundaries. A match in a capitalized position gets a capitalized
// replacement. Offsets are reported in chars.

use regex::{Regex, RegexBuilder};
use scribe_core::RawSuggestion;
use scribe_core::span::byte_to_char_offset;
use serde::{Deserialize, Serialize};
use tracing::warn;

fn default_category() -> String {
    "grammar".to_string()
}

/// One replacement rule as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    /// Regex fragment; wrapped in `\b(?:...)\b` and matched ignoring case.
    pub pattern: String,
    pub replacement: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

impl FallbackRule {
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            category: category.into(),
            severity: None,
            explanation: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn compile(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&format!(r"\b(?:{})\b", self.pattern))
            .case_insensitive(true)
            .build()
    }
}

// ---------------------------------------------------------------------------
// Built-in table
// ---------------------------------------------------------------------------

/// (pattern, replacement, category, explanation)
const BUILTIN_RULES: &[(&str, &str, &str, &str)] = &[
    // Spelling
    ("alot", "a lot", "spelling", "\"A lot\" is two words."),
    ("recieve", "receive", "spelling", "Remember: i before e, except after c."),
    ("definately", "definitely", "spelling", "Common misspelling."),
    ("seperate", "separate", "spelling", "Common misspelling."),
    ("untill", "until", "spelling", "\"Until\" has one l."),
    ("wich", "which", "spelling", "Common misspelling."),
    ("becuase", "because", "spelling", "Common misspelling."),
    ("teh", "the", "spelling", "Typo."),
    ("irregardless", "regardless", "spelling", "\"Irregardless\" is nonstandard."),
    // Irregular past tense
    ("goed", "went", "grammar", "\"Go\" has an irregular past tense: went."),
    ("buyed", "bought", "grammar", "\"Buy\" has an irregular past tense: bought."),
    ("thinked", "thought", "grammar", "\"Think\" has an irregular past tense: thought."),
    ("eated", "ate", "grammar", "\"Eat\" has an irregular past tense: ate."),
    ("teached", "taught", "grammar", "\"Teach\" has an irregular past tense: taught."),
    ("catched", "caught", "grammar", "\"Catch\" has an irregular past tense: caught."),
    // Plurals and countability
    ("childs", "children", "grammar", "Irregular plural: children."),
    ("informations", "information", "grammar", "\"Information\" is an uncountable noun."),
    ("advices", "advice", "grammar", "\"Advice\" is an uncountable noun."),
    ("furnitures", "furniture", "grammar", "\"Furniture\" is an uncountable noun."),
    // Agreement
    ("he don't", "he doesn't", "grammar", "Third person singular takes \"doesn't\"."),
    ("she don't", "she doesn't", "grammar", "Third person singular takes \"doesn't\"."),
    ("it don't", "it doesn't", "grammar", "Third person singular takes \"doesn't\"."),
    // Modal + of
    ("could of", "could have", "grammar", "Use \"could have\", not \"could of\"."),
    ("should of", "should have", "grammar", "Use \"should have\", not \"should of\"."),
    ("would of", "would have", "grammar", "Use \"would have\", not \"would of\"."),
    // Prepositions
    ("discuss about", "discuss", "grammar", "\"Discuss\" takes no preposition."),
    ("married with", "married to", "grammar", "The dependent preposition is \"married to\"."),
    ("depend of", "depend on", "grammar", "The dependent preposition is \"depend on\"."),
    ("explain me", "explain to me", "grammar", "\"Explain\" needs \"to\" before the listener."),
    // Comparatives
    ("more better", "better", "grammar", "\"Better\" is already comparative."),
    // Style
    ("very unique", "unique", "style", "\"Unique\" cannot be graded."),
    ("in order to", "to", "clarity", "\"To\" is shorter and clearer."),
];

struct CompiledRule {
    rule: FallbackRule,
    regex: Regex,
}

/// Rule-table provider usable without any network capability.
pub struct FallbackProvider {
    rules: Vec<CompiledRule>,
}

impl std::fmt::Debug for FallbackProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackProvider")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl FallbackProvider {
    pub const NAME: &'static str = "fallback";

    /// Provider over the built-in table only.
    pub fn builtin() -> Self {
        let rules = builtin_rules()
            .into_iter()
            .filter_map(|rule| match rule.compile() {
                Ok(regex) => Some(CompiledRule { rule, regex }),
                Err(e) => {
                    warn!(pattern = %rule.pattern, error = %e, "skipping built-in fallback rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Built-in table followed by `extra`.
    pub fn with_rules(extra: &[FallbackRule]) -> Result<Self, regex::Error> {
        let mut provider = Self::builtin();
        for rule in extra {
            let regex = rule.compile()?;
            provider.rules.push(CompiledRule {
                rule: rule.clone(),
                regex,
            });
        }
        Ok(provider)
    }

    /// Only the given rules, without the built-in table.
    pub fn from_rules(rules: &[FallbackRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                rule.compile().map(|regex| CompiledRule {
                    rule: rule.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over `text`. Results are ordered by start; overlaps
    /// between rules are left to the resolver.
    pub fn scan(&self, text: &str) -> Vec<RawSuggestion> {
        let mut out = Vec::new();
        for CompiledRule { rule, regex } in &self.rules {
            for m in regex.find_iter(text) {
                let matched = m.as_str();
                let replacement = match_capital(matched, &rule.replacement);
                if replacement == matched {
                    continue;
                }
                let start = byte_to_char_offset(text, m.start());
                let end = start + matched.chars().count();
                let mut raw = RawSuggestion::new(rule.category.clone(), matched, replacement)
                    .at(start, end)
                    .with_explanation(rule.explanation.clone());
                raw.severity = rule.severity.clone();
                out.push(raw);
            }
        }
        out.sort_by_key(|r| r.reported_start);
        out
    }
}

impl Default for FallbackProvider {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_rules() -> Vec<FallbackRule> {
    BUILTIN_RULES
        .iter()
        .map(|&(pattern, replacement, category, explanation)| {
            FallbackRule::new(pattern, replacement, category).with_explanation(explanation)
        })
        .collect()
}

/// Uppercase the replacement's first letter when the matched text starts
/// with an uppercase letter.
fn match_capital(matched: &str, replacement: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper && first.is_lowercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => replacement.to_string(),
    }
}

#[cfg(feature = "providers")]
#[async_trait::async_trait]
impl super::AnalysisProvider for FallbackProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn analyze(&self, text: &str) -> Result<Vec<RawSuggestion>, scribe_core::ProviderError> {
        Ok(self.scan(text))
    }
}
