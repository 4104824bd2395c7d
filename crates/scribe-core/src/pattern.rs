// Error pattern taxonomy and the per-pattern statistics record.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Linguistic area a recorded error belongs to.
///
/// Declaration order is the tie-break order for "most problematic" and
/// "strongest" area selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatternArea {
    Articles,
    VerbTenses,
    SubjectVerbAgreement,
    Prepositions,
    Plurals,
    Pronouns,
    WordOrder,
    Spelling,
    Punctuation,
    Capitalization,
    WordChoice,
    SentenceStructure,
}

impl PatternArea {
    pub const ALL: [PatternArea; 12] = [
        PatternArea::Articles,
        PatternArea::VerbTenses,
        PatternArea::SubjectVerbAgreement,
        PatternArea::Prepositions,
        PatternArea::Plurals,
        PatternArea::Pronouns,
        PatternArea::WordOrder,
        PatternArea::Spelling,
        PatternArea::Punctuation,
        PatternArea::Capitalization,
        PatternArea::WordChoice,
        PatternArea::SentenceStructure,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PatternArea::Articles => "Articles",
            PatternArea::VerbTenses => "Verb Tenses",
            PatternArea::SubjectVerbAgreement => "Subject-Verb Agreement",
            PatternArea::Prepositions => "Prepositions",
            PatternArea::Plurals => "Plurals",
            PatternArea::Pronouns => "Pronouns",
            PatternArea::WordOrder => "Word Order",
            PatternArea::Spelling => "Spelling",
            PatternArea::Punctuation => "Punctuation",
            PatternArea::Capitalization => "Capitalization",
            PatternArea::WordChoice => "Word Choice",
            PatternArea::SentenceStructure => "Sentence Structure",
        }
    }

    /// The fixed subcategories tracked for this area.
    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            PatternArea::Articles => &[
                sub::MISSING_ARTICLE,
                sub::UNNECESSARY_ARTICLE,
                sub::WRONG_ARTICLE,
            ],
            PatternArea::VerbTenses => &[
                sub::PAST_TENSE,
                sub::PRESENT_PERFECT,
                sub::FUTURE_TENSE,
                sub::TENSE_CONSISTENCY,
            ],
            PatternArea::SubjectVerbAgreement => &[sub::THIRD_PERSON_SINGULAR, sub::PLURAL_SUBJECT],
            PatternArea::Prepositions => &[
                sub::TIME_PREPOSITION,
                sub::PLACE_PREPOSITION,
                sub::DEPENDENT_PREPOSITION,
            ],
            PatternArea::Plurals => &[sub::IRREGULAR_PLURAL, sub::COUNTABILITY],
            PatternArea::Pronouns => &[sub::PRONOUN_AGREEMENT],
            PatternArea::WordOrder => &[
                sub::ADJECTIVE_ORDER,
                sub::QUESTION_ORDER,
                sub::ADVERB_PLACEMENT,
            ],
            PatternArea::Spelling => &[sub::MISSPELLING, sub::HOMOPHONE],
            PatternArea::Punctuation => &[sub::COMMA, sub::APOSTROPHE, sub::END_PUNCTUATION],
            PatternArea::Capitalization => &[sub::SENTENCE_START, sub::PROPER_NOUN],
            PatternArea::WordChoice => &[sub::VOCABULARY_ENHANCEMENT, sub::FORMALITY],
            PatternArea::SentenceStructure => &[sub::RUN_ON, sub::FRAGMENT],
        }
    }
}

impl std::fmt::Display for PatternArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Subcategory names.
pub mod sub {
    pub const MISSING_ARTICLE: &str = "Missing Article";
    pub const UNNECESSARY_ARTICLE: &str = "Unnecessary Article";
    pub const WRONG_ARTICLE: &str = "Wrong Article";
    pub const PAST_TENSE: &str = "Past Tense";
    pub const PRESENT_PERFECT: &str = "Present Perfect";
    pub const FUTURE_TENSE: &str = "Future Tense";
    pub const TENSE_CONSISTENCY: &str = "Tense Consistency";
    pub const THIRD_PERSON_SINGULAR: &str = "Third Person Singular";
    pub const PLURAL_SUBJECT: &str = "Plural Subject";
    pub const TIME_PREPOSITION: &str = "Time Prepositions";
    pub const PLACE_PREPOSITION: &str = "Place Prepositions";
    pub const DEPENDENT_PREPOSITION: &str = "Dependent Prepositions";
    pub const IRREGULAR_PLURAL: &str = "Irregular Plurals";
    pub const COUNTABILITY: &str = "Countable/Uncountable Nouns";
    pub const PRONOUN_AGREEMENT: &str = "Pronoun Agreement";
    pub const ADJECTIVE_ORDER: &str = "Adjective Order";
    pub const QUESTION_ORDER: &str = "Question Word Order";
    pub const ADVERB_PLACEMENT: &str = "Adverb Placement";
    pub const MISSPELLING: &str = "Misspelling";
    pub const HOMOPHONE: &str = "Homophones";
    pub const COMMA: &str = "Commas";
    pub const APOSTROPHE: &str = "Apostrophes";
    pub const END_PUNCTUATION: &str = "End Punctuation";
    pub const SENTENCE_START: &str = "Sentence Start";
    pub const PROPER_NOUN: &str = "Proper Nouns";
    pub const VOCABULARY_ENHANCEMENT: &str = "Vocabulary Enhancement";
    pub const FORMALITY: &str = "Formality";
    pub const RUN_ON: &str = "Run-on Sentences";
    pub const FRAGMENT: &str = "Sentence Fragments";
}

/// `(area, subcategory)` key of one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternKey {
    pub area: PatternArea,
    pub subcategory: String,
}

impl PatternKey {
    pub fn new(area: PatternArea, subcategory: impl Into<String>) -> Self {
        Self {
            area,
            subcategory: subcategory.into(),
        }
    }

    /// Whether the key names a subcategory of the fixed taxonomy.
    pub fn is_known(&self) -> bool {
        self.area.subcategories().contains(&self.subcategory.as_str())
    }
}

impl std::fmt::Display for PatternKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.area, self.subcategory)
    }
}

/// Accuracy percentage for `errors` out of `opportunities`, clamped to
/// `[0, 100]`. No opportunities means no evidence of errors: 100.
pub fn accuracy(errors: u64, opportunities: u64) -> f64 {
    if opportunities == 0 {
        return 100.0;
    }
    let ratio = errors as f64 / opportunities as f64;
    (100.0 * (1.0 - ratio)).clamp(0.0, 100.0)
}

/// One recorded correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentError {
    pub text: String,
    pub correction: String,
    pub timestamp: DateTime<Utc>,
}

/// Longitudinal statistics for one `(area, subcategory)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    pub area: PatternArea,
    pub subcategory: String,
    pub count: u64,
    pub total_opportunities: u64,
    pub accuracy: f64,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub recent_errors: VecDeque<RecentError>,
}

impl ErrorPattern {
    pub fn new(key: &PatternKey) -> Self {
        Self {
            area: key.area,
            subcategory: key.subcategory.clone(),
            count: 0,
            total_opportunities: 0,
            accuracy: 100.0,
            examples: Vec::new(),
            recent_errors: VecDeque::new(),
        }
    }

    pub fn key(&self) -> PatternKey {
        PatternKey::new(self.area, self.subcategory.clone())
    }

    pub fn recompute_accuracy(&mut self) {
        self.accuracy = accuracy(self.count, self.total_opportunities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_is_clamped() {
        assert_eq!(accuracy(0, 0), 100.0);
        assert_eq!(accuracy(0, 10), 100.0);
        assert_eq!(accuracy(5, 10), 50.0);
        assert_eq!(accuracy(10, 10), 0.0);
        assert_eq!(accuracy(50, 10), 0.0);
    }

    #[test]
    fn every_area_has_subcategories() {
        for area in PatternArea::ALL {
            assert!(!area.subcategories().is_empty(), "{area} has no subcategories");
        }
    }

    #[test]
    fn area_order_matches_declaration() {
        let mut sorted = PatternArea::ALL;
        sorted.sort();
        assert_eq!(sorted, PatternArea::ALL);
    }

    #[test]
    fn known_keys() {
        assert!(PatternKey::new(PatternArea::Articles, sub::MISSING_ARTICLE).is_known());
        assert!(!PatternKey::new(PatternArea::Articles, sub::COMMA).is_known());
    }

    #[test]
    fn new_pattern_starts_clean() {
        let p = ErrorPattern::new(&PatternKey::new(PatternArea::Spelling, sub::MISSPELLING));
        assert_eq!(p.count, 0);
        assert_eq!(p.total_opportunities, 0);
        assert_eq!(p.accuracy, 100.0);
        assert!(p.examples.is_empty());
    }
}
