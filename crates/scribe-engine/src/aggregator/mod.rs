//! Longitudinal error pattern statistics.
//!
//! The aggregator consumes lifecycle events from the suggestion store and
//! keeps one [`ErrorPattern`] per `(area, subcategory)` of the fixed
//! taxonomy. Accuracy is `100 * (1 - count / opportunities)`, so both sides of
//! the ratio are tracked: accepted fixes add an error and an opportunity,
//! analyzed text adds opportunities only.

pub mod rules;

use chrono::{DateTime, Utc};
use scribe_core::pattern::{self, sub};
use scribe_core::{
    ErrorPattern, LifecycleEvent, LifecycleKind, PatternArea, PatternKey, RecentError, Suggestion,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AggregatorConfig;
use rules::{
    ARTICLES, HOMOPHONE_GROUPS, IRREGULAR_PAST, PLURAL_SUBJECTS, PREPOSITIONS, PRONOUNS,
    RuleTable, SINGULAR_SUBJECTS, TIME_PLACE_PREPOSITIONS, UNCOUNTABLE, words,
};

/// How often suggestions were shown, accepted and dismissed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub shown: u64,
    pub accepted: u64,
    pub dismissed: u64,
}

impl Engagement {
    /// Accepted share of resolved suggestions, in percent.
    pub fn acceptance_rate(&self) -> Option<f64> {
        let resolved = self.accepted + self.dismissed;
        (resolved > 0).then(|| 100.0 * self.accepted as f64 / resolved as f64)
    }
}

/// Per-area totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSummary {
    pub area: PatternArea,
    pub errors: u64,
    pub opportunities: u64,
    pub accuracy: f64,
}

/// Exportable statistics report; also the persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    pub patterns: Vec<ErrorPattern>,
    pub areas: Vec<AreaSummary>,
    pub overall_accuracy: f64,
    pub total_errors: u64,
    pub most_problematic_area: Option<PatternArea>,
    pub strongest_area: Option<PatternArea>,
    #[serde(default)]
    pub engagement: Engagement,
    pub last_updated: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// ErrorPatternAggregator
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ErrorPatternAggregator {
    rules: RuleTable,
    /// Taxonomy order: areas in declaration order, subcategories as listed.
    patterns: Vec<ErrorPattern>,
    engagement: Engagement,
    max_examples: usize,
    max_recent_errors: usize,
    last_updated: Option<DateTime<Utc>>,
}

impl Default for ErrorPatternAggregator {
    fn default() -> Self {
        Self::new(&AggregatorConfig::default())
    }
}

impl ErrorPatternAggregator {
    /// Aggregator with zero counts for the whole taxonomy.
    pub fn new(config: &AggregatorConfig) -> Self {
        let patterns = PatternArea::ALL
            .iter()
            .flat_map(|area| {
                area.subcategories()
                    .iter()
                    .map(move |sub| ErrorPattern::new(&PatternKey::new(*area, *sub)))
            })
            .collect();
        Self {
            rules: RuleTable::builtin(),
            patterns,
            engagement: Engagement::default(),
            max_examples: config.max_examples,
            max_recent_errors: config.max_recent_errors,
            last_updated: None,
        }
    }

    /// Rebuild an aggregator from a persisted report.
    pub fn from_report(report: PatternReport, config: &AggregatorConfig) -> Self {
        let mut aggregator = Self::new(config);
        aggregator.restore(report.patterns);
        aggregator.engagement = report.engagement;
        aggregator.last_updated = report.last_updated;
        aggregator
    }

    pub fn patterns(&self) -> &[ErrorPattern] {
        &self.patterns
    }

    pub fn pattern(&self, key: &PatternKey) -> Option<&ErrorPattern> {
        self.patterns
            .iter()
            .find(|p| p.area == key.area && p.subcategory == key.subcategory)
    }

    pub fn engagement(&self) -> Engagement {
        self.engagement
    }

    fn pattern_mut(&mut self, key: &PatternKey) -> Option<&mut ErrorPattern> {
        self.patterns
            .iter_mut()
            .find(|p| p.area == key.area && p.subcategory == key.subcategory)
    }

    // -----------------------------------------------------------------------
    // Categorization and recording
    // -----------------------------------------------------------------------

    pub fn categorize(&self, suggestion: &Suggestion) -> Option<PatternKey> {
        self.rules.categorize(
            suggestion.category,
            &suggestion.original_text,
            &suggestion.replacement_text,
            &suggestion.explanation,
        )
    }

    pub fn categorize_event(&self, event: &LifecycleEvent) -> Option<PatternKey> {
        self.rules.categorize(
            event.category,
            &event.original_text,
            &event.replacement_text,
            &event.explanation,
        )
    }

    /// Record one fixed error. Returns `false` for keys outside the taxonomy.
    pub fn record_fixed(&mut self, key: &PatternKey, original: &str, correction: &str) -> bool {
        self.record_fixed_at(key, original, correction, Utc::now())
    }

    pub fn record_fixed_at(
        &mut self,
        key: &PatternKey,
        original: &str,
        correction: &str,
        at: DateTime<Utc>,
    ) -> bool {
        let max_examples = self.max_examples;
        let max_recent = self.max_recent_errors;
        let Some(pattern) = self.pattern_mut(key) else {
            return false;
        };

        pattern.count += 1;
        pattern.total_opportunities += 1;
        pattern.recompute_accuracy();

        pattern.examples.retain(|e| e != original);
        pattern.examples.push(original.to_string());
        if pattern.examples.len() > max_examples {
            let excess = pattern.examples.len() - max_examples;
            pattern.examples.drain(..excess);
        }

        pattern.recent_errors.push_back(RecentError {
            text: original.to_string(),
            correction: correction.to_string(),
            timestamp: at,
        });
        while pattern.recent_errors.len() > max_recent {
            pattern.recent_errors.pop_front();
        }

        self.last_updated = Some(at);
        true
    }

    /// Add `n` opportunities without an error.
    pub fn record_opportunities(&mut self, key: &PatternKey, n: u64) -> bool {
        if n == 0 {
            return self.pattern(key).is_some();
        }
        let Some(pattern) = self.pattern_mut(key) else {
            return false;
        };
        pattern.total_opportunities += n;
        pattern.recompute_accuracy();
        self.last_updated = Some(Utc::now());
        true
    }

    /// Feed one lifecycle event. Accepted suggestions are categorized and
    /// recorded; every event updates engagement. Returns the recorded key.
    pub fn observe(&mut self, event: &LifecycleEvent) -> Option<PatternKey> {
        match event.kind {
            LifecycleKind::Shown => {
                self.engagement.shown += 1;
                None
            }
            LifecycleKind::Dismissed => {
                self.engagement.dismissed += 1;
                None
            }
            LifecycleKind::Accepted => {
                self.engagement.accepted += 1;
                let Some(key) = self.categorize_event(event) else {
                    debug!(id = %event.id, "accepted suggestion is uncategorized");
                    return None;
                };
                self.record_fixed(&key, &event.original_text, &event.replacement_text);
                Some(key)
            }
        }
    }

    pub fn observe_all<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a LifecycleEvent>,
    ) -> usize {
        events
            .into_iter()
            .filter_map(|event| self.observe(event))
            .count()
    }

    // -----------------------------------------------------------------------
    // Opportunities
    // -----------------------------------------------------------------------

    /// Rough per-pattern opportunity counts for `text`, from token statistics.
    /// Patterns with no opportunity are omitted.
    pub fn estimate_opportunities(&self, text: &str) -> Vec<(PatternKey, u64)> {
        let tokens = words(text);
        if tokens.is_empty() {
            return Vec::new();
        }
        let count =
            |set: &[&str]| tokens.iter().filter(|w| set.contains(&w.as_str())).count() as u64;
        let count_where =
            |f: &dyn Fn(&str) -> bool| tokens.iter().filter(|w| f(w.as_str())).count() as u64;
        let chars = |set: &[char]| text.chars().filter(|c| set.contains(c)).count() as u64;

        let word_count = tokens.len() as u64;
        let sentences = sentence_count(text);
        let articles = count(ARTICLES);
        let time_place = count(TIME_PLACE_PREPOSITIONS);
        let prepositions = count(PREPOSITIONS);
        let past = count_where(&|w| w.ends_with("ed") || IRREGULAR_PAST.contains(&w));
        let perfect = count(&["have", "has", "had"]);
        let future = count(&["will", "going"]);
        let plural_like = count_where(&|w| w.len() > 3 && w.ends_with('s'));
        let uncountable = count(UNCOUNTABLE);
        let homophones = count_where(&|w| HOMOPHONE_GROUPS.iter().any(|g| g.contains(&w)));
        let adverbs = count_where(&|w| w.len() > 3 && w.ends_with("ly"));
        let capitalized_inside = capitalized_mid_sentence(text);

        let mut out = vec![
            (PatternKey::new(PatternArea::Articles, sub::MISSING_ARTICLE), articles),
            (PatternKey::new(PatternArea::Articles, sub::UNNECESSARY_ARTICLE), articles),
            (PatternKey::new(PatternArea::Articles, sub::WRONG_ARTICLE), articles),
            (PatternKey::new(PatternArea::VerbTenses, sub::PAST_TENSE), past),
            (PatternKey::new(PatternArea::VerbTenses, sub::PRESENT_PERFECT), perfect),
            (PatternKey::new(PatternArea::VerbTenses, sub::FUTURE_TENSE), future),
            (PatternKey::new(PatternArea::VerbTenses, sub::TENSE_CONSISTENCY), sentences),
            (
                PatternKey::new(PatternArea::SubjectVerbAgreement, sub::THIRD_PERSON_SINGULAR),
                count(SINGULAR_SUBJECTS),
            ),
            (
                PatternKey::new(PatternArea::SubjectVerbAgreement, sub::PLURAL_SUBJECT),
                count(PLURAL_SUBJECTS),
            ),
            (PatternKey::new(PatternArea::Prepositions, sub::TIME_PREPOSITION), time_place),
            (PatternKey::new(PatternArea::Prepositions, sub::PLACE_PREPOSITION), time_place),
            (
                PatternKey::new(PatternArea::Prepositions, sub::DEPENDENT_PREPOSITION),
                prepositions.saturating_sub(time_place),
            ),
            (PatternKey::new(PatternArea::Plurals, sub::IRREGULAR_PLURAL), plural_like),
            (PatternKey::new(PatternArea::Plurals, sub::COUNTABILITY), plural_like + uncountable),
            (PatternKey::new(PatternArea::Pronouns, sub::PRONOUN_AGREEMENT), count(PRONOUNS)),
            (PatternKey::new(PatternArea::WordOrder, sub::ADJECTIVE_ORDER), sentences),
            (PatternKey::new(PatternArea::WordOrder, sub::QUESTION_ORDER), chars(&['?'])),
            (PatternKey::new(PatternArea::WordOrder, sub::ADVERB_PLACEMENT), adverbs),
            (PatternKey::new(PatternArea::Spelling, sub::MISSPELLING), word_count),
            (PatternKey::new(PatternArea::Spelling, sub::HOMOPHONE), homophones),
            (PatternKey::new(PatternArea::Punctuation, sub::COMMA), chars(&[',']) + sentences),
            (
                PatternKey::new(PatternArea::Punctuation, sub::APOSTROPHE),
                chars(&['\'', '\u{2019}']),
            ),
            (PatternKey::new(PatternArea::Punctuation, sub::END_PUNCTUATION), sentences),
            (PatternKey::new(PatternArea::Capitalization, sub::SENTENCE_START), sentences),
            (PatternKey::new(PatternArea::Capitalization, sub::PROPER_NOUN), capitalized_inside),
            (
                PatternKey::new(PatternArea::WordChoice, sub::VOCABULARY_ENHANCEMENT),
                word_count.div_ceil(10),
            ),
            (PatternKey::new(PatternArea::WordChoice, sub::FORMALITY), sentences),
            (PatternKey::new(PatternArea::SentenceStructure, sub::RUN_ON), sentences),
            (PatternKey::new(PatternArea::SentenceStructure, sub::FRAGMENT), sentences),
        ];
        out.retain(|(_, n)| *n > 0);
        out
    }

    /// Record the estimated opportunities of an analyzed text.
    pub fn record_text_opportunities(&mut self, text: &str) -> u64 {
        let estimates = self.estimate_opportunities(text);
        let total = estimates.iter().map(|(_, n)| n).sum();
        for (key, n) in estimates {
            self.record_opportunities(&key, n);
        }
        total
    }

    // -----------------------------------------------------------------------
    // Persistence and reporting
    // -----------------------------------------------------------------------

    /// Load persisted patterns onto the taxonomy. Unknown keys are ignored.
    /// Returns the number restored.
    pub fn restore(&mut self, patterns: Vec<ErrorPattern>) -> usize {
        let max_examples = self.max_examples;
        let max_recent = self.max_recent_errors;
        let mut restored = 0;
        for mut incoming in patterns {
            let key = incoming.key();
            let Some(slot) = self.pattern_mut(&key) else {
                warn!(pattern = %key, "ignoring persisted pattern outside the taxonomy");
                continue;
            };
            // Persisted data may predate the opportunity tracking.
            incoming.total_opportunities = incoming.total_opportunities.max(incoming.count);
            incoming.recompute_accuracy();
            if incoming.examples.len() > max_examples {
                let excess = incoming.examples.len() - max_examples;
                incoming.examples.drain(..excess);
            }
            while incoming.recent_errors.len() > max_recent {
                incoming.recent_errors.pop_front();
            }
            *slot = incoming;
            restored += 1;
        }
        restored
    }

    pub fn snapshot(&self) -> PatternReport {
        let areas: Vec<AreaSummary> = PatternArea::ALL
            .iter()
            .map(|&area| {
                let (errors, opportunities) = self
                    .patterns
                    .iter()
                    .filter(|p| p.area == area)
                    .fold((0, 0), |(e, o), p| (e + p.count, o + p.total_opportunities));
                AreaSummary {
                    area,
                    errors,
                    opportunities,
                    accuracy: pattern::accuracy(errors, opportunities),
                }
            })
            .collect();

        let (total_errors, total_opportunities) = self
            .patterns
            .iter()
            .fold((0, 0), |(e, o), p| (e + p.count, o + p.total_opportunities));

        // Strict comparisons keep the earliest-declared area on ties.
        let measured = || areas.iter().filter(|a| a.opportunities > 0);
        let most_problematic_area = measured()
            .fold(None::<&AreaSummary>, |best, a| match best {
                Some(b) if b.accuracy <= a.accuracy => Some(b),
                _ => Some(a),
            })
            .map(|a| a.area);
        let strongest_area = measured()
            .fold(None::<&AreaSummary>, |best, a| match best {
                Some(b) if b.accuracy >= a.accuracy => Some(b),
                _ => Some(a),
            })
            .map(|a| a.area);

        PatternReport {
            patterns: self.patterns.clone(),
            areas,
            overall_accuracy: pattern::accuracy(total_errors, total_opportunities),
            total_errors,
            most_problematic_area,
            strongest_area,
            engagement: self.engagement,
            last_updated: self.last_updated,
        }
    }
}

fn sentence_count(text: &str) -> u64 {
    let mut count = 0;
    let mut in_terminal = false;
    let mut pending_words = false;
    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if !in_terminal && pending_words {
                count += 1;
                pending_words = false;
            }
            in_terminal = true;
        } else {
            in_terminal = false;
            if c.is_alphanumeric() {
                pending_words = true;
            }
        }
    }
    if pending_words {
        count += 1;
    }
    count
}

/// Words starting with an uppercase letter that do not open a sentence.
fn capitalized_mid_sentence(text: &str) -> u64 {
    let mut count = 0;
    let mut sentence_start = true;
    for word in text.split_whitespace() {
        let starts_upper = word.chars().next().is_some_and(char::is_uppercase);
        if starts_upper && !sentence_start && word != "I" && !word.starts_with("I'") {
            count += 1;
        }
        sentence_start = word.ends_with(['.', '!', '?']);
    }
    count
}
