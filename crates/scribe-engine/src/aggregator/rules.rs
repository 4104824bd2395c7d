// Categorization rule table: suggestion -> (area, subcategory).
//
// Rules are tried in order; the first match wins. A rule matches when its
// category filter admits the suggestion and either its explanation keywords
// match or its structural check accepts the change. A structural check, when
// present, decides alone and receives the keyword result as input.

use regex::{Regex, RegexBuilder};
use scribe_core::pattern::sub;
use scribe_core::{Category, Explanation, PatternArea, PatternKey};
use tracing::warn;

pub(crate) const ARTICLES: &[&str] = &["a", "an", "the"];

pub(crate) const PREPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beside", "between", "by", "during", "for", "from", "in", "into", "near",
    "of", "off", "on", "onto", "over", "since", "through", "to", "toward", "towards", "under",
    "until", "upon", "with", "within", "without",
];

pub(crate) const TIME_PLACE_PREPOSITIONS: &[&str] = &["at", "on", "in"];

pub(crate) const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his",
    "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us", "our", "ours",
    "ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom", "whose",
];

pub(crate) const SINGULAR_SUBJECTS: &[&str] = &["he", "she", "it"];
pub(crate) const PLURAL_SUBJECTS: &[&str] = &["we", "they"];

const AGREEMENT_VERBS: &[&str] = &[
    "is", "are", "was", "were", "has", "have", "do", "does", "don't", "doesn't",
];
const PLURAL_VERBS: &[&str] = &["are", "were", "have", "do", "don't"];

pub(crate) const UNCOUNTABLE: &[&str] = &[
    "information", "advice", "furniture", "equipment", "homework", "luggage", "baggage", "news",
    "knowledge", "research", "evidence", "feedback", "traffic", "money", "music",
];

const TIME_WORDS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "morning",
    "afternoon", "evening", "night", "weekend", "january", "february", "march", "april", "may",
    "june", "july", "august", "september", "october", "november", "december", "noon", "midnight",
    "christmas", "summer", "winter", "spring", "autumn",
];

pub(crate) const HOMOPHONE_GROUPS: &[&[&str]] = &[
    &["their", "there", "they're"],
    &["your", "you're"],
    &["its", "it's"],
    &["to", "too", "two"],
    &["then", "than"],
    &["affect", "effect"],
    &["whose", "who's"],
    &["weather", "whether"],
    &["accept", "except"],
    &["hear", "here"],
    &["know", "no"],
    &["right", "write"],
];

pub(crate) const IRREGULAR_PAST: &[&str] = &[
    "went", "ate", "bought", "thought", "taught", "caught", "saw", "came", "took", "made", "said",
    "got", "gave", "found", "knew", "left", "felt", "told", "became", "wrote", "ran", "began",
];

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Everything a rule may inspect about one change.
pub(crate) struct Evidence<'a> {
    pub category: Category,
    pub original: &'a str,
    pub replacement: &'a str,
    pub explanation: String,
    pub original_words: Vec<String>,
    pub replacement_words: Vec<String>,
    /// Replacement words not matched by an original word (multiset diff).
    pub added: Vec<String>,
    /// Original words not matched by a replacement word.
    pub removed: Vec<String>,
}

impl<'a> Evidence<'a> {
    pub fn new(
        category: Category,
        original: &'a str,
        replacement: &'a str,
        explanation: &Explanation,
    ) -> Self {
        let original_words = words(original);
        let replacement_words = words(replacement);
        let added = multiset_minus(&replacement_words, &original_words);
        let removed = multiset_minus(&original_words, &replacement_words);
        Self {
            category,
            original,
            replacement,
            explanation: explanation.primary.to_lowercase(),
            original_words,
            replacement_words,
            added,
            removed,
        }
    }

    fn case_only(&self) -> bool {
        self.original != self.replacement
            && self.original.to_lowercase() == self.replacement.to_lowercase()
    }

    fn same_words(&self) -> bool {
        self.original_words == self.replacement_words
    }

    /// Same multiset of words in a different order.
    fn reordered(&self) -> bool {
        !self.same_words()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.original_words.len() > 1
    }

    fn changed_only(&self, set: &[&str]) -> bool {
        let changed: Vec<&String> = self.added.iter().chain(&self.removed).collect();
        !changed.is_empty() && changed.iter().all(|w| set.contains(&w.as_str()))
    }

    fn added_any(&self, set: &[&str]) -> bool {
        self.added.iter().any(|w| set.contains(&w.as_str()))
    }

    fn removed_any(&self, set: &[&str]) -> bool {
        self.removed.iter().any(|w| set.contains(&w.as_str()))
    }

    /// Single-word swap `(removed, added)`.
    fn swap(&self) -> Option<(&str, &str)> {
        match (self.removed.as_slice(), self.added.as_slice()) {
            ([r], [a]) => Some((r.as_str(), a.as_str())),
            _ => None,
        }
    }

    fn count_chars(s: &str, set: &[char]) -> usize {
        s.chars().filter(|c| set.contains(c)).count()
    }
}

/// Lowercased words; apostrophes stay inside words.
pub(crate) fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|w| !w.is_empty())
        .map(|w| w.replace('\u{2019}', "'").to_lowercase())
        .collect()
}

fn multiset_minus(a: &[String], b: &[String]) -> Vec<String> {
    let mut rest: Vec<&String> = b.iter().collect();
    let mut out = Vec::new();
    for w in a {
        match rest.iter().position(|x| *x == w) {
            Some(i) => {
                rest.swap_remove(i);
            }
            None => out.push(w.clone()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Structural checks
// ---------------------------------------------------------------------------

type Check = fn(&Evidence<'_>, bool) -> bool;

fn always(_: &Evidence<'_>, _: bool) -> bool {
    true
}

fn sentence_start_case(ev: &Evidence<'_>, kw: bool) -> bool {
    ev.case_only() && kw
}

fn case_only(ev: &Evidence<'_>, _: bool) -> bool {
    ev.case_only()
}

fn homophone(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || ev.swap().is_some_and(|(r, a)| {
        HOMOPHONE_GROUPS
            .iter()
            .any(|group| group.contains(&r) && group.contains(&a))
    })
}

const APOSTROPHES: &[char] = &['\'', '\u{2019}'];

fn apostrophe(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || Evidence::count_chars(ev.original, APOSTROPHES)
        != Evidence::count_chars(ev.replacement, APOSTROPHES)
}

fn comma(ev: &Evidence<'_>, kw: bool) -> bool {
    let commas = |s: &str| Evidence::count_chars(s, &[',']);
    kw || (ev.same_words() && commas(ev.original) != commas(ev.replacement))
}

fn end_punctuation(ev: &Evidence<'_>, kw: bool) -> bool {
    let terminal = |s: &str| s.trim_end().chars().last().filter(|c| matches!(*c, '.' | '!' | '?'));
    kw || (ev.same_words() && terminal(ev.original) != terminal(ev.replacement))
}

/// Article tokens changed and, unless the explanation says so, nothing else.
fn article_change(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || ev.changed_only(ARTICLES)
}

fn wrong_article(ev: &Evidence<'_>, kw: bool) -> bool {
    ev.added_any(ARTICLES) && ev.removed_any(ARTICLES) && article_change(ev, kw)
}

fn missing_article(ev: &Evidence<'_>, kw: bool) -> bool {
    ev.added_any(ARTICLES) && !ev.removed_any(ARTICLES) && article_change(ev, kw)
}

fn unnecessary_article(ev: &Evidence<'_>, kw: bool) -> bool {
    ev.removed_any(ARTICLES) && !ev.added_any(ARTICLES) && article_change(ev, kw)
}

fn future(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || ev.added.iter().any(|w| w == "will")
}

/// A regularized past form replaced by the correct one (`goed` -> `went`).
fn past_tense(ev: &Evidence<'_>, kw: bool) -> bool {
    let regularized = |(r, a): (&str, &str)| {
        r.ends_with("ed") && (IRREGULAR_PAST.contains(&a) || a.ends_with("ed"))
    };
    kw || (ev.category == Category::Grammar && ev.swap().is_some_and(regularized))
}

fn agreement_swap<'e>(ev: &'e Evidence<'_>) -> Option<&'e str> {
    let (r, a) = ev.swap()?;
    let verb_pair = AGREEMENT_VERBS.contains(&r) && AGREEMENT_VERBS.contains(&a);
    let s_form = a.strip_suffix('s').is_some_and(|stem| stem == r)
        || a.strip_suffix("es").is_some_and(|stem| stem == r);
    (verb_pair || s_form).then_some(a)
}

fn plural_subject(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || agreement_swap(ev).is_some_and(|a| PLURAL_VERBS.contains(&a))
}

fn third_person(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || agreement_swap(ev).is_some()
}

fn time_preposition(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || (ev.changed_only(TIME_PLACE_PREPOSITIONS)
        && ev
            .replacement_words
            .iter()
            .any(|w| TIME_WORDS.contains(&w.as_str()) || w.chars().all(|c| c.is_ascii_digit())))
}

fn dependent_preposition(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || ev.changed_only(PREPOSITIONS)
}

fn countability(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || ev
        .swap()
        .is_some_and(|(r, a)| UNCOUNTABLE.contains(&a) && r.strip_suffix('s') == Some(a))
}

fn pronoun(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || ev.changed_only(PRONOUNS)
}

fn question_order(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || (ev.reordered() && ev.original.contains('?'))
}

fn adverb_placement(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || (ev.reordered() && ev.original_words.iter().any(|w| w.ends_with("ly")))
}

fn adjective_order(ev: &Evidence<'_>, kw: bool) -> bool {
    kw || ev.reordered()
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

struct RuleSpec {
    area: PatternArea,
    subcategory: &'static str,
    /// Admitted categories; empty admits all.
    categories: &'static [Category],
    /// Regex over the lowercased primary explanation.
    keywords: Option<&'static str>,
    check: Option<Check>,
}

const ANY: &[Category] = &[];

macro_rules! rule {
    ($area:ident, $sub:ident, $cats:expr, $kw:expr, $check:expr) => {
        RuleSpec {
            area: PatternArea::$area,
            subcategory: sub::$sub,
            categories: $cats,
            keywords: $kw,
            check: $check,
        }
    };
}

const RULES: &[RuleSpec] = &[
    rule!(
        Capitalization,
        SENTENCE_START,
        ANY,
        Some(r"sentence|\bstart|\bbegin|first word"),
        Some(sentence_start_case)
    ),
    rule!(Capitalization, PROPER_NOUN, ANY, None, Some(case_only)),
    rule!(
        Spelling,
        HOMOPHONE,
        ANY,
        Some(r"homophone|sounds? (the same|like)|confus"),
        Some(homophone)
    ),
    rule!(Spelling, MISSPELLING, &[Category::Spelling], None, Some(always)),
    rule!(
        Punctuation,
        APOSTROPHE,
        ANY,
        Some(r"apostrophe|possessive|contraction"),
        Some(apostrophe)
    ),
    rule!(Punctuation, COMMA, ANY, Some(r"\bcommas?\b"), Some(comma)),
    rule!(
        Punctuation,
        END_PUNCTUATION,
        ANY,
        Some(r"\bperiod\b|full stop|question mark|exclamation|end punctuation|end of (the|a) sentence"),
        Some(end_punctuation)
    ),
    rule!(Articles, WRONG_ARTICLE, ANY, Some(r"\barticles?\b"), Some(wrong_article)),
    rule!(Articles, MISSING_ARTICLE, ANY, Some(r"\barticles?\b"), Some(missing_article)),
    rule!(Articles, UNNECESSARY_ARTICLE, ANY, Some(r"\barticles?\b"), Some(unnecessary_article)),
    rule!(VerbTenses, PRESENT_PERFECT, ANY, Some(r"present perfect"), None),
    rule!(VerbTenses, FUTURE_TENSE, ANY, Some(r"future"), Some(future)),
    rule!(
        VerbTenses,
        TENSE_CONSISTENCY,
        ANY,
        Some(r"consisten|tense shift|switch(es|ing)? tense|mixed tense"),
        None
    ),
    rule!(
        VerbTenses,
        PAST_TENSE,
        ANY,
        Some(r"past tense|simple past|past simple|irregular (verb|past)|past form|\btense\b"),
        Some(past_tense)
    ),
    rule!(
        SubjectVerbAgreement,
        PLURAL_SUBJECT,
        ANY,
        Some(r"plural subject|plural verb"),
        Some(plural_subject)
    ),
    rule!(
        SubjectVerbAgreement,
        THIRD_PERSON_SINGULAR,
        ANY,
        Some(r"agree|third[- ]person|singular subject|subject[- ]verb"),
        Some(third_person)
    ),
    rule!(
        Prepositions,
        TIME_PREPOSITION,
        ANY,
        Some(r"preposition of time|time preposition"),
        Some(time_preposition)
    ),
    rule!(
        Prepositions,
        PLACE_PREPOSITION,
        ANY,
        Some(r"preposition of place|place preposition|location"),
        None
    ),
    rule!(
        Prepositions,
        DEPENDENT_PREPOSITION,
        ANY,
        Some(r"preposition|collocation"),
        Some(dependent_preposition)
    ),
    rule!(
        Plurals,
        COUNTABILITY,
        ANY,
        Some(r"uncountable|countable|mass noun|non-count"),
        Some(countability)
    ),
    rule!(Plurals, IRREGULAR_PLURAL, ANY, Some(r"\bplural"), None),
    rule!(Pronouns, PRONOUN_AGREEMENT, ANY, Some(r"pronoun"), Some(pronoun)),
    rule!(
        WordOrder,
        QUESTION_ORDER,
        ANY,
        Some(r"question (word )?order|inversion"),
        Some(question_order)
    ),
    rule!(WordOrder, ADVERB_PLACEMENT, ANY, Some(r"adverb"), Some(adverb_placement)),
    rule!(
        WordOrder,
        ADJECTIVE_ORDER,
        ANY,
        Some(r"adjective order|word order"),
        Some(adjective_order)
    ),
    rule!(
        SentenceStructure,
        RUN_ON,
        ANY,
        Some(r"run-on|run on|comma splice|too long|split (this|the|into)"),
        None
    ),
    rule!(
        SentenceStructure,
        FRAGMENT,
        ANY,
        Some(r"fragment|incomplete sentence|missing (a |the )?(subject|verb)"),
        None
    ),
    rule!(
        WordChoice,
        FORMALITY,
        &[Category::Vocabulary, Category::Style, Category::Clarity],
        Some(r"formal|tone|register|casual|slang"),
        None
    ),
    rule!(
        WordChoice,
        VOCABULARY_ENHANCEMENT,
        &[Category::Vocabulary, Category::Style],
        None,
        Some(always)
    ),
];

struct Rule {
    spec: &'static RuleSpec,
    keywords: Option<Regex>,
}

/// Compiled categorization rules. One instance per aggregator.
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl std::fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleTable").field("rules", &self.rules.len()).finish()
    }
}

impl RuleTable {
    pub fn builtin() -> Self {
        let rules = RULES
            .iter()
            .filter_map(|spec| {
                let keywords = match spec.keywords.map(|kw| {
                    RegexBuilder::new(kw).case_insensitive(true).build()
                }) {
                    Some(Ok(re)) => Some(re),
                    Some(Err(e)) => {
                        warn!(
                            subcategory = spec.subcategory,
                            error = %e,
                            "skipping categorization rule"
                        );
                        return None;
                    }
                    None => None,
                };
                Some(Rule { spec, keywords })
            })
            .collect();
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First matching `(area, subcategory)`, or `None` when no rule matches.
    pub fn categorize(
        &self,
        category: Category,
        original: &str,
        replacement: &str,
        explanation: &Explanation,
    ) -> Option<PatternKey> {
        let ev = Evidence::new(category, original, replacement, explanation);
        self.rules.iter().find_map(|rule| {
            let spec = rule.spec;
            if !spec.categories.is_empty() && !spec.categories.contains(&category) {
                return None;
            }
            let kw = rule
                .keywords
                .as_ref()
                .is_some_and(|re| re.is_match(&ev.explanation));
            let hit = match spec.check {
                Some(check) => check(&ev, kw),
                None => kw,
            };
            hit.then(|| PatternKey::new(spec.area, spec.subcategory))
        })
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorize(
        category: Category,
        original: &str,
        replacement: &str,
        why: &str,
    ) -> Option<PatternKey> {
        RuleTable::builtin().categorize(category, original, replacement, &Explanation::new(why))
    }

    fn key(area: PatternArea, subcategory: &str) -> Option<PatternKey> {
        Some(PatternKey::new(area, subcategory))
    }

    #[test]
    fn every_rule_compiles_to_a_known_key() {
        let table = RuleTable::builtin();
        assert_eq!(table.len(), RULES.len());
        for spec in RULES {
            let key = PatternKey::new(spec.area, spec.subcategory);
            assert!(key.is_known(), "{}", spec.subcategory);
        }
    }

    #[test]
    fn words_keep_contractions() {
        assert_eq!(words("He don't, 'really'."), vec!["he", "don't", "really"]);
        assert_eq!(words("It\u{2019}s"), vec!["it's"]);
    }

    // ====================================================================
    // Articles
    // ====================================================================

    #[test]
    fn added_article_is_missing_article() {
        assert_eq!(
            categorize(Category::Grammar, "went to store", "went to the store", ""),
            key(PatternArea::Articles, sub::MISSING_ARTICLE)
        );
    }

    #[test]
    fn removed_article_is_unnecessary_article() {
        assert_eq!(
            categorize(
                Category::Grammar,
                "the Paris",
                "Paris",
                "Do not use an article before city names."
            ),
            key(PatternArea::Articles, sub::UNNECESSARY_ARTICLE)
        );
    }

    #[test]
    fn swapped_article_is_wrong_article() {
        assert_eq!(
            categorize(Category::Grammar, "a apple", "an apple", ""),
            key(PatternArea::Articles, sub::WRONG_ARTICLE)
        );
    }

    #[test]
    fn spelling_fix_to_the_is_not_an_article_error() {
        assert_eq!(
            categorize(Category::Spelling, "teh", "the", "Typo."),
            key(PatternArea::Spelling, sub::MISSPELLING)
        );
    }

    // ====================================================================
    // Verbs
    // ====================================================================

    #[test]
    fn regularized_past_is_past_tense() {
        assert_eq!(
            categorize(Category::Grammar, "goed", "went", ""),
            key(PatternArea::VerbTenses, sub::PAST_TENSE)
        );
    }

    #[test]
    fn explanation_keywords_pick_tense() {
        assert_eq!(
            categorize(
                Category::Grammar,
                "I live here since 2010",
                "I have lived here since 2010",
                "Use the present perfect."
            ),
            key(PatternArea::VerbTenses, sub::PRESENT_PERFECT)
        );
        assert_eq!(
            categorize(Category::Grammar, "I go tomorrow", "I will go tomorrow", ""),
            key(PatternArea::VerbTenses, sub::FUTURE_TENSE)
        );
    }

    #[test]
    fn agreement() {
        assert_eq!(
            categorize(Category::Grammar, "he don't", "he doesn't", ""),
            key(PatternArea::SubjectVerbAgreement, sub::THIRD_PERSON_SINGULAR)
        );
        assert_eq!(
            categorize(Category::Grammar, "she go", "she goes", ""),
            key(PatternArea::SubjectVerbAgreement, sub::THIRD_PERSON_SINGULAR)
        );
        assert_eq!(
            categorize(Category::Grammar, "they is", "they are", ""),
            key(PatternArea::SubjectVerbAgreement, sub::PLURAL_SUBJECT)
        );
    }

    // ====================================================================
    // Other areas
    // ====================================================================

    #[test]
    fn prepositions() {
        assert_eq!(
            categorize(Category::Grammar, "in Monday", "on Monday", ""),
            key(PatternArea::Prepositions, sub::TIME_PREPOSITION)
        );
        assert_eq!(
            categorize(Category::Grammar, "depend of", "depend on", ""),
            key(PatternArea::Prepositions, sub::DEPENDENT_PREPOSITION)
        );
    }

    #[test]
    fn plurals_and_pronouns() {
        assert_eq!(
            categorize(Category::Grammar, "informations", "information", ""),
            key(PatternArea::Plurals, sub::COUNTABILITY)
        );
        assert_eq!(
            categorize(Category::Grammar, "childs", "children", "Irregular plural."),
            key(PatternArea::Plurals, sub::IRREGULAR_PLURAL)
        );
        assert_eq!(
            categorize(Category::Grammar, "him", "he", ""),
            key(PatternArea::Pronouns, sub::PRONOUN_AGREEMENT)
        );
    }

    #[test]
    fn homophones_and_capitalization() {
        assert_eq!(
            categorize(Category::Grammar, "their", "there", ""),
            key(PatternArea::Spelling, sub::HOMOPHONE)
        );
        assert_eq!(
            categorize(Category::Grammar, "london", "London", ""),
            key(PatternArea::Capitalization, sub::PROPER_NOUN)
        );
        assert_eq!(
            categorize(Category::Grammar, "the", "The", "Capitalize the first word of a sentence."),
            key(PatternArea::Capitalization, sub::SENTENCE_START)
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            categorize(Category::Grammar, "dont", "don't", ""),
            key(PatternArea::Punctuation, sub::APOSTROPHE)
        );
        assert_eq!(
            categorize(Category::Grammar, "However I", "However, I", ""),
            key(PatternArea::Punctuation, sub::COMMA)
        );
        assert_eq!(
            categorize(Category::Grammar, "home", "home.", ""),
            key(PatternArea::Punctuation, sub::END_PUNCTUATION)
        );
    }

    #[test]
    fn word_order() {
        assert_eq!(
            categorize(Category::Grammar, "Where you are going?", "Where are you going?", ""),
            key(PatternArea::WordOrder, sub::QUESTION_ORDER)
        );
        assert_eq!(
            categorize(Category::Grammar, "a red big car", "a big red car", ""),
            key(PatternArea::WordOrder, sub::ADJECTIVE_ORDER)
        );
    }

    #[test]
    fn vocabulary_and_style() {
        assert_eq!(
            categorize(Category::Vocabulary, "very good", "excellent", ""),
            key(PatternArea::WordChoice, sub::VOCABULARY_ENHANCEMENT)
        );
        assert_eq!(
            categorize(Category::Style, "gonna", "going to", "Too informal for an essay."),
            key(PatternArea::WordChoice, sub::FORMALITY)
        );
        assert_eq!(
            categorize(
                Category::Structure,
                "I ran I fell",
                "I ran. I fell",
                "This is a run-on sentence."
            ),
            key(PatternArea::SentenceStructure, sub::RUN_ON)
        );
    }

    #[test]
    fn unmatched_changes_are_uncategorized() {
        assert_eq!(categorize(Category::Grammar, "more better", "better", ""), None);
        assert_eq!(categorize(Category::Clarity, "in order to", "to", ""), None);
    }
}
