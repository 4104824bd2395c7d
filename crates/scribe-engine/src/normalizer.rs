// SuggestionNormalizer: turn one provider's raw output into canonical
// suggestions anchored to the *current* text.
//
// Providers analyze a snapshot that may be stale by the time their result
// arrives, so reported offsets are only a hint. Each item is relocated with
// a fixed ladder:
//
//   1. reported offsets, if they still slice to the reported snippet
//   2. first exact occurrence of the snippet not already claimed
//   3. first case-insensitive occurrence not already claimed
//   4. near-miss probe within a small window of the reported start
//
// Items that survive none of these are dropped and counted.

use hashbrown::HashSet;
use scribe_core::span::{self, Span};
use scribe_core::{Category, Explanation, RawSuggestion, Severity, Suggestion, SuggestionId};
use tracing::{debug, warn};

/// Default near-miss probe radius, in chars.
pub const DEFAULT_NEAR_MISS_WINDOW: usize = 5;

/// Result of normalizing one provider output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Located suggestions, ascending by start.
    pub suggestions: Vec<Suggestion>,
    /// Raw item index each entry of `suggestions` was built from.
    pub sources: Vec<usize>,
    /// Items whose snippet could not be found in the current text.
    pub unlocatable: usize,
    /// Items rejected before location (unknown category, empty or no-op edit).
    pub rejected: usize,
}

/// How an item was located. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Located {
    Reported,
    Exact,
    CaseInsensitive,
    NearMiss,
}

/// Normalizer for a single provider.
#[derive(Debug, Clone)]
pub struct SuggestionNormalizer {
    provider: String,
    rank: u32,
    near_miss_window: usize,
}

impl SuggestionNormalizer {
    pub fn new(provider: impl Into<String>, rank: u32) -> Self {
        Self {
            provider: provider.into(),
            rank,
            near_miss_window: DEFAULT_NEAR_MISS_WINDOW,
        }
    }

    pub fn with_near_miss_window(mut self, window: usize) -> Self {
        self.near_miss_window = window;
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Normalize `raw` against `text`.
    ///
    /// `issue_seq` is the analysis sequence number the output belongs to; it
    /// is folded into every id so ids are never reused across analyses.
    pub fn normalize(&self, text: &[char], raw: &[RawSuggestion], issue_seq: u64) -> Normalized {
        self.normalize_skipping(text, raw, issue_seq, &HashSet::new())
    }

    /// Like [`normalize`](Self::normalize), but raw items whose index is in
    /// `skip` are ignored entirely. Ids of the remaining items are unchanged.
    pub fn normalize_skipping(
        &self,
        text: &[char],
        raw: &[RawSuggestion],
        issue_seq: u64,
        skip: &HashSet<usize>,
    ) -> Normalized {
        let mut out = Normalized::default();
        let mut claimed: HashSet<Span> = HashSet::new();
        let mut located: Vec<(usize, Suggestion)> = Vec::new();

        for (index, item) in raw.iter().enumerate() {
            if skip.contains(&index) {
                continue;
            }
            let Some(category) = Category::from_label(&item.category) else {
                debug!(
                    provider = %self.provider,
                    category = %item.category,
                    "rejected raw suggestion with unknown category"
                );
                out.rejected += 1;
                continue;
            };
            if item.original_text.is_empty() || item.original_text == item.replacement_text {
                out.rejected += 1;
                continue;
            }

            let Some((span, how)) = self.locate(text, item, &claimed) else {
                warn!(
                    provider = %self.provider,
                    snippet = %item.original_text,
                    reported_start = ?item.reported_start,
                    "dropping unlocatable suggestion"
                );
                out.unlocatable += 1;
                continue;
            };
            if how != Located::Reported {
                debug!(provider = %self.provider, ?how, %span, "relocated suggestion");
            }
            claimed.insert(span);

            // The buffer slice is authoritative; after a case-insensitive or
            // near-miss match it differs from the reported snippet.
            let Some(original_text) = span::slice(text, span) else {
                out.unlocatable += 1;
                continue;
            };

            let severity = item
                .severity
                .as_deref()
                .and_then(Severity::from_label)
                .unwrap_or_else(|| default_severity(category));
            let confidence = item
                .confidence
                .filter(|c| !c.is_nan())
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or_else(|| severity.default_confidence());

            let suggestion = Suggestion {
                id: SuggestionId::for_provider(&self.provider, issue_seq, index, span.start),
                category,
                severity,
                span,
                original_text,
                replacement_text: item.replacement_text.clone(),
                explanation: Explanation::parse_delimited(&item.explanation),
                confidence,
                source_rank: self.rank,
            };
            located.push((index, suggestion));
        }

        located.sort_by_key(|(_, s)| s.span.start);
        (out.sources, out.suggestions) = located.into_iter().unzip();
        debug!(
            provider = %self.provider,
            located = out.suggestions.len(),
            unlocatable = out.unlocatable,
            rejected = out.rejected,
            "normalized provider output"
        );
        out
    }

    fn locate(
        &self,
        text: &[char],
        item: &RawSuggestion,
        claimed: &HashSet<Span>,
    ) -> Option<(Span, Located)> {
        let needle: Vec<char> = item.original_text.chars().collect();

        if let Some(start) = item.reported_start {
            let end = item
                .reported_end
                .unwrap_or_else(|| start.saturating_add(needle.len()));
            let reported = Span::new(start, end);
            if span::is_valid(text, reported, &item.original_text) {
                return Some((reported, Located::Reported));
            }
        }

        if let Some(found) = find_unclaimed(text, &needle, claimed, |a, b| a == b) {
            return Some((found, Located::Exact));
        }

        if let Some(found) = find_unclaimed(text, &needle, claimed, eq_ignore_case) {
            return Some((found, Located::CaseInsensitive));
        }

        let start = item.reported_start?;
        self.probe_window(text, &needle, start)
            .map(|found| (found, Located::NearMiss))
    }

    /// Probe starts at `start`, `start-1`, `start+1`, ... within the window.
    fn probe_window(&self, text: &[char], needle: &[char], start: usize) -> Option<Span> {
        let trimmed = trim_chars(needle);

        for delta in 0..=self.near_miss_window {
            let mut candidates = vec![start.checked_sub(delta)];
            if delta > 0 {
                candidates.push(start.checked_add(delta));
            }
            for at in candidates.into_iter().flatten() {
                if at >= text.len() {
                    continue;
                }
                if matches_at(text, at, needle, |a, b| a == b) {
                    return Some(Span::at(at, needle.len()));
                }
                if !trimmed.is_empty()
                    && trimmed.len() != needle.len()
                    && matches_at(text, at, trimmed, |a, b| a == b)
                {
                    return Some(Span::at(at, trimmed.len()));
                }
                if let Some(end) = match_loose_whitespace(text, at, trimmed) {
                    return Some(Span::new(at, end));
                }
            }
        }
        None
    }
}

/// Severity used when a provider omits it or sends an unknown label.
fn default_severity(category: Category) -> Severity {
    match category {
        Category::Spelling | Category::Grammar => Severity::Error,
        Category::Clarity | Category::Structure => Severity::Warning,
        Category::Vocabulary | Category::Style => Severity::Suggestion,
    }
}

fn eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn matches_at(text: &[char], at: usize, needle: &[char], eq: impl Fn(char, char) -> bool) -> bool {
    if needle.is_empty() || at + needle.len() > text.len() {
        return false;
    }
    text[at..at + needle.len()]
        .iter()
        .zip(needle)
        .all(|(&a, &b)| eq(a, b))
}

/// First occurrence of `needle` (under `eq`) whose span is not in `claimed`.
fn find_unclaimed(
    text: &[char],
    needle: &[char],
    claimed: &HashSet<Span>,
    eq: impl Fn(char, char) -> bool,
) -> Option<Span> {
    if needle.is_empty() || needle.len() > text.len() {
        return None;
    }
    (0..=text.len() - needle.len())
        .filter(|&at| matches_at(text, at, needle, &eq))
        .map(|at| Span::at(at, needle.len()))
        .find(|span| !claimed.contains(span))
}

fn trim_chars(s: &[char]) -> &[char] {
    let start = s.iter().position(|c| !c.is_whitespace()).unwrap_or(s.len());
    let end = s
        .iter()
        .rposition(|c| !c.is_whitespace())
        .map_or(start, |i| i + 1);
    &s[start..end]
}

/// Match `needle` at `at`, treating any run of whitespace in either side as
/// equal to any run in the other. Returns the end offset in `text`.
fn match_loose_whitespace(text: &[char], at: usize, needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut t = at;
    let mut n = 0;
    while n < needle.len() {
        let nc = needle[n];
        let tc = *text.get(t)?;
        if nc.is_whitespace() {
            if !tc.is_whitespace() {
                return None;
            }
            while n < needle.len() && needle[n].is_whitespace() {
                n += 1;
            }
            while t < text.len() && text[t].is_whitespace() {
                t += 1;
            }
        } else if nc == tc {
            n += 1;
            t += 1;
        } else {
            return None;
        }
    }
    (t > at).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn normalize(text: &str, raw: &[RawSuggestion]) -> Normalized {
        SuggestionNormalizer::new("grammar", 0).normalize(&chars(text), raw, 1)
    }

    // ====================================================================
    // Relocation ladder
    // ====================================================================

    #[test]
    fn valid_reported_offsets_are_trusted() {
        let out = normalize(
            "teh cat sat",
            &[RawSuggestion::new("spelling", "teh", "the").at(0, 3)],
        );
        assert_eq!(out.suggestions.len(), 1);
        assert_eq!(out.suggestions[0].span, Span::new(0, 3));
        assert_eq!(out.suggestions[0].id.as_str(), "grammar-1-0-0");
    }

    #[test]
    fn stale_offsets_fall_back_to_exact_search() {
        // Provider saw "teh cat" but the user has since prefixed text.
        let out = normalize(
            "Today teh cat sat",
            &[RawSuggestion::new("spelling", "teh", "the").at(0, 3)],
        );
        assert_eq!(out.suggestions[0].span, Span::new(6, 9));
        assert_eq!(out.suggestions[0].original_text, "teh");
    }

    #[test]
    fn missing_offsets_use_search() {
        let out = normalize("I goed home", &[RawSuggestion::new("grammar", "goed", "went")]);
        assert_eq!(out.suggestions[0].span, Span::new(2, 6));
    }

    #[test]
    fn case_insensitive_match_uses_buffer_text() {
        let out = normalize(
            "Teh cat sat",
            &[RawSuggestion::new("spelling", "teh", "the").at(4, 7)],
        );
        let s = &out.suggestions[0];
        assert_eq!(s.span, Span::new(0, 3));
        assert_eq!(s.original_text, "Teh");
        assert!(span::is_valid(&chars("Teh cat sat"), s.span, &s.original_text));
    }

    #[test]
    fn near_miss_recovers_collapsed_whitespace() {
        // Provider collapsed the double space.
        let text = "She  go to school";
        let out = normalize(
            text,
            &[RawSuggestion::new("grammar", "She go", "She goes").at(1, 7)],
        );
        assert_eq!(out.unlocatable, 0);
        let s = &out.suggestions[0];
        assert_eq!(s.span, Span::new(0, 7));
        assert_eq!(s.original_text, "She  go");
    }

    #[test]
    fn near_miss_recovers_padded_snippet() {
        let text = "A cat in  the\thouse.";
        let out = normalize(
            text,
            &[RawSuggestion::new("grammar", " the house ", "the home").at(9, 20)],
        );
        assert_eq!(out.unlocatable, 0);
        let s = &out.suggestions[0];
        assert_eq!(s.original_text, "the\thouse");
        assert_eq!(s.span, Span::new(10, 19));
    }

    #[test]
    fn unlocatable_items_are_counted_not_returned() {
        let out = normalize(
            "The cat sat",
            &[
                RawSuggestion::new("spelling", "dgo", "dog").at(0, 3),
                RawSuggestion::new("spelling", "cat", "cats").at(4, 7),
            ],
        );
        assert_eq!(out.unlocatable, 1);
        assert_eq!(out.suggestions.len(), 1);
        assert_eq!(out.suggestions[0].original_text, "cat");
    }

    #[test]
    fn repeated_snippets_claim_distinct_occurrences() {
        let out = normalize(
            "teh dog and teh cat",
            &[
                RawSuggestion::new("spelling", "teh", "the"),
                RawSuggestion::new("spelling", "teh", "the"),
            ],
        );
        let starts: Vec<usize> = out.suggestions.iter().map(|s| s.span.start).collect();
        assert_eq!(starts, vec![0, 12]);
        assert_eq!(out.sources, vec![0, 1]);
    }

    #[test]
    fn skipped_items_do_not_claim_or_renumber() {
        let raw = [
            RawSuggestion::new("spelling", "teh", "the").at(0, 3),
            RawSuggestion::new("spelling", "teh", "the").at(12, 15),
        ];
        let skip: HashSet<usize> = [0].into_iter().collect();
        let out = SuggestionNormalizer::new("grammar", 0).normalize_skipping(
            &chars("the dog and teh cat"),
            &raw,
            1,
            &skip,
        );
        assert_eq!(out.suggestions.len(), 1);
        assert_eq!(out.suggestions[0].span, Span::new(12, 15));
        assert_eq!(out.sources, vec![1]);
        assert_eq!(out.suggestions[0].id.as_str(), "grammar-1-1-12");
        assert_eq!(out.unlocatable, 0);
    }

    // ====================================================================
    // Rejection, defaults, ordering
    // ====================================================================

    #[test]
    fn rejects_unknown_category_and_noop_edits() {
        let out = normalize(
            "The cat sat",
            &[
                RawSuggestion::new("horoscope", "cat", "dog"),
                RawSuggestion::new("spelling", "cat", "cat"),
                RawSuggestion::new("spelling", "", "x"),
            ],
        );
        assert_eq!(out.rejected, 3);
        assert!(out.suggestions.is_empty());
    }

    #[test]
    fn confidence_defaults_by_severity_and_is_clamped() {
        let out = normalize(
            "aa bb cc dd",
            &[
                RawSuggestion::new("spelling", "aa", "a").with_severity("error"),
                RawSuggestion::new("style", "bb", "b").with_severity("warning"),
                RawSuggestion::new("style", "cc", "c"),
                RawSuggestion::new("style", "dd", "d").with_confidence(3.5),
            ],
        );
        let conf: Vec<f32> = out.suggestions.iter().map(|s| s.confidence).collect();
        assert_eq!(conf, vec![0.9, 0.7, 0.5, 1.0]);
    }

    #[test]
    fn nan_confidence_is_treated_as_missing() {
        let out = normalize(
            "teh",
            &[RawSuggestion::new("spelling", "teh", "the").with_confidence(f32::NAN)],
        );
        assert_eq!(out.suggestions[0].confidence, 0.9);
    }

    #[test]
    fn output_is_sorted_by_start_and_carries_rank() {
        let normalizer = SuggestionNormalizer::new("vocabulary", 1);
        let out = normalizer.normalize(
            &chars("good food is very good"),
            &[
                RawSuggestion::new("vocabulary", "very good", "excellent"),
                RawSuggestion::new("vocabulary", "good food", "delicious food"),
            ],
            4,
        );
        let starts: Vec<usize> = out.suggestions.iter().map(|s| s.span.start).collect();
        assert_eq!(starts, vec![0, 13]);
        assert!(out.suggestions.iter().all(|s| s.source_rank == 1));
        assert_eq!(out.suggestions[0].id.as_str(), "vocabulary-4-1-0");
    }

    #[test]
    fn bilingual_explanation_is_split() {
        let out = normalize(
            "teh",
            &[RawSuggestion::new("spelling", "teh", "the")
                .with_explanation("Typo | Error tipogr\u{e1}fico")],
        );
        let e = &out.suggestions[0].explanation;
        assert_eq!(e.primary, "Typo");
        assert_eq!(e.secondary.as_deref(), Some("Error tipogr\u{e1}fico"));
    }

    // ====================================================================
    // Helpers
    // ====================================================================

    #[test]
    fn loose_whitespace_matching() {
        let text = chars("a  b\tc");
        assert_eq!(match_loose_whitespace(&text, 0, &chars("a b c")), Some(6));
        assert_eq!(match_loose_whitespace(&text, 0, &chars("ab")), None);
    }

    #[test]
    fn trim_chars_strips_both_ends() {
        assert_eq!(trim_chars(&chars("  ab ")), chars("ab").as_slice());
        assert!(trim_chars(&chars("   ")).is_empty());
    }
}
