// SuggestionStore: the text buffer of one document and its live suggestion
// set, with the only mutation surface for either.
//
// After every public operation returns:
//   - every live suggestion's span slices exactly to its `original_text`
//   - no two live spans overlap
//   - the live set is ordered ascending by start

use scribe_core::span::{self, TextEdit};
use scribe_core::{LifecycleEvent, Suggestion, SuggestionId};
use tracing::{debug, warn};

/// Errors from accept/dismiss. Neither is fatal; the store is consistent
/// after both.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("suggestion {0} is not in the live set")]
    NotFound(SuggestionId),
    #[error("suggestion {id} no longer matches the text; {cleared} live suggestions cleared")]
    StaleSuggestion { id: SuggestionId, cleared: usize },
}

/// Result of [`SuggestionStore::replace_suggestions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub kept: usize,
    /// Items whose span did not reproduce their original text.
    pub dropped_invalid: usize,
    /// Items overlapping an earlier kept item.
    pub dropped_overlapping: usize,
    /// Kept items that matched a previously live suggestion and kept its id.
    pub preserved: usize,
}

/// Result of [`SuggestionStore::edit_text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// The diff applied, or `None` when the text did not change.
    pub edit: Option<TextEdit>,
    /// Live suggestions invalidated by the edit.
    pub dropped: usize,
}

/// Result of [`SuggestionStore::accept_suggestion`].
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptOutcome {
    pub accepted: Suggestion,
    pub edit: TextEdit,
    /// Other live suggestions invalidated by the splice.
    pub dropped: usize,
}

/// Result of [`SuggestionStore::accept_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptAllOutcome {
    /// Applied ids, in application order (descending start).
    pub applied: Vec<SuggestionId>,
    /// Ids whose span no longer matched at their turn.
    pub skipped: Vec<SuggestionId>,
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionStore {
    text: Vec<char>,
    live: Vec<Suggestion>,
    events: Vec<LifecycleEvent>,
}

impl SuggestionStore {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            live: Vec::new(),
            events: Vec::new(),
        }
    }

    /// The current buffer as a `String`.
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn chars(&self) -> &[char] {
        &self.text
    }

    /// Live suggestions, ascending by start.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.live
    }

    pub fn get(&self, id: &SuggestionId) -> Option<&Suggestion> {
        self.live.iter().find(|s| &s.id == id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drain queued lifecycle events, oldest first.
    pub fn take_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Live set replacement
    // -----------------------------------------------------------------------

    /// Swap the live set for `incoming`.
    ///
    /// Every item is re-validated against the buffer; invalid or overlapping
    /// items are dropped silently. An item proposing the same change as a
    /// currently live suggestion keeps the live id. Items not previously live
    /// queue a `Shown` event.
    pub fn replace_suggestions(&mut self, mut incoming: Vec<Suggestion>) -> ReplaceOutcome {
        incoming.sort_by_key(|s| s.span.start);
        let previous = std::mem::take(&mut self.live);
        let mut outcome = ReplaceOutcome::default();
        let mut next: Vec<Suggestion> = Vec::with_capacity(incoming.len());

        for mut suggestion in incoming {
            if !span::is_valid(&self.text, suggestion.span, &suggestion.original_text) {
                outcome.dropped_invalid += 1;
                continue;
            }
            if next
                .last()
                .is_some_and(|kept| kept.span.overlaps(&suggestion.span))
            {
                outcome.dropped_overlapping += 1;
                continue;
            }
            match previous.iter().find(|live| live.same_change(&suggestion)) {
                Some(live) => {
                    suggestion.id = live.id.clone();
                    outcome.preserved += 1;
                }
                None => self.events.push(LifecycleEvent::shown(&suggestion)),
            }
            next.push(suggestion);
        }

        outcome.kept = next.len();
        self.live = next;
        if outcome.dropped_invalid > 0 || outcome.dropped_overlapping > 0 {
            debug!(
                invalid = outcome.dropped_invalid,
                overlapping = outcome.dropped_overlapping,
                "dropped suggestions while replacing live set"
            );
        }
        outcome
    }

    /// Remove every live suggestion without emitting events.
    pub fn clear_suggestions(&mut self) -> usize {
        let cleared = self.live.len();
        self.live.clear();
        cleared
    }

    // -----------------------------------------------------------------------
    // Text mutation
    // -----------------------------------------------------------------------

    /// Apply a direct user edit. The change is described by a single
    /// prefix/suffix diff; suggestions touching the edited range are dropped,
    /// those after it are shifted.
    pub fn edit_text(&mut self, new_text: &str) -> EditOutcome {
        let new_chars: Vec<char> = new_text.chars().collect();
        let Some(edit) = TextEdit::between(&self.text, &new_chars) else {
            return EditOutcome::default();
        };
        self.text = new_chars;
        let dropped = self.reanchor(&edit);
        EditOutcome {
            edit: Some(edit),
            dropped,
        }
    }

    /// Replace the buffer wholesale (a different document was opened).
    pub fn load_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.live.clear();
    }

    /// Accept one live suggestion: splice its replacement into the buffer
    /// and re-anchor the rest.
    ///
    /// A suggestion that no longer matches the buffer clears the whole live
    /// set and returns [`StoreError::StaleSuggestion`].
    pub fn accept_suggestion(&mut self, id: &SuggestionId) -> Result<AcceptOutcome, StoreError> {
        let index = self.position(id)?;
        self.ensure_fresh(index)?;

        let accepted = self.live.remove(index);
        let edit = span::splice(&mut self.text, accepted.span, &accepted.replacement_text)
            .ok_or_else(|| self.stale(id))?;
        let dropped = self.reanchor(&edit);

        debug!(id = %accepted.id, span = %accepted.span, dropped, "accepted suggestion");
        self.events.push(LifecycleEvent::accepted(&accepted));
        Ok(AcceptOutcome {
            accepted,
            edit,
            dropped,
        })
    }

    /// Accept every live suggestion, right to left.
    ///
    /// Equivalent to calling [`accept_suggestion`](Self::accept_suggestion)
    /// on each in descending start order: no step moves a span that has not
    /// been processed yet. Suggestions that no longer match at their turn are
    /// skipped. The live set is empty afterwards.
    pub fn accept_all(&mut self) -> AcceptAllOutcome {
        let mut outcome = AcceptAllOutcome::default();
        let pending = std::mem::take(&mut self.live);

        for suggestion in pending.into_iter().rev() {
            if !span::is_valid(&self.text, suggestion.span, &suggestion.original_text) {
                outcome.skipped.push(suggestion.id);
                continue;
            }
            let replacement = &suggestion.replacement_text;
            if span::splice(&mut self.text, suggestion.span, replacement).is_none() {
                outcome.skipped.push(suggestion.id);
                continue;
            }
            self.events.push(LifecycleEvent::accepted(&suggestion));
            outcome.applied.push(suggestion.id);
        }

        if !outcome.skipped.is_empty() {
            warn!(skipped = outcome.skipped.len(), "accept all skipped stale suggestions");
        }
        outcome
    }

    /// Remove a live suggestion without touching the buffer.
    pub fn dismiss_suggestion(&mut self, id: &SuggestionId) -> Result<Suggestion, StoreError> {
        let index = self.position(id)?;
        self.ensure_fresh(index)?;

        let dismissed = self.live.remove(index);
        self.events.push(LifecycleEvent::dismissed(&dismissed));
        Ok(dismissed)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn position(&self, id: &SuggestionId) -> Result<usize, StoreError> {
        self.live
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn ensure_fresh(&mut self, index: usize) -> Result<(), StoreError> {
        let s = &self.live[index];
        if span::is_valid(&self.text, s.span, &s.original_text) {
            return Ok(());
        }
        let id = s.id.clone();
        Err(self.stale(&id))
    }

    /// Clear the live set after a stale hit and build the error.
    fn stale(&mut self, id: &SuggestionId) -> StoreError {
        let cleared = self.clear_suggestions();
        warn!(%id, cleared, "stale suggestion; live set cleared");
        StoreError::StaleSuggestion {
            id: id.clone(),
            cleared,
        }
    }

    /// Shift every live span across `edit` (already applied to the buffer)
    /// and drop those it invalidates. Returns the number dropped.
    fn reanchor(&mut self, edit: &TextEdit) -> usize {
        let before = self.live.len();
        let text = &self.text;
        self.live.retain_mut(|s| match span::shift(s.span, edit) {
            Some(shifted) if span::is_valid(text, shifted, &s.original_text) => {
                s.span = shifted;
                true
            }
            _ => false,
        });
        before - self.live.len()
    }

    /// Whether the live set satisfies the validity and no-overlap invariants.
    pub fn invariants_hold(&self) -> bool {
        let valid = self
            .live
            .iter()
            .all(|s| span::is_valid(&self.text, s.span, &s.original_text));
        let ordered = self
            .live
            .windows(2)
            .all(|w| w[0].span.end <= w[1].span.start);
        valid && ordered
    }

    /// Overwrite the buffer behind the store's back.
    #[cfg(test)]
    fn corrupt_buffer(&mut self, text: &str) {
        self.text = text.chars().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{Category, Explanation, LifecycleKind, Severity, Span};

    fn suggestion(id: &str, text: &str, original: &str, replacement: &str) -> Suggestion {
        let chars: Vec<char> = text.chars().collect();
        let needle: Vec<char> = original.chars().collect();
        let start = chars
            .windows(needle.len())
            .position(|w| w == needle.as_slice())
            .unwrap();
        Suggestion {
            id: SuggestionId::new(id),
            category: Category::Grammar,
            severity: Severity::Error,
            span: Span::at(start, needle.len()),
            original_text: original.into(),
            replacement_text: replacement.into(),
            explanation: Explanation::default(),
            confidence: 0.9,
            source_rank: 0,
        }
    }

    fn store_with(text: &str, items: &[(&str, &str, &str)]) -> SuggestionStore {
        let mut store = SuggestionStore::new(text);
        let incoming = items
            .iter()
            .map(|(id, o, r)| suggestion(id, text, o, r))
            .collect();
        store.replace_suggestions(incoming);
        store.take_events();
        store
    }

    fn id(s: &str) -> SuggestionId {
        SuggestionId::new(s)
    }

    // ====================================================================
    // replace_suggestions
    // ====================================================================

    #[test]
    fn replace_drops_invalid_and_overlapping() {
        let text = "I goed to the store";
        let mut store = SuggestionStore::new(text);
        let mut wrong = suggestion("wrong", text, "store", "shop");
        wrong.original_text = "stare".into();
        let outcome = store.replace_suggestions(vec![
            suggestion("a", text, "goed", "went"),
            suggestion("b", text, "goed to", "went into"),
            wrong,
        ]);
        assert_eq!(outcome.kept, 1);
        assert_eq!(outcome.dropped_invalid, 1);
        assert_eq!(outcome.dropped_overlapping, 1);
        assert_eq!(store.suggestions()[0].id, id("a"));
        assert!(store.invariants_hold());
    }

    #[test]
    fn replace_preserves_identity_of_unchanged_suggestions() {
        let text = "teh cat sat";
        let mut store = store_with(text, &[("old-1", "teh", "the")]);
        let outcome = store.replace_suggestions(vec![
            suggestion("new-1", text, "teh", "the"),
            suggestion("new-2", text, "sat", "sits"),
        ]);
        assert_eq!(outcome.preserved, 1);
        let ids: Vec<_> = store.suggestions().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![id("old-1"), id("new-2")]);

        // Only the newly visible suggestion is announced.
        let events = store.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LifecycleKind::Shown);
        assert_eq!(events[0].id, id("new-2"));
    }

    // ====================================================================
    // accept
    // ====================================================================

    #[test]
    fn accept_splices_and_shifts_following() {
        let text = "I have gone home";
        let mut store = store_with(text, &[("a", "gone", "go"), ("b", "home", "house")]);
        let before = store.get(&id("b")).unwrap().span;
        assert_eq!(before, Span::new(12, 16));

        let outcome = store.accept_suggestion(&id("a")).unwrap();
        assert_eq!(outcome.edit, TextEdit::new(7, 11, 2));
        assert_eq!(store.text(), "I have go home");
        assert_eq!(store.get(&id("b")).unwrap().span, Span::new(10, 14));
        assert!(store.invariants_hold());
    }

    #[test]
    fn accept_leaves_earlier_suggestions_alone() {
        let text = "teh cat are here";
        let mut store = store_with(text, &[("a", "teh", "the"), ("b", "are", "is")]);
        store.accept_suggestion(&id("b")).unwrap();
        assert_eq!(store.text(), "teh cat is here");
        assert_eq!(store.get(&id("a")).unwrap().span, Span::new(0, 3));
    }

    #[test]
    fn accept_emits_event() {
        let mut store = store_with("teh", &[("a", "teh", "the")]);
        store.accept_suggestion(&id("a")).unwrap();
        let events = store.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LifecycleKind::Accepted);
        assert_eq!(events[0].replacement_text, "the");
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn accept_unknown_id_is_not_found() {
        let mut store = store_with("teh", &[("a", "teh", "the")]);
        assert_eq!(
            store.accept_suggestion(&id("zzz")),
            Err(StoreError::NotFound(id("zzz")))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn accepting_twice_is_not_found() {
        let mut store = store_with("teh", &[("a", "teh", "the")]);
        store.accept_suggestion(&id("a")).unwrap();
        assert!(matches!(
            store.accept_suggestion(&id("a")),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.text(), "the");
    }

    #[test]
    fn accept_after_external_corruption_is_stale_and_clears() {
        let mut store = store_with("teh cat sat", &[("a", "teh", "the"), ("b", "sat", "sits")]);
        store.corrupt_buffer("the dog sat");

        let err = store.accept_suggestion(&id("a")).unwrap_err();
        assert_eq!(
            err,
            StoreError::StaleSuggestion {
                id: id("a"),
                cleared: 2
            }
        );
        assert!(store.is_empty());
        assert_eq!(store.text(), "the dog sat");
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn dismiss_after_external_corruption_is_stale() {
        let mut store = store_with("teh cat", &[("a", "teh", "the")]);
        store.corrupt_buffer("xyz cat");
        assert!(matches!(
            store.dismiss_suggestion(&id("a")),
            Err(StoreError::StaleSuggestion { .. })
        ));
        assert!(store.is_empty());
    }

    // ====================================================================
    // accept_all
    // ====================================================================

    #[test]
    fn accept_all_matches_sequential_right_to_left() {
        let text = "teh cat are gone home";
        let items = [("a", "teh", "the"), ("b", "are", "is"), ("c", "gone", "went")];

        let mut batch = store_with(text, &items);
        let outcome = batch.accept_all();
        assert_eq!(outcome.applied, vec![id("c"), id("b"), id("a")]);
        assert!(outcome.skipped.is_empty());

        let mut sequential = store_with(text, &items);
        for id_str in ["c", "b", "a"] {
            sequential.accept_suggestion(&id(id_str)).unwrap();
        }
        assert_eq!(batch.text(), sequential.text());
        assert_eq!(batch.text(), "the cat is went home");
        assert!(batch.is_empty());
        assert_eq!(batch.take_events().len(), 3);
    }

    #[test]
    fn accept_all_handles_adjacent_spans() {
        let text = "abcdef";
        let mut store = store_with(text, &[("a", "abc", "X"), ("b", "def", "YY")]);
        store.accept_all();
        assert_eq!(store.text(), "XYY");
    }

    #[test]
    fn accept_all_skips_stale_items() {
        let mut store = store_with("teh cat sat", &[("a", "teh", "the"), ("b", "sat", "sits")]);
        store.corrupt_buffer("teh cat sit");
        let outcome = store.accept_all();
        assert_eq!(outcome.applied, vec![id("a")]);
        assert_eq!(outcome.skipped, vec![id("b")]);
        assert_eq!(store.text(), "the cat sit");
    }

    // ====================================================================
    // dismiss / edit / load
    // ====================================================================

    #[test]
    fn dismiss_keeps_buffer_and_emits_event() {
        let mut store = store_with("teh cat", &[("a", "teh", "the")]);
        let dismissed = store.dismiss_suggestion(&id("a")).unwrap();
        assert_eq!(dismissed.id, id("a"));
        assert_eq!(store.text(), "teh cat");
        assert!(store.is_empty());
        let events = store.take_events();
        assert_eq!(events[0].kind, LifecycleKind::Dismissed);
    }

    #[test]
    fn edit_before_suggestion_shifts_it() {
        let mut store = store_with("teh cat", &[("a", "cat", "dog")]);
        let outcome = store.edit_text("Yes, teh cat");
        assert_eq!(outcome.dropped, 0);
        assert_eq!(store.get(&id("a")).unwrap().span, Span::new(9, 12));
        assert!(store.invariants_hold());
    }

    #[test]
    fn edit_inside_suggestion_drops_it() {
        let mut store = store_with("teh cat sat", &[("a", "teh", "the"), ("b", "sat", "sits")]);
        let outcome = store.edit_text("tXh cat sat");
        assert_eq!(outcome.edit, Some(TextEdit::new(1, 2, 1)));
        assert_eq!(outcome.dropped, 1);
        assert!(store.get(&id("a")).is_none());
        assert_eq!(store.get(&id("b")).unwrap().span, Span::new(8, 11));
    }

    #[test]
    fn appending_to_a_word_keeps_its_suggestion() {
        // Insertion exactly at a span end does not touch the span.
        let mut store = store_with("teh cat", &[("a", "teh", "the")]);
        store.edit_text("tehh cat");
        assert_eq!(store.get(&id("a")).unwrap().span, Span::new(0, 3));
    }

    #[test]
    fn identical_edit_is_a_noop() {
        let mut store = store_with("teh", &[("a", "teh", "the")]);
        assert_eq!(store.edit_text("teh"), EditOutcome::default());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn load_text_clears_live_set() {
        let mut store = store_with("teh", &[("a", "teh", "the")]);
        store.load_text("brand new");
        assert!(store.is_empty());
        assert_eq!(store.text(), "brand new");
    }

    #[test]
    fn offsets_count_code_points() {
        let text = "caf\u{e9} \u{1f600} teh";
        let mut store = store_with(text, &[("a", "teh", "the")]);
        assert_eq!(store.get(&id("a")).unwrap().span, Span::new(7, 10));
        store.accept_suggestion(&id("a")).unwrap();
        assert_eq!(store.text(), "caf\u{e9} \u{1f600} the");
    }
}
