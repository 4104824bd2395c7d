// DocumentSession: per-document analysis orchestration.
//
// Analyses are numbered by a monotonically increasing issue sequence. A
// provider result is applied only if
//   - its sequence is newer than the last direct user edit, and
//   - no newer analysis has already been applied.
// All outputs received for the current sequence are re-normalized against
// the current buffer on every arrival, merged by the resolver and swapped
// into the store. Raw items whose suggestion was accepted are consumed and
// never relocated again.

use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};
use scribe_core::{LifecycleEvent, ProviderError, RawSuggestion, Suggestion, SuggestionId};
use tracing::{debug, warn};

use crate::cache::{AnalysisCache, CachedResult};
use crate::config::EngineConfig;
use crate::normalizer::SuggestionNormalizer;
use crate::resolver::OverlapResolver;
use crate::store::{AcceptAllOutcome, AcceptOutcome, EditOutcome, StoreError, SuggestionStore};

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

/// Quiet-period tracker driven by caller-supplied millisecond timestamps.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_ms: u64,
    last_change_ms: Option<u64>,
    dirty: bool,
}

impl Debouncer {
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            last_change_ms: None,
            dirty: true,
        }
    }

    /// Record a text change at `now_ms`.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_change_ms = Some(now_ms);
        self.dirty = true;
    }

    /// Record a change that does not restart the quiet period, such as an
    /// accepted suggestion.
    pub fn mark_changed(&mut self) {
        self.dirty = true;
    }

    /// The text changed since the last issued analysis and has been quiet
    /// for the full period.
    pub fn ready(&self, now_ms: u64) -> bool {
        self.dirty
            && self
                .last_change_ms
                .is_none_or(|last| now_ms.saturating_sub(last) >= self.quiet_ms)
    }

    pub fn mark_issued(&mut self) {
        self.dirty = false;
    }

    pub fn quiet_ms(&self) -> u64 {
        self.quiet_ms
    }
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// An analysis the caller should run against `text` with every provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub seq: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    /// Providers must be called; report results under `ticket.seq`.
    Issued(AnalysisTicket),
    /// The text was analyzed before; cached outputs were applied.
    Cached(ApplySummary),
}

/// One provider's answer for an analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutput {
    pub provider: String,
    pub result: Result<Vec<RawSuggestion>, ProviderError>,
}

impl ProviderOutput {
    pub fn ok(provider: impl Into<String>, raw: Vec<RawSuggestion>) -> Self {
        Self {
            provider: provider.into(),
            result: Ok(raw),
        }
    }

    pub fn failed(provider: impl Into<String>, error: ProviderError) -> Self {
        Self {
            provider: provider.into(),
            result: Err(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The user edited the text after this analysis was issued.
    SupersededByEdit,
    /// A newer analysis has already been applied.
    SupersededByNewerAnalysis,
    /// The sequence number was never issued by this session.
    UnknownAnalysis,
    /// The provider is not in the configured rank table.
    UnknownProvider,
    /// The provider call failed; it contributes nothing.
    ProviderFailed,
}

/// Counters from rebuilding the live set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub seq: u64,
    /// Live suggestions after the swap.
    pub live: usize,
    pub unlocatable: usize,
    pub rejected: usize,
    /// Candidates matching a dismissed suggestion.
    pub suppressed: usize,
    /// Candidates lost to overlap resolution or store re-validation.
    pub resolved_away: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(ApplySummary),
    Discarded(DiscardReason),
}

// ---------------------------------------------------------------------------
// DocumentSession
// ---------------------------------------------------------------------------

/// A raw item, addressed by provider and position in its output.
type RawOrigin = (String, usize);

#[derive(Debug, Default)]
struct PendingAnalysis {
    snapshot: Vec<char>,
    results: Vec<CachedResult>,
    answered: HashSet<String>,
    failed: usize,
    /// Live suggestion id to the raw item it was built from.
    origins: HashMap<SuggestionId, RawOrigin>,
    /// Raw items already applied by an accept.
    consumed: HashSet<RawOrigin>,
}

/// One open document: store, rank table, cache, debouncer and sequencing.
#[derive(Debug)]
pub struct DocumentSession {
    store: SuggestionStore,
    config: EngineConfig,
    resolver: OverlapResolver,
    cache: AnalysisCache,
    debouncer: Debouncer,
    /// Last issued sequence number; 0 before the first analysis.
    issued_seq: u64,
    /// `issued_seq` at the time of the last direct user edit.
    last_edit_seq: u64,
    /// Sequence whose outputs currently populate the live set.
    applied_seq: u64,
    pending: BTreeMap<u64, PendingAnalysis>,
    /// `(original, replacement)` pairs the user dismissed.
    dismissed: HashSet<(String, String)>,
}

impl DocumentSession {
    pub fn new(text: &str, config: EngineConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce_ms);
        Self {
            store: SuggestionStore::new(text),
            config,
            resolver: OverlapResolver::new(),
            cache: AnalysisCache::new(),
            debouncer,
            issued_seq: 0,
            last_edit_seq: 0,
            applied_seq: 0,
            pending: BTreeMap::new(),
            dismissed: HashSet::new(),
        }
    }

    pub fn text(&self) -> String {
        self.store.text()
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.store.suggestions()
    }

    pub fn store(&self) -> &SuggestionStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn issued_seq(&self) -> u64 {
        self.issued_seq
    }

    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    pub fn take_events(&mut self) -> Vec<LifecycleEvent> {
        self.store.take_events()
    }

    // -----------------------------------------------------------------------
    // Text and suggestion operations
    // -----------------------------------------------------------------------

    /// Direct user edit. Invalidates every analysis issued so far.
    pub fn edit_text(&mut self, new_text: &str, now_ms: u64) -> EditOutcome {
        let outcome = self.store.edit_text(new_text);
        if outcome.edit.is_some() {
            self.last_edit_seq = self.issued_seq;
            self.pending.clear();
            self.debouncer.touch(now_ms);
        }
        outcome
    }

    /// Open a different text in this session.
    pub fn load_text(&mut self, text: &str, now_ms: u64) {
        self.store.load_text(text);
        self.last_edit_seq = self.issued_seq;
        self.pending.clear();
        self.dismissed.clear();
        self.debouncer.touch(now_ms);
    }

    /// Accept one suggestion. The text becomes due for analysis again and
    /// the raw item behind the suggestion is not offered by later arrivals.
    pub fn accept_suggestion(&mut self, id: &SuggestionId) -> Result<AcceptOutcome, StoreError> {
        let outcome = self.store.accept_suggestion(id)?;
        self.consume(std::slice::from_ref(id));
        self.debouncer.mark_changed();
        Ok(outcome)
    }

    pub fn accept_all(&mut self) -> AcceptAllOutcome {
        let outcome = self.store.accept_all();
        if !outcome.applied.is_empty() {
            self.consume(&outcome.applied);
            self.debouncer.mark_changed();
        }
        outcome
    }

    fn consume(&mut self, ids: &[SuggestionId]) {
        let Some(pending) = self.pending.get_mut(&self.applied_seq) else {
            return;
        };
        for id in ids {
            if let Some(origin) = pending.origins.remove(id) {
                pending.consumed.insert(origin);
            }
        }
    }

    /// Dismiss a suggestion; the same change is not offered again in this
    /// session.
    pub fn dismiss_suggestion(&mut self, id: &SuggestionId) -> Result<Suggestion, StoreError> {
        let dismissed = self.store.dismiss_suggestion(id)?;
        self.dismissed.insert((
            dismissed.original_text.clone(),
            dismissed.replacement_text.clone(),
        ));
        Ok(dismissed)
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    pub fn should_analyze(&self, now_ms: u64) -> bool {
        self.debouncer.ready(now_ms)
    }

    /// Issue an analysis of the current text, or re-apply cached outputs if
    /// this exact text was fully analyzed before.
    pub fn begin_analysis(&mut self, now_ms: u64) -> AnalysisRequest {
        self.debouncer.mark_issued();
        self.issued_seq += 1;
        let seq = self.issued_seq;

        if let Some(cached) = self.cache.check_cache(self.store.chars()) {
            let results = cached.to_vec();
            debug!(seq, providers = results.len(), "analysis served from cache");
            let answered = results.iter().map(|r| r.provider.clone()).collect();
            self.pending.insert(
                seq,
                PendingAnalysis {
                    snapshot: self.store.chars().to_vec(),
                    results,
                    answered,
                    ..PendingAnalysis::default()
                },
            );
            return AnalysisRequest::Cached(self.rebuild(seq));
        }

        self.pending.insert(
            seq,
            PendingAnalysis {
                snapshot: self.store.chars().to_vec(),
                ..PendingAnalysis::default()
            },
        );
        debug!(seq, now_ms, "analysis issued");
        AnalysisRequest::Issued(AnalysisTicket {
            seq,
            text: self.store.text(),
        })
    }

    /// Report one provider's answer for analysis `seq`.
    pub fn apply_provider_result(
        &mut self,
        seq: u64,
        provider: &str,
        result: Result<Vec<RawSuggestion>, ProviderError>,
    ) -> ApplyOutcome {
        if self.config.rank_of(provider).is_none() {
            warn!(seq, provider, "result from unconfigured provider ignored");
            return ApplyOutcome::Discarded(DiscardReason::UnknownProvider);
        }
        if seq == 0 || seq > self.issued_seq {
            return ApplyOutcome::Discarded(DiscardReason::UnknownAnalysis);
        }
        if seq <= self.last_edit_seq {
            debug!(seq, provider, last_edit_seq = self.last_edit_seq, "result superseded by edit");
            return ApplyOutcome::Discarded(DiscardReason::SupersededByEdit);
        }
        if seq < self.applied_seq {
            debug!(
                seq,
                provider,
                applied_seq = self.applied_seq,
                "result superseded by newer analysis"
            );
            return ApplyOutcome::Discarded(DiscardReason::SupersededByNewerAnalysis);
        }
        let Some(pending) = self.pending.get_mut(&seq) else {
            return ApplyOutcome::Discarded(DiscardReason::UnknownAnalysis);
        };

        pending.answered.insert(provider.to_string());
        let raw = match result {
            Ok(raw) => raw,
            Err(error) => {
                pending.failed += 1;
                warn!(seq, provider, %error, "provider failed");
                return ApplyOutcome::Discarded(DiscardReason::ProviderFailed);
            }
        };
        pending.results.retain(|r| r.provider != provider);
        pending.consumed.retain(|(p, _)| p != provider);
        pending.results.push(CachedResult::new(provider, raw));

        let complete = pending.failed == 0
            && self
                .config
                .providers
                .iter()
                .all(|p| pending.answered.contains(&p.name));
        if complete {
            self.cache.store_cache(&pending.snapshot, pending.results.clone());
        }

        ApplyOutcome::Applied(self.rebuild(seq))
    }

    /// Apply several answers for one analysis, in order.
    pub fn apply_outputs(&mut self, seq: u64, outputs: Vec<ProviderOutput>) -> Vec<ApplyOutcome> {
        outputs
            .into_iter()
            .map(|o| self.apply_provider_result(seq, &o.provider, o.result))
            .collect()
    }

    /// Re-normalize every output of `seq` against the current buffer, resolve
    /// overlaps and swap the result into the store.
    fn rebuild(&mut self, seq: u64) -> ApplySummary {
        self.applied_seq = seq;
        self.pending.retain(|&s, _| s >= seq);

        let mut summary = ApplySummary {
            seq,
            ..ApplySummary::default()
        };
        let Some(pending) = self.pending.get(&seq) else {
            return summary;
        };

        let mut candidates = Vec::new();
        let mut sources: HashMap<SuggestionId, RawOrigin> = HashMap::new();
        for result in &pending.results {
            let Some(rank) = self.config.rank_of(&result.provider) else {
                continue;
            };
            let skip: HashSet<usize> = pending
                .consumed
                .iter()
                .filter(|(p, _)| *p == result.provider)
                .map(|&(_, index)| index)
                .collect();
            let normalized = SuggestionNormalizer::new(result.provider.clone(), rank)
                .with_near_miss_window(self.config.near_miss_window)
                .normalize_skipping(self.store.chars(), &result.raw, seq, &skip);
            summary.unlocatable += normalized.unlocatable;
            summary.rejected += normalized.rejected;
            for (suggestion, index) in normalized.suggestions.into_iter().zip(normalized.sources) {
                sources.insert(suggestion.id.clone(), (result.provider.clone(), index));
                candidates.push(suggestion);
            }
        }

        let before = candidates.len();
        candidates.retain(|s| {
            !self
                .dismissed
                .contains(&(s.original_text.clone(), s.replacement_text.clone()))
        });
        summary.suppressed = before - candidates.len();

        let offered = candidates.len();
        let resolved = self.resolver.resolve(candidates);
        let replaced = self.store.replace_suggestions(resolved.clone());
        summary.live = replaced.kept;
        summary.resolved_away = offered - replaced.kept;

        // The store keeps the id of an unchanged live suggestion, so match
        // live entries back to the candidate they came from.
        let origins: HashMap<SuggestionId, RawOrigin> = self
            .store
            .suggestions()
            .iter()
            .filter_map(|live| {
                let candidate = resolved.iter().find(|c| c.same_change(live))?;
                let origin = sources.get(&candidate.id)?;
                Some((live.id.clone(), origin.clone()))
            })
            .collect();
        if let Some(pending) = self.pending.get_mut(&seq) {
            pending.origins = origins;
        }

        debug!(
            seq,
            live = summary.live,
            unlocatable = summary.unlocatable,
            suppressed = summary.suppressed,
            "live set rebuilt"
        );
        summary
    }
}
