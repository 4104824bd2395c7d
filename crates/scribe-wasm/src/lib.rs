// WASM bindings for the Scribe suggestion lifecycle engine.
//
// Provides two classes exported via wasm-bindgen:
// - `WasmDocument` wraps a `DocumentSession` (text buffer, live suggestions,
//   analysis sequencing). Providers run on the JavaScript side; their raw
//   output is handed back with `applyProviderResult`.
// - `WasmPatternTracker` wraps the `ErrorPatternAggregator`.
//
// Complex values cross the boundary as camelCase objects through
// serde-wasm-bindgen. Explanations are flattened to the "english | native"
// delimited string the UI displays.
//
// Usage from JavaScript:
//
//   const doc = new WasmDocument("essay-1");
//   doc.loadText(text, Date.now());
//   if (doc.shouldAnalyze(Date.now())) {
//     const req = doc.beginAnalysis(Date.now());   // => { seq, text, cached }
//     doc.applyProviderResult(req.seq, "grammar", rawItems);
//   }
//   doc.suggestions();                              // => [{ id, start, end, ... }]
//   doc.acceptSuggestion(id);
//   tracker.observe(doc.takeEvents());

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use scribe_core::{
    Category, Explanation, LifecycleEvent, LifecycleKind, ProviderError, RawSuggestion, Suggestion,
    SuggestionId,
};
use scribe_engine::{
    AggregatorConfig, AnalysisRequest, ApplyOutcome, ApplySummary, DiscardReason, DocumentSession,
    EngineConfig, ErrorPatternAggregator, FallbackProvider, PatternReport,
};

// ============================================================================
// Serde-serializable DTO types for JS interop
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsSuggestion {
    id: String,
    category: String,
    severity: String,
    start: usize,
    end: usize,
    original_text: String,
    replacement_text: String,
    explanation: String,
    confidence: f32,
    source_rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsAnalysisRequest {
    seq: u64,
    /// Text to analyze; absent when the result came from the cache.
    text: Option<String>,
    cached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsApplyOutcome {
    applied: bool,
    discard_reason: Option<&'static str>,
    live: usize,
    unlocatable: usize,
    rejected: usize,
    suppressed: usize,
    resolved_away: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsEvent {
    kind: LifecycleKind,
    id: String,
    category: String,
    original_text: String,
    replacement_text: String,
    #[serde(default)]
    explanation: String,
}

// ============================================================================
// Conversion helpers
// ============================================================================

fn to_js_suggestion(s: &Suggestion) -> JsSuggestion {
    JsSuggestion {
        id: s.id.to_string(),
        category: s.category.label().to_string(),
        severity: s.severity.label().to_string(),
        start: s.start(),
        end: s.end(),
        original_text: s.original_text.clone(),
        replacement_text: s.replacement_text.clone(),
        explanation: s.explanation.to_delimited(),
        confidence: s.confidence,
        source_rank: s.source_rank,
    }
}

fn to_js_event(e: &LifecycleEvent) -> JsEvent {
    JsEvent {
        kind: e.kind,
        id: e.id.to_string(),
        category: e.category.label().to_string(),
        original_text: e.original_text.clone(),
        replacement_text: e.replacement_text.clone(),
        explanation: e.explanation.to_delimited(),
    }
}

fn from_js_event(e: JsEvent) -> Option<LifecycleEvent> {
    Some(LifecycleEvent {
        kind: e.kind,
        id: SuggestionId::new(e.id),
        category: Category::from_label(&e.category)?,
        original_text: e.original_text,
        replacement_text: e.replacement_text,
        explanation: Explanation::parse_delimited(&e.explanation),
    })
}

fn discard_reason_to_str(reason: DiscardReason) -> &'static str {
    match reason {
        DiscardReason::SupersededByEdit => "supersededByEdit",
        DiscardReason::SupersededByNewerAnalysis => "supersededByNewerAnalysis",
        DiscardReason::UnknownAnalysis => "unknownAnalysis",
        DiscardReason::UnknownProvider => "unknownProvider",
        DiscardReason::ProviderFailed => "providerFailed",
    }
}

fn to_js_outcome(outcome: &ApplyOutcome) -> JsApplyOutcome {
    let (summary, discard_reason) = match outcome {
        ApplyOutcome::Applied(summary) => (*summary, None),
        ApplyOutcome::Discarded(reason) => {
            (ApplySummary::default(), Some(discard_reason_to_str(*reason)))
        }
    };
    JsApplyOutcome {
        applied: discard_reason.is_none(),
        discard_reason,
        live: summary.live,
        unlocatable: summary.unlocatable,
        rejected: summary.rejected,
        suppressed: summary.suppressed,
        resolved_away: summary.resolved_away,
    }
}

/// JavaScript numbers (timestamps, sequence numbers) arrive as doubles.
fn to_u64(n: f64) -> u64 {
    if n.is_finite() && n > 0.0 { n as u64 } else { 0 }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&e.to_string()))
}

fn to_js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

// ============================================================================
// WasmDocument
// ============================================================================

/// One open document with its live suggestions.
#[wasm_bindgen]
pub struct WasmDocument {
    document_id: String,
    session: DocumentSession,
    fallback: FallbackProvider,
}

#[wasm_bindgen]
impl WasmDocument {
    /// Create an empty document.
    ///
    /// - `document_id`: caller-chosen identifier, echoed back by `documentId`
    /// - `config_toml`: engine configuration (optional; defaults otherwise)
    #[wasm_bindgen(constructor)]
    pub fn new(document_id: String, config_toml: Option<String>) -> Result<WasmDocument, JsError> {
        let config = match config_toml {
            Some(toml) => EngineConfig::from_toml_str(&toml).map_err(to_js_error)?,
            None => EngineConfig::default(),
        };
        let fallback = FallbackProvider::with_rules(&config.fallback_rules).map_err(to_js_error)?;
        Ok(WasmDocument {
            document_id,
            session: DocumentSession::new("", config),
            fallback,
        })
    }

    #[wasm_bindgen(getter, js_name = "documentId")]
    pub fn document_id(&self) -> String {
        self.document_id.clone()
    }

    pub fn text(&self) -> String {
        self.session.text()
    }

    /// Live suggestions in ascending start order.
    pub fn suggestions(&self) -> Result<JsValue, JsError> {
        let live: Vec<JsSuggestion> =
            self.session.suggestions().iter().map(to_js_suggestion).collect();
        to_js(&live)
    }

    /// Apply a direct user edit. Returns the number of suggestions dropped.
    #[wasm_bindgen(js_name = "editText")]
    pub fn edit_text(&mut self, text: &str, now_ms: f64) -> usize {
        self.session.edit_text(text, to_u64(now_ms)).dropped
    }

    /// Replace the whole text (a different document was opened).
    #[wasm_bindgen(js_name = "loadText")]
    pub fn load_text(&mut self, text: &str, now_ms: f64) {
        self.session.load_text(text, to_u64(now_ms));
    }

    /// Accept a suggestion and return the new text.
    #[wasm_bindgen(js_name = "acceptSuggestion")]
    pub fn accept_suggestion(&mut self, id: &str) -> Result<String, JsError> {
        self.session
            .accept_suggestion(&SuggestionId::new(id))
            .map_err(to_js_error)?;
        Ok(self.session.text())
    }

    #[wasm_bindgen(js_name = "dismissSuggestion")]
    pub fn dismiss_suggestion(&mut self, id: &str) -> Result<(), JsError> {
        self.session
            .dismiss_suggestion(&SuggestionId::new(id))
            .map(|_| ())
            .map_err(to_js_error)
    }

    /// Accept every live suggestion and return the new text.
    #[wasm_bindgen(js_name = "acceptAll")]
    pub fn accept_all(&mut self) -> String {
        self.session.accept_all();
        self.session.text()
    }

    #[wasm_bindgen(js_name = "shouldAnalyze")]
    pub fn should_analyze(&self, now_ms: f64) -> bool {
        self.session.should_analyze(to_u64(now_ms))
    }

    /// Start an analysis of the current text.
    ///
    /// Returns `{ seq, text, cached }`. When `cached` is true the suggestions
    /// are already up to date and no provider needs to run.
    #[wasm_bindgen(js_name = "beginAnalysis")]
    pub fn begin_analysis(&mut self, now_ms: f64) -> Result<JsValue, JsError> {
        let request = match self.session.begin_analysis(to_u64(now_ms)) {
            AnalysisRequest::Issued(ticket) => JsAnalysisRequest {
                seq: ticket.seq,
                text: Some(ticket.text),
                cached: false,
            },
            AnalysisRequest::Cached(summary) => JsAnalysisRequest {
                seq: summary.seq,
                text: None,
                cached: true,
            },
        };
        to_js(&request)
    }

    /// Report a provider's raw items for analysis `seq`.
    #[wasm_bindgen(js_name = "applyProviderResult")]
    pub fn apply_provider_result(
        &mut self,
        seq: f64,
        provider: &str,
        raw: JsValue,
    ) -> Result<JsValue, JsError> {
        let items: Vec<RawSuggestion> = serde_wasm_bindgen::from_value(raw).map_err(to_js_error)?;
        let outcome = self.session.apply_provider_result(to_u64(seq), provider, Ok(items));
        to_js(&to_js_outcome(&outcome))
    }

    /// Report that a provider call for analysis `seq` failed.
    #[wasm_bindgen(js_name = "providerFailed")]
    pub fn provider_failed(
        &mut self,
        seq: f64,
        provider: &str,
        message: &str,
    ) -> Result<JsValue, JsError> {
        let error = ProviderError::Failed {
            provider: provider.to_string(),
            message: message.to_string(),
        };
        let outcome = self.session.apply_provider_result(to_u64(seq), provider, Err(error));
        to_js(&to_js_outcome(&outcome))
    }

    /// Run the built-in rule provider for analysis `seq`, synchronously.
    #[wasm_bindgen(js_name = "runFallback")]
    pub fn run_fallback(&mut self, seq: f64) -> Result<JsValue, JsError> {
        let raw = self.fallback.scan(&self.session.text());
        let outcome = self
            .session
            .apply_provider_result(to_u64(seq), FallbackProvider::NAME, Ok(raw));
        to_js(&to_js_outcome(&outcome))
    }

    /// Drain lifecycle events for the pattern tracker.
    #[wasm_bindgen(js_name = "takeEvents")]
    pub fn take_events(&mut self) -> Result<JsValue, JsError> {
        let events: Vec<JsEvent> = self.session.take_events().iter().map(to_js_event).collect();
        to_js(&events)
    }
}

// ============================================================================
// WasmPatternTracker
// ============================================================================

/// Longitudinal error pattern statistics.
#[wasm_bindgen]
pub struct WasmPatternTracker {
    aggregator: ErrorPatternAggregator,
}

#[wasm_bindgen]
impl WasmPatternTracker {
    /// Create a tracker, optionally restoring a report saved with `toJson`.
    #[wasm_bindgen(constructor)]
    pub fn new(persisted_json: Option<String>) -> Result<WasmPatternTracker, JsError> {
        let config = AggregatorConfig::default();
        let aggregator = match persisted_json {
            Some(json) => {
                let report: PatternReport = serde_json::from_str(&json).map_err(to_js_error)?;
                ErrorPatternAggregator::from_report(report, &config)
            }
            None => ErrorPatternAggregator::new(&config),
        };
        Ok(WasmPatternTracker { aggregator })
    }

    /// Feed events from `WasmDocument.takeEvents`. Returns the number of
    /// errors recorded.
    pub fn observe(&mut self, events: JsValue) -> Result<usize, JsError> {
        let events: Vec<JsEvent> = serde_wasm_bindgen::from_value(events).map_err(to_js_error)?;
        let events: Vec<LifecycleEvent> = events.into_iter().filter_map(from_js_event).collect();
        Ok(self.aggregator.observe_all(&events))
    }

    /// Count error opportunities in analyzed text.
    #[wasm_bindgen(js_name = "recordTextOpportunities")]
    pub fn record_text_opportunities(&mut self, text: &str) -> f64 {
        self.aggregator.record_text_opportunities(text) as f64
    }

    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        to_js(&self.aggregator.snapshot())
    }

    #[wasm_bindgen(js_name = "toJson")]
    pub fn to_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.aggregator.snapshot()).map_err(to_js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{Severity, Span};

    fn suggestion() -> Suggestion {
        Suggestion {
            id: SuggestionId::new("grammar-1-0-2"),
            category: Category::Grammar,
            severity: Severity::Error,
            span: Span::new(2, 6),
            original_text: "goed".into(),
            replacement_text: "went".into(),
            explanation: Explanation::bilingual("Irregular past tense.", "Verbo irregular."),
            confidence: 0.9,
            source_rank: 0,
        }
    }

    #[test]
    fn suggestion_dto_flattens_explanation() {
        let dto = to_js_suggestion(&suggestion());
        assert_eq!(dto.explanation, "Irregular past tense. | Verbo irregular.");
        assert_eq!((dto.start, dto.end), (2, 6));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["originalText"], "goed");
        assert_eq!(json["sourceRank"], 0);
    }

    #[test]
    fn events_survive_the_boundary() {
        let event = LifecycleEvent::accepted(&suggestion());
        let back = from_js_event(to_js_event(&event)).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn events_with_unknown_category_are_skipped() {
        let mut dto = to_js_event(&LifecycleEvent::shown(&suggestion()));
        dto.category = "poetry".into();
        assert!(from_js_event(dto).is_none());
    }

    #[test]
    fn discarded_outcome_has_reason() {
        let dto = to_js_outcome(&ApplyOutcome::Discarded(DiscardReason::SupersededByEdit));
        assert!(!dto.applied);
        assert_eq!(dto.discard_reason, Some("supersededByEdit"));
    }

    #[test]
    fn js_numbers_are_clamped() {
        assert_eq!(to_u64(f64::NAN), 0);
        assert_eq!(to_u64(-5.0), 0);
        assert_eq!(to_u64(1_500.7), 1_500);
    }
}
