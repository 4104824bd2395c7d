// Provider runner behaviour: concurrency, timeouts, failures and the
// analysis cache, driven on a paused tokio clock.

#![cfg(feature = "providers")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use scribe_core::{ProviderError, RawSuggestion};
use scribe_engine::{
    AnalysisProvider, AnalysisRequest, AnalysisRunner, ApplyOutcome, DiscardReason,
    DocumentSession, EngineConfig, FallbackProvider, ProviderSpec,
};

// ---------------------------------------------------------------------------
// Mock providers
// ---------------------------------------------------------------------------

struct Fixed {
    name: &'static str,
    delay: Duration,
    items: Vec<RawSuggestion>,
    calls: AtomicUsize,
}

impl Fixed {
    fn new(name: &'static str, delay_ms: u64, items: Vec<RawSuggestion>) -> Arc<Self> {
        Arc::new(Self {
            name,
            delay: Duration::from_millis(delay_ms),
            items,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AnalysisProvider for Fixed {
    fn name(&self) -> &str {
        self.name
    }

    async fn analyze(&self, _text: &str) -> Result<Vec<RawSuggestion>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.items.clone())
    }
}

struct Broken;

#[async_trait]
impl AnalysisProvider for Broken {
    fn name(&self) -> &str {
        "vocabulary"
    }

    async fn analyze(&self, _text: &str) -> Result<Vec<RawSuggestion>, ProviderError> {
        Err(ProviderError::Failed {
            provider: "vocabulary".into(),
            message: "503 from upstream".into(),
        })
    }
}

fn config(providers: &[(&str, u32)]) -> EngineConfig {
    EngineConfig {
        providers: providers
            .iter()
            .map(|(name, rank)| ProviderSpec::new(*name, *rank))
            .collect(),
        ..EngineConfig::default()
    }
}

fn teh_at_start() -> RawSuggestion {
    RawSuggestion::new("spelling", "teh", "the").at(0, 3)
}

fn ticket(session: &mut DocumentSession) -> scribe_engine::AnalysisTicket {
    match session.begin_analysis(0) {
        AnalysisRequest::Issued(ticket) => ticket,
        other => panic!("expected a fresh ticket, got {other:?}"),
    }
}

// ====================================================================
// Runner
// ====================================================================

#[tokio::test(start_paused = true)]
async fn slow_provider_times_out_without_blocking_others() {
    let fast = Fixed::new("grammar", 10, vec![teh_at_start()]);
    let slow = Fixed::new(
        "vocabulary",
        60_000,
        vec![RawSuggestion::new("vocabulary", "cat", "feline")],
    );
    let runner = AnalysisRunner::new(Duration::from_millis(1_000))
        .with_provider(fast.clone())
        .with_provider(slow.clone());

    let outputs = runner.run("teh cat").await;
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].provider, "grammar");
    assert_eq!(outputs[0].result.as_ref().unwrap().len(), 1);
    assert_eq!(
        outputs[1].result,
        Err(ProviderError::Timeout {
            provider: "vocabulary".into(),
            millis: 1_000
        })
    );
    assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn timed_out_provider_leaves_other_results_live() {
    let mut session =
        DocumentSession::new("teh cat sat", config(&[("grammar", 0), ("vocabulary", 1)]));
    let runner = AnalysisRunner::new(Duration::from_millis(500))
        .with_provider(Fixed::new("grammar", 5, vec![teh_at_start()]))
        .with_provider(Fixed::new("vocabulary", 5_000, vec![]));

    let t = ticket(&mut session);
    let outcomes = runner.run_ticket(&mut session, &t).await;

    assert!(matches!(outcomes[0], ApplyOutcome::Applied(_)));
    assert_eq!(outcomes[1], ApplyOutcome::Discarded(DiscardReason::ProviderFailed));
    assert_eq!(session.suggestions().len(), 1);
    assert_eq!(session.suggestions()[0].replacement_text, "the");
}

#[tokio::test(start_paused = true)]
async fn failing_provider_contributes_nothing() {
    let mut session = DocumentSession::new("teh cat", config(&[("grammar", 0), ("vocabulary", 1)]));
    let runner = AnalysisRunner::new(Duration::from_secs(20))
        .with_provider(Arc::new(Broken))
        .with_provider(Fixed::new(
            "grammar",
            0,
            vec![RawSuggestion::new("spelling", "teh", "the")],
        ));

    let t = ticket(&mut session);
    let outcomes = runner.run_ticket(&mut session, &t).await;
    assert_eq!(outcomes[0], ApplyOutcome::Discarded(DiscardReason::ProviderFailed));
    assert_eq!(session.suggestions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn edit_during_analysis_discards_results() {
    let mut session = DocumentSession::new("teh cat", config(&[("grammar", 0)]));
    let runner = AnalysisRunner::new(Duration::from_secs(20))
        .with_provider(Fixed::new("grammar", 100, vec![teh_at_start()]));

    let t = ticket(&mut session);
    let outputs = runner.run(&t.text).await;
    session.edit_text("teh cat!", 50);
    let outcomes = session.apply_outputs(t.seq, outputs);

    assert_eq!(outcomes, vec![ApplyOutcome::Discarded(DiscardReason::SupersededByEdit)]);
    assert!(session.suggestions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unchanged_text_is_served_from_cache() {
    let grammar = Fixed::new("grammar", 10, vec![teh_at_start()]);
    let mut session = DocumentSession::new("teh cat", config(&[("grammar", 0)]));
    let runner = AnalysisRunner::new(Duration::from_secs(20)).with_provider(grammar.clone());

    let t = ticket(&mut session);
    runner.run_ticket(&mut session, &t).await;
    let first = session.suggestions().to_vec();

    session.edit_text("teh cats", 100);
    session.edit_text("teh cat", 200);
    assert!(session.should_analyze(1_200));

    match session.begin_analysis(1_200) {
        AnalysisRequest::Cached(summary) => assert_eq!(summary.live, 1),
        other => panic!("expected cached analysis, got {other:?}"),
    }
    assert_eq!(grammar.calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.suggestions()[0].span, first[0].span);
}

// ====================================================================
// Fallback provider through the runner
// ====================================================================

#[tokio::test]
async fn fallback_provider_runs_offline() {
    let mut session = DocumentSession::new(
        "I recieve alot of emails.",
        config(&[(FallbackProvider::NAME, 0)]),
    );
    let runner = AnalysisRunner::new(Duration::from_secs(1))
        .with_provider(Arc::new(FallbackProvider::builtin()));
    assert_eq!(runner.provider_names(), vec![FallbackProvider::NAME]);

    let t = ticket(&mut session);
    runner.run_ticket(&mut session, &t).await;

    let live: Vec<(&str, &str)> = session
        .suggestions()
        .iter()
        .map(|s| (s.original_text.as_str(), s.replacement_text.as_str()))
        .collect();
    assert_eq!(live, vec![("recieve", "receive"), ("alot", "a lot")]);

    session.accept_all();
    assert_eq!(session.text(), "I receive a lot of emails.");
}
