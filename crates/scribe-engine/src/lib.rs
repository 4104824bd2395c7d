//! Suggestion lifecycle engine for writing feedback.
//!
//! # Architecture
//!
//! - [`normalizer`] -- turns raw provider output into located suggestions
//! - [`resolver`] -- picks a non-overlapping subset by provider rank
//! - [`store`] -- the text buffer and its live suggestions; accept, dismiss, edit
//! - [`session`] -- debounce, analysis sequencing, stale result rejection
//! - [`cache`] -- raw outputs of the last fully analyzed text
//! - [`provider`] -- provider capability, the async runner, the offline rule provider
//! - [`aggregator`] -- longitudinal error pattern statistics
//! - [`config`] -- TOML configuration
//!
//! All offsets are char offsets into the current text.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod normalizer;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod store;

pub use aggregator::{AreaSummary, Engagement, ErrorPatternAggregator, PatternReport};
pub use cache::{AnalysisCache, CachedResult};
pub use config::{AggregatorConfig, ConfigError, EngineConfig, ProviderSpec};
pub use normalizer::{Normalized, SuggestionNormalizer};
pub use provider::fallback::{FallbackProvider, FallbackRule};
#[cfg(feature = "providers")]
pub use provider::{AnalysisProvider, AnalysisRunner};
pub use resolver::OverlapResolver;
pub use session::{
    AnalysisRequest, AnalysisTicket, ApplyOutcome, ApplySummary, Debouncer, DiscardReason,
    DocumentSession, ProviderOutput,
};
pub use store::{
    AcceptAllOutcome, AcceptOutcome, EditOutcome, ReplaceOutcome, StoreError, SuggestionStore,
};
