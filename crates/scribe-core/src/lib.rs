//! Shared types for the Scribe suggestion lifecycle engine.
//!
//! # Architecture
//!
//! - [`span`] -- char spans, edits, and the offset validation/shift functions
//! - [`suggestion`] -- canonical `Suggestion`, provider `RawSuggestion`, categories
//! - [`event`] -- lifecycle events consumed by the pattern aggregator
//! - [`pattern`] -- error pattern taxonomy and statistics records

pub mod event;
pub mod pattern;
pub mod span;
pub mod suggestion;

pub use event::{LifecycleEvent, LifecycleKind};
pub use pattern::{ErrorPattern, PatternArea, PatternKey, RecentError};
pub use span::{Span, TextEdit};
pub use suggestion::{Category, Explanation, RawSuggestion, Severity, Suggestion, SuggestionId};

/// Failure of an analysis provider call.
///
/// The engine treats every variant the same way: the call contributes no
/// suggestions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider {provider} failed: {message}")]
    Failed { provider: String, message: String },
    #[error("provider {provider} timed out after {millis} ms")]
    Timeout { provider: String, millis: u64 },
    #[error("provider {provider} returned malformed output: {message}")]
    Malformed { provider: String, message: String },
}

impl ProviderError {
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Failed { provider, .. }
            | ProviderError::Timeout { provider, .. }
            | ProviderError::Malformed { provider, .. } => provider,
        }
    }
}
