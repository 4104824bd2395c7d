// Lifecycle events emitted by the suggestion store.

use serde::{Deserialize, Serialize};

use crate::suggestion::{Category, Explanation, Suggestion, SuggestionId};

/// What happened to a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleKind {
    Shown,
    Accepted,
    Dismissed,
}

/// A suggestion lifecycle event, carrying enough of the suggestion for the
/// pattern aggregator to categorize it without access to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub kind: LifecycleKind,
    pub id: SuggestionId,
    pub category: Category,
    pub original_text: String,
    pub replacement_text: String,
    pub explanation: Explanation,
}

impl LifecycleEvent {
    pub fn new(kind: LifecycleKind, suggestion: &Suggestion) -> Self {
        Self {
            kind,
            id: suggestion.id.clone(),
            category: suggestion.category,
            original_text: suggestion.original_text.clone(),
            replacement_text: suggestion.replacement_text.clone(),
            explanation: suggestion.explanation.clone(),
        }
    }

    pub fn shown(suggestion: &Suggestion) -> Self {
        Self::new(LifecycleKind::Shown, suggestion)
    }

    pub fn accepted(suggestion: &Suggestion) -> Self {
        Self::new(LifecycleKind::Accepted, suggestion)
    }

    pub fn dismissed(suggestion: &Suggestion) -> Self {
        Self::new(LifecycleKind::Dismissed, suggestion)
    }
}
