// Analysis result cache for the last fully analyzed text.

use scribe_core::RawSuggestion;

/// Raw output of one provider for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult {
    pub provider: String,
    pub raw: Vec<RawSuggestion>,
}

impl CachedResult {
    pub fn new(provider: impl Into<String>, raw: Vec<RawSuggestion>) -> Self {
        Self {
            provider: provider.into(),
            raw,
        }
    }
}

/// Caches the raw provider outputs for a single text.
///
/// Only complete analyses (every expected provider answered successfully)
/// are stored. If the same text is analyzed again, the cached outputs are
/// re-applied without calling the providers. The cache is per document;
/// there is no process-wide instance.
#[derive(Debug, Clone, Default)]
pub struct AnalysisCache {
    /// The cached text, or `None` if the cache is empty.
    text: Option<Vec<char>>,

    /// Outputs for the text, one entry per provider, ordered by provider name.
    results: Vec<CachedResult>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.text = None;
        self.results.clear();
    }

    /// Cached outputs if `text` is exactly the cached text.
    pub fn check_cache(&self, text: &[char]) -> Option<&[CachedResult]> {
        match &self.text {
            Some(cached) if cached.as_slice() == text => Some(&self.results),
            _ => None,
        }
    }

    /// Store the outputs of a complete analysis of `text`, replacing any
    /// previous entry.
    pub fn store_cache(&mut self, text: &[char], mut results: Vec<CachedResult>) {
        results.sort_by(|a, b| a.provider.cmp(&b.provider));
        self.text = Some(text.to_vec());
        self.results = results;
    }

    /// Total raw items across providers.
    pub fn item_count(&self) -> usize {
        self.results.iter().map(|r| r.raw.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
