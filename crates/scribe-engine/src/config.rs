// Engine configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::provider::fallback::{FallbackProvider, FallbackRule};

pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_MAX_EXAMPLES: usize = 5;
pub const DEFAULT_MAX_RECENT_ERRORS: usize = 10;

const DEBOUNCE_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// An analysis provider and its overlap priority (lower wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub rank: u32,
}

impl ProviderSpec {
    pub fn new(name: impl Into<String>, rank: u32) -> Self {
        Self {
            name: name.into(),
            rank,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Distinct example originals kept per pattern.
    pub max_examples: usize,
    /// Size of the per-pattern recent error ring.
    pub max_recent_errors: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_examples: DEFAULT_MAX_EXAMPLES,
            max_recent_errors: DEFAULT_MAX_RECENT_ERRORS,
        }
    }
}

/// Per-document engine configuration.
///
/// Every field has a default, so an empty file is a valid configuration:
///
/// ```toml
/// debounce_ms = 800
///
/// [[providers]]
/// name = "grammar"
/// rank = 0
///
/// [[fallback_rules]]
/// pattern = "alot"
/// replacement = "a lot"
/// category = "spelling"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before an analysis is issued.
    pub debounce_ms: u64,
    pub provider_timeout_ms: u64,
    /// Near-miss relocation radius, in chars.
    pub near_miss_window: usize,
    pub providers: Vec<ProviderSpec>,
    pub aggregator: AggregatorConfig,
    /// Rules added to the built-in fallback table.
    pub fallback_rules: Vec<FallbackRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            near_miss_window: crate::normalizer::DEFAULT_NEAR_MISS_WINDOW,
            providers: vec![
                ProviderSpec::new("grammar", 0),
                ProviderSpec::new("vocabulary", 1),
                ProviderSpec::new(FallbackProvider::NAME, 2),
            ],
            aggregator: AggregatorConfig::default(),
            fallback_rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !DEBOUNCE_RANGE_MS.contains(&self.debounce_ms) {
            return Err(ConfigError::Invalid(format!(
                "debounce_ms must be within {}..={}, got {}",
                DEBOUNCE_RANGE_MS.start(),
                DEBOUNCE_RANGE_MS.end(),
                self.debounce_ms
            )));
        }
        if self.provider_timeout_ms == 0 {
            return Err(ConfigError::Invalid("provider_timeout_ms must be positive".into()));
        }
        if self.providers.is_empty() {
            return Err(ConfigError::Invalid("at least one provider is required".into()));
        }
        for (i, spec) in self.providers.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("provider #{i} has an empty name")));
            }
            if self.providers[..i].iter().any(|p| p.name == spec.name) {
                return Err(ConfigError::Invalid(format!(
                    "provider {} is listed twice",
                    spec.name
                )));
            }
        }
        if self.aggregator.max_examples == 0 || self.aggregator.max_recent_errors == 0 {
            return Err(ConfigError::Invalid(
                "aggregator limits must be positive".into(),
            ));
        }
        for rule in &self.fallback_rules {
            rule.compile().map_err(|e| {
                ConfigError::Invalid(format!("fallback rule {:?}: {e}", rule.pattern))
            })?;
        }
        Ok(())
    }

    /// Rank of the named provider, if configured.
    pub fn rank_of(&self, provider: &str) -> Option<u32> {
        self.providers
            .iter()
            .find(|p| p.name == provider)
            .map(|p| p.rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.debounce_ms, 1000);
        assert_eq!(config.near_miss_window, 5);
        assert_eq!(config.rank_of("grammar"), Some(0));
        assert_eq!(config.rank_of("vocabulary"), Some(1));
        assert_eq!(config.rank_of("nope"), None);
    }

    #[test]
    fn parses_full_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            debounce_ms = 800
            provider_timeout_ms = 5000
            near_miss_window = 3

            [aggregator]
            max_examples = 3

            [[providers]]
            name = "spelling"
            rank = 0

            [[providers]]
            name = "style"
            rank = 4

            [[fallback_rules]]
            pattern = "alot"
            replacement = "a lot"
            category = "spelling"
            "#,
        )
        .unwrap();
        assert_eq!(config.debounce_ms, 800);
        assert_eq!(config.near_miss_window, 3);
        assert_eq!(config.aggregator.max_examples, 3);
        assert_eq!(config.aggregator.max_recent_errors, 10);
        assert_eq!(config.rank_of("style"), Some(4));
        assert_eq!(config.fallback_rules.len(), 1);
    }

    #[test]
    fn rejects_out_of_range_debounce() {
        let err = EngineConfig::from_toml_str("debounce_ms = 50").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_providers() {
        let err = EngineConfig::from_toml_str(
            r#"
            [[providers]]
            name = "a"
            rank = 0
            [[providers]]
            name = "a"
            rank = 1
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn rejects_bad_fallback_pattern() {
        let err = EngineConfig::from_toml_str(
            r#"
            [[fallback_rules]]
            pattern = "(unclosed"
            replacement = "x"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = EngineConfig::from_toml_str("debounce_ms = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/scribe.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
