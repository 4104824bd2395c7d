//! Analysis provider capability.
//!
//! A provider turns text into raw suggestions. The engine never talks to a
//! network itself: providers are injected, and their answers are reported to
//! a [`DocumentSession`](crate::session::DocumentSession) under the sequence
//! number of the analysis they belong to.

pub mod fallback;

#[cfg(feature = "providers")]
pub use runner::{AnalysisProvider, AnalysisRunner};

#[cfg(feature = "providers")]
mod runner {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::future::join_all;
    use scribe_core::{ProviderError, RawSuggestion};
    use tracing::{debug, warn};

    use crate::session::{AnalysisTicket, ApplyOutcome, DocumentSession, ProviderOutput};

    /// `analyze(text) -> raw suggestions`. A rejected or timed-out call
    /// contributes nothing.
    #[async_trait]
    pub trait AnalysisProvider: Send + Sync {
        /// Name used to look up the provider's rank.
        fn name(&self) -> &str;

        async fn analyze(&self, text: &str) -> Result<Vec<RawSuggestion>, ProviderError>;
    }

    /// Runs every registered provider concurrently for one analysis, each
    /// bounded by the same timeout.
    pub struct AnalysisRunner {
        providers: Vec<Arc<dyn AnalysisProvider>>,
        timeout: Duration,
    }

    impl AnalysisRunner {
        pub fn new(timeout: Duration) -> Self {
            Self {
                providers: Vec::new(),
                timeout,
            }
        }

        pub fn with_provider(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
            self.providers.push(provider);
            self
        }

        pub fn provider_names(&self) -> Vec<&str> {
            self.providers.iter().map(|p| p.name()).collect()
        }

        /// Call every provider on `text`. Output order follows registration
        /// order, not completion order.
        pub async fn run(&self, text: &str) -> Vec<ProviderOutput> {
            let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            let calls = self.providers.iter().map(|provider| async move {
                let name = provider.name().to_string();
                let call = tokio::time::timeout(self.timeout, provider.analyze(text));
                let result = match call.await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(provider = %name, millis, "provider timed out");
                        Err(ProviderError::Timeout {
                            provider: name.clone(),
                            millis,
                        })
                    }
                };
                ProviderOutput {
                    provider: name,
                    result,
                }
            });
            join_all(calls).await
        }

        /// Run `ticket` and report every answer to `session`.
        pub async fn run_ticket(
            &self,
            session: &mut DocumentSession,
            ticket: &AnalysisTicket,
        ) -> Vec<ApplyOutcome> {
            let outputs = self.run(&ticket.text).await;
            debug!(seq = ticket.seq, providers = outputs.len(), "analysis finished");
            session.apply_outputs(ticket.seq, outputs)
        }
    }

    impl std::fmt::Debug for AnalysisRunner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("AnalysisRunner")
                .field("providers", &self.provider_names())
                .field("timeout", &self.timeout)
                .finish()
        }
    }
}
