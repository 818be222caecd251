/*!
 * Provider contract and registry.
 *
 * Every backend (dictionary lookups, statistical engines, LLM-based
 * engines) implements the same [`TranslationProvider`] trait so the
 * orchestrator can use them interchangeably. Streaming-capable backends
 * additionally implement [`StreamingTranslationProvider`]; the capability is
 * probed at runtime through [`TranslationProvider::as_streaming`], so each
 * provider stays a leaf implementation with no inheritance hierarchy.
 */

use std::collections::HashMap;
use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use log::debug;
use parking_lot::RwLock;

use crate::errors::TranslationError;
use crate::translation::types::{TranslationRequest, TranslationResult};

pub mod mock;

/// Incrementally emitted translation fragments.
///
/// Fragments preserve the provider's emission order; dropping the stream
/// cancels the underlying work at fragment granularity.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, TranslationError>> + Send>>;

/// Common trait for all translation backends.
///
/// Providers are stateless per call: `translate` may be invoked from many
/// tasks concurrently on one shared instance.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Stable identifier the provider is registered and looked up by
    fn id(&self) -> &str;

    /// Human-readable name reported in translation results
    fn display_name(&self) -> &str;

    /// Whether this provider needs a credential to operate
    fn requires_api_key(&self) -> bool {
        false
    }

    /// Whether the provider is currently configured and usable
    fn is_configured(&self) -> bool {
        true
    }

    /// Language codes this provider supports, or `None` for unrestricted
    fn supported_languages(&self) -> Option<Vec<String>> {
        None
    }

    /// Runtime capability probe for incremental streaming.
    ///
    /// Streaming-capable implementations return `Some(self)`.
    fn as_streaming(&self) -> Option<&dyn StreamingTranslationProvider> {
        None
    }

    /// Whether this provider supports incremental streaming
    fn supports_streaming(&self) -> bool {
        self.as_streaming().is_some()
    }

    /// Translate a single request
    ///
    /// # Errors
    /// Fails with a typed [`TranslationError`] so the orchestrator's retry
    /// policy can distinguish rate limiting from transient failures.
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslationError>;
}

/// Additional contract for providers that can emit incremental output.
#[async_trait]
pub trait StreamingTranslationProvider: TranslationProvider {
    /// Translate a request as a sequence of content fragments
    async fn translate_stream(
        &self,
        request: &TranslationRequest,
    ) -> Result<FragmentStream, TranslationError>;
}

/// Registry of providers, looked up by their stable string id.
///
/// Providers are registered once at orchestrator construction and live for
/// the orchestrator's lifetime. Registering a second provider under an
/// existing id replaces the first (last write wins), which lets tests
/// substitute a provider without rebuilding the orchestrator.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn TranslationProvider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own id (last write wins)
    pub fn register(&self, provider: Arc<dyn TranslationProvider>) {
        let id = provider.id().to_string();
        if self.providers.write().insert(id.clone(), provider).is_some() {
            debug!("replaced provider registration for '{}'", id);
        }
    }

    /// Replace the registration for `id` with the mutator's output.
    ///
    /// Provider records are immutable, so reconfiguration swaps the whole
    /// registration: the mutator receives the current instance and returns
    /// its replacement. Returns false when `id` is not registered.
    pub fn configure<F>(&self, id: &str, mutator: F) -> bool
    where
        F: FnOnce(Arc<dyn TranslationProvider>) -> Arc<dyn TranslationProvider>,
    {
        let mut providers = self.providers.write();
        match providers.remove(id) {
            Some(current) => {
                providers.insert(id.to_string(), mutator(current));
                true
            }
            None => false,
        }
    }

    /// Look up a provider by id
    pub fn lookup(&self, id: &str) -> Option<Arc<dyn TranslationProvider>> {
        self.providers.read().get(id).cloned()
    }

    /// Ids of all registered providers
    pub fn ids(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}
