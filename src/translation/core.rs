/*!
 * Core translation orchestration.
 *
 * The orchestrator routes requests to a named or default provider, owns
 * the shared result cache and the phonetic enrichment coordinator, applies
 * the retry policy, and exposes both whole-result and streaming entry
 * points. One instance is shared by many concurrent callers; the only
 * mutable state it holds lives behind the caches' own locks.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::TranslationError;
use crate::language_utils;
use crate::providers::{FragmentStream, ProviderRegistry, TranslationProvider};
use crate::translation::cache::{CachePolicy, TtlCache};
use crate::translation::enrichment::{PhoneticEnricher, PhoneticSource};
use crate::translation::types::{TranslationRequest, TranslationResult};

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Provider used when a request names none
    pub default_provider: String,

    /// Retries after the first failed attempt (2 retries = 3 attempts)
    pub max_retries: u32,

    /// Base backoff in milliseconds, doubled on every further attempt
    pub backoff_base_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_provider: String::new(),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl OrchestratorConfig {
    /// Create a configuration with the given default provider
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            default_provider: default_provider.into(),
            ..Default::default()
        }
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }
}

/// Orchestrates translation requests across interchangeable providers.
///
/// Owns the provider registry, the result cache, and the enrichment
/// coordinator as one explicit context object - no ambient globals, so
/// multiple orchestrators coexist without interference.
pub struct TranslationOrchestrator {
    registry: Arc<ProviderRegistry>,
    config: OrchestratorConfig,
    cache: TtlCache<TranslationResult>,
    enricher: Option<PhoneticEnricher>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator with an empty registry and default caching
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            registry: Arc::new(ProviderRegistry::new()),
            config,
            cache: TtlCache::new(CachePolicy::result_cache()),
            enricher: None,
        }
    }

    /// Replace the result cache policy
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache = TtlCache::new(policy);
        self
    }

    /// Enable phonetic enrichment backed by the given dictionary source
    pub fn with_phonetic_source(mut self, source: Arc<dyn PhoneticSource>) -> Self {
        self.enricher = Some(PhoneticEnricher::new(source));
        self
    }

    /// Enable phonetic enrichment with a custom cache policy
    pub fn with_phonetic_enricher(mut self, enricher: PhoneticEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// The provider registry; register and reconfigure providers through it
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Convenience wrapper for [`ProviderRegistry::register`]
    pub fn register_provider(&self, provider: Arc<dyn TranslationProvider>) {
        self.registry.register(provider);
    }

    /// (hits, misses, hit rate) of the result cache
    pub fn cache_stats(&self) -> (usize, usize, f64) {
        self.cache.stats()
    }

    /// Whether the given provider id is registered and streaming-capable
    pub fn is_streaming(&self, provider_id: &str) -> bool {
        self.registry
            .lookup(provider_id)
            .is_some_and(|provider| provider.supports_streaming())
    }

    /// The provider under `provider_id`, if registered and streaming-capable
    pub fn streaming_provider(&self, provider_id: &str) -> Option<Arc<dyn TranslationProvider>> {
        self.registry
            .lookup(provider_id)
            .filter(|provider| provider.supports_streaming())
    }

    /// Translate a request through the named provider (default when absent).
    ///
    /// Checks the shared result cache first (unless the request bypasses
    /// it), dispatches through the retry policy on a miss, runs phonetic
    /// enrichment, and stores the post-enrichment result.
    ///
    /// # Errors
    /// `UnknownProvider` when the id is unregistered; otherwise the final
    /// attempt's failure once the retry budget is exhausted.
    pub async fn translate(
        &self,
        request: &TranslationRequest,
        provider_id: Option<&str>,
    ) -> Result<TranslationResult, TranslationError> {
        let provider = self.resolve(provider_id)?;
        self.check_language_support(provider.as_ref(), request)?;

        let started = Instant::now();
        let cache_key = request.cache_key(provider.id());

        if !request.no_cache {
            if let Some(hit) = self.cache.get(&cache_key) {
                debug!(
                    "serving '{}' -> {} from cache",
                    provider.id(),
                    request.target_language
                );
                return Ok(hit.with_cache_flag(true));
            }
        }

        let mut result = self.dispatch_with_retry(provider.as_ref(), request).await?;
        if result.detected_language.is_empty() {
            result.detected_language = request.source_language.clone();
        }

        let result = match &self.enricher {
            Some(enricher) => enricher.enrich(&result).await,
            None => result,
        };
        let result = result.with_elapsed(started.elapsed());

        // The post-enrichment result is what later callers should see; a
        // bypassing request still refreshes the entry.
        self.cache.insert(cache_key, result.clone());
        Ok(result)
    }

    /// Translate a request as a stream of content fragments.
    ///
    /// Streaming-capable providers are forwarded to directly; any other
    /// provider falls back to a single fragment carrying the whole
    /// translation. Streaming always bypasses the result cache - partial
    /// output is not cacheable as a unit.
    pub async fn translate_stream(
        &self,
        request: &TranslationRequest,
        provider_id: Option<&str>,
    ) -> Result<FragmentStream, TranslationError> {
        let provider = self.resolve(provider_id)?;
        self.check_language_support(provider.as_ref(), request)?;

        if let Some(streaming) = provider.as_streaming() {
            debug!("streaming through provider '{}'", provider.id());
            return streaming.translate_stream(request).await;
        }

        debug!(
            "provider '{}' does not stream, falling back to a single fragment",
            provider.id()
        );
        let result = self.dispatch_with_retry(provider.as_ref(), request).await?;
        Ok(Box::pin(stream::once(async move {
            Ok::<_, TranslationError>(result.translated_text)
        })))
    }

    /// Resolve an optional provider id against the configured default
    ///
    /// # Errors
    /// `UnknownProvider` when the id (or the default) is not registered.
    pub fn resolve(
        &self,
        provider_id: Option<&str>,
    ) -> Result<Arc<dyn TranslationProvider>, TranslationError> {
        let id = provider_id.unwrap_or(&self.config.default_provider);
        self.registry
            .lookup(id)
            .ok_or_else(|| TranslationError::UnknownProvider(id.to_string()))
    }

    /// Reject a pair the provider declares itself unable to serve
    fn check_language_support(
        &self,
        provider: &dyn TranslationProvider,
        request: &TranslationRequest,
    ) -> Result<(), TranslationError> {
        let Some(supported) = provider.supported_languages() else {
            return Ok(());
        };
        let pair_supported = |code: &str| {
            supported
                .iter()
                .any(|lang| language_utils::language_codes_match(lang, code))
        };
        let source_ok = request.is_auto_source() || pair_supported(&request.source_language);
        if source_ok && pair_supported(&request.target_language) {
            Ok(())
        } else {
            Err(TranslationError::UnsupportedLanguagePair {
                from: request.source_language.clone(),
                to: request.target_language.clone(),
            })
        }
    }

    /// Dispatch with up to `max_retries + 1` attempts.
    ///
    /// Every attempt is bounded by the request's timeout. A rate-limited
    /// failure propagates immediately; any other failure on a non-final
    /// attempt is swallowed, followed by an exponentially growing backoff.
    /// Dropping the returned future cancels promptly, including during a
    /// backoff sleep.
    async fn dispatch_with_retry(
        &self,
        provider: &dyn TranslationProvider,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslationError> {
        let max_attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match tokio::time::timeout(request.timeout(), provider.translate(request)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(err)) => {
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    warn!(
                        "provider '{}' attempt {}/{} failed: {}",
                        provider.id(),
                        attempt,
                        max_attempts,
                        err
                    );
                    last_error = Some(err);
                }
                Err(_) => {
                    warn!(
                        "provider '{}' attempt {}/{} timed out after {}ms",
                        provider.id(),
                        attempt,
                        max_attempts,
                        request.timeout_ms
                    );
                    last_error = Some(TranslationError::Timeout(request.timeout_ms));
                }
            }

            if attempt < max_attempts {
                let backoff_ms = self.config.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            TranslationError::Unknown(format!(
                "provider '{}' failed after {} attempts",
                provider.id(),
                max_attempts
            ))
        }))
    }
}
