/*!
 * Mock provider implementations for tests and host harnesses.
 *
 * The mocks simulate the behaviors the orchestrator's policies care about:
 * - `MockProvider::working(id)` - always succeeds
 * - `MockProvider::failing(id)` - always fails with a network error
 * - `MockProvider::rate_limited(id)` - always fails with `RateLimited`
 * - `MockProvider::flaky(id, n)` - fails the first n calls, then succeeds
 * - `MockProvider::slow(id, ms)` - sleeps before succeeding (timeout tests)
 *
 * Call counters are shared across clones so tests can assert exactly how
 * many times a provider was dispatched to.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream;

use crate::errors::TranslationError;
use crate::providers::{FragmentStream, StreamingTranslationProvider, TranslationProvider};
use crate::translation::types::{TranslationRequest, TranslationResult, WordResult};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a deterministic translation
    Working,
    /// Always fails with a network error
    Failing,
    /// Always fails with a rate-limit rejection
    RateLimited,
    /// Fails the first `fail_first` calls, then succeeds
    Flaky { fail_first: usize },
    /// Always fails with a credential rejection
    InvalidCredential,
    /// Sleeps before succeeding (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for exercising orchestrator policy
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    display_name: String,
    behavior: MockBehavior,
    call_count: Arc<AtomicUsize>,
    /// Custom translation generator (optional)
    custom_response: Option<fn(&TranslationRequest) -> String>,
    /// Word result attached to every successful translation (optional)
    word_result: Option<WordResult>,
    /// Declared language support; None = unrestricted
    supported_languages: Option<Vec<String>>,
}

impl MockProvider {
    /// Create a mock provider with the specified behavior
    pub fn new(id: impl Into<String>, behavior: MockBehavior) -> Self {
        let id = id.into();
        Self {
            display_name: format!("Mock ({})", id),
            id,
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
            word_result: None,
            supported_languages: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working(id: impl Into<String>) -> Self {
        Self::new(id, MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing(id: impl Into<String>) -> Self {
        Self::new(id, MockBehavior::Failing)
    }

    /// Create a mock provider that always reports rate limiting
    pub fn rate_limited(id: impl Into<String>) -> Self {
        Self::new(id, MockBehavior::RateLimited)
    }

    /// Create a mock provider that fails the first `fail_first` calls
    pub fn flaky(id: impl Into<String>, fail_first: usize) -> Self {
        Self::new(id, MockBehavior::Flaky { fail_first })
    }

    /// Create a mock provider that sleeps before answering
    pub fn slow(id: impl Into<String>, delay_ms: u64) -> Self {
        Self::new(id, MockBehavior::Slow { delay_ms })
    }

    /// Override the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set a custom translation generator
    pub fn with_custom_response(mut self, generator: fn(&TranslationRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Attach a word result to every successful translation
    pub fn with_word_result(mut self, word_result: WordResult) -> Self {
        self.word_result = Some(word_result);
        self
    }

    /// Restrict the declared language support
    pub fn with_supported_languages(mut self, languages: Vec<String>) -> Self {
        self.supported_languages = Some(languages);
        self
    }

    /// Number of `translate` calls so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn render(&self, request: &TranslationRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => format!("[{}] {}", request.target_language, request.text),
        }
    }

    fn success(&self, request: &TranslationRequest) -> TranslationResult {
        let detected = if request.is_auto_source() {
            "en".to_string()
        } else {
            request.source_language.clone()
        };
        let mut result = TranslationResult::new(
            self.render(request),
            request.text.clone(),
            detected,
            request.target_language.clone(),
            self.display_name.clone(),
        );
        result.word_result = self.word_result.clone();
        result
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            behavior: self.behavior,
            call_count: Arc::clone(&self.call_count),
            custom_response: self.custom_response,
            word_result: self.word_result.clone(),
            supported_languages: self.supported_languages.clone(),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn supported_languages(&self) -> Option<Vec<String>> {
        self.supported_languages.clone()
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslationError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(self.success(request)),
            MockBehavior::Failing => {
                Err(TranslationError::Network("simulated provider failure".to_string()))
            }
            MockBehavior::RateLimited => {
                Err(TranslationError::RateLimited("simulated 429".to_string()))
            }
            MockBehavior::Flaky { fail_first } => {
                if count < fail_first {
                    Err(TranslationError::Network(format!(
                        "simulated transient failure (call #{})",
                        count + 1
                    )))
                } else {
                    Ok(self.success(request))
                }
            }
            MockBehavior::InvalidCredential => {
                Err(TranslationError::InvalidCredential("simulated bad key".to_string()))
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.success(request))
            }
        }
    }
}

/// Streaming-capable mock that emits a scripted fragment sequence.
#[derive(Debug)]
pub struct StreamingMockProvider {
    inner: MockProvider,
    fragments: Vec<String>,
    stream_calls: Arc<AtomicUsize>,
}

impl StreamingMockProvider {
    /// Create a streaming mock emitting the given fragments in order
    pub fn new(id: impl Into<String>, fragments: Vec<String>) -> Self {
        Self {
            inner: MockProvider::working(id),
            fragments,
            stream_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `translate_stream` calls so far
    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Number of whole-result `translate` calls so far
    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl TranslationProvider for StreamingMockProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    fn as_streaming(&self) -> Option<&dyn StreamingTranslationProvider> {
        Some(self)
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslationError> {
        // Whole-result view of the same scripted output
        let joined = self.fragments.concat();
        let mut result = self.inner.translate(request).await?;
        result.translated_text = joined;
        Ok(result)
    }
}

#[async_trait]
impl StreamingTranslationProvider for StreamingMockProvider {
    async fn translate_stream(
        &self,
        _request: &TranslationRequest,
    ) -> Result<FragmentStream, TranslationError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let fragments: Vec<Result<String, TranslationError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}
