/*!
 * Common test utilities for the babelcore test suite
 */

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use babelcore::errors::TranslationError;
use babelcore::translation::enrichment::PhoneticSource;
use babelcore::translation::{
    OrchestratorConfig, Phonetic, PhoneticAccent, TranslationOrchestrator, WordResult,
};

/// Phonetic source that counts upstream lookups.
///
/// An optional artificial delay keeps lookups in flight long enough for
/// concurrent callers to pile onto the same flight.
#[derive(Debug)]
pub struct CountingPhoneticSource {
    lookups: AtomicUsize,
    delay_ms: u64,
    fail: bool,
}

impl CountingPhoneticSource {
    pub fn new() -> Self {
        Self { lookups: AtomicUsize::new(0), delay_ms: 0, fail: false }
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn failing() -> Self {
        Self { lookups: AtomicUsize::new(0), delay_ms: 0, fail: true }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Default for CountingPhoneticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhoneticSource for CountingPhoneticSource {
    async fn lookup(&self, word: &str) -> Result<WordResult, TranslationError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail {
            return Err(TranslationError::Network("dictionary offline".to_string()));
        }
        Ok(WordResult {
            phonetics: vec![
                Phonetic::new(format!("/{}/", word), PhoneticAccent::Us),
                Phonetic::new(format!("/{}'/", word), PhoneticAccent::Uk),
            ],
            definitions: vec![format!("definition of {}", word)],
            examples: Vec::new(),
        })
    }
}

/// Initialize captured logging for a test; safe to call repeatedly
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Orchestrator with near-instant backoff so retry tests stay fast
pub fn fast_orchestrator(default_provider: &str) -> TranslationOrchestrator {
    TranslationOrchestrator::new(
        OrchestratorConfig::new(default_provider).with_backoff_base_ms(1),
    )
}

/// Orchestrator with enrichment wired to the given source
pub fn enriching_orchestrator(
    default_provider: &str,
    source: Arc<CountingPhoneticSource>,
) -> TranslationOrchestrator {
    fast_orchestrator(default_provider).with_phonetic_source(source)
}
