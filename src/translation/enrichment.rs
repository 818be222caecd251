/*!
 * Phonetic enrichment coordinator.
 *
 * After a successful translation whose output reads as a short English
 * word or phrase, a secondary dictionary lookup augments the result with
 * pronunciation data. Lookups are deduplicated: concurrent callers asking
 * for the same word join a single in-flight upstream operation and share
 * its outcome, success or failure. Enrichment is strictly best-effort - a
 * failed lookup returns the original result unchanged and never surfaces
 * an error to the translate caller.
 */

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::oneshot;

use crate::errors::TranslationError;
use crate::language_utils;
use crate::translation::cache::{CachePolicy, TtlCache};
use crate::translation::types::{TranslationResult, WordResult};

/// Upstream dictionary capable of pronouncing a single word.
///
/// Injected by the host; the coordinator owns caching and deduplication,
/// the source owns the actual lookup.
#[async_trait]
pub trait PhoneticSource: Send + Sync + Debug {
    /// Look up pronunciation data for one lower-cased word
    async fn lookup(&self, word: &str) -> Result<WordResult, TranslationError>;
}

/// A lookup every joiner awaits. Errors are carried as strings because the
/// shared outcome must be cloneable to every joiner.
type SharedLookup = Shared<BoxFuture<'static, Result<WordResult, String>>>;

/// Coordinator for singleflight-deduplicated phonetic lookups.
///
/// Clones share the cache and the in-flight map.
pub struct PhoneticEnricher {
    source: Arc<dyn PhoneticSource>,
    cache: TtlCache<WordResult>,
    in_flight: Arc<Mutex<HashMap<String, SharedLookup>>>,
}

impl PhoneticEnricher {
    /// Create a coordinator over the given upstream source
    pub fn new(source: Arc<dyn PhoneticSource>) -> Self {
        Self::with_cache_policy(source, CachePolicy::enrichment_cache())
    }

    /// Create a coordinator with a custom cache policy
    pub fn with_cache_policy(source: Arc<dyn PhoneticSource>, policy: CachePolicy) -> Self {
        Self {
            source,
            cache: TtlCache::new(policy),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a result qualifies for enrichment.
    ///
    /// Triggers only when the target language is English, the translated
    /// text reads as a short word/phrase, and no destination-audience
    /// phonetic is present yet (a source-only transcription such as pinyin
    /// does not count).
    pub fn should_enrich(result: &TranslationResult) -> bool {
        language_utils::is_english(&result.target_language)
            && is_short_phrase(&result.translated_text)
            && result.needs_phonetics()
    }

    /// Enrich a result, returning it unchanged when enrichment does not
    /// apply or the lookup fails.
    pub async fn enrich(&self, result: &TranslationResult) -> TranslationResult {
        if !Self::should_enrich(result) {
            return result.clone();
        }
        let word = normalize_word(&result.translated_text);
        match self.lookup(&word).await {
            Ok(word_result) => result.with_word_result(&word_result),
            Err(err) => {
                debug!("phonetic enrichment for '{}' failed: {}", word, err);
                result.clone()
            }
        }
    }

    /// Look up a word through the cache and the singleflight map.
    pub async fn lookup(&self, word: &str) -> Result<WordResult, String> {
        let key = normalize_word(word);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        self.join_or_start(key).await
    }

    /// Atomic get-or-start: under one lock, either join the in-flight
    /// lookup for this word or become the caller that starts it.
    ///
    /// The winning caller spawns the upstream lookup as a task, so a
    /// joiner dropping its future cannot cancel the lookup others await.
    /// The in-flight entry is removed as soon as the lookup settles -
    /// success and failure both - so a failure never poisons later
    /// attempts.
    fn join_or_start(&self, key: String) -> SharedLookup {
        let mut in_flight = self.in_flight.lock();

        if let Some(existing) = in_flight.get(&key) {
            return existing.clone();
        }
        // The lookup may have settled between the cache miss and taking
        // the lock; a fresh cache hit short-circuits without upstream work.
        if let Some(cached) = self.cache.get(&key) {
            return futures::future::ready(Ok::<_, String>(cached)).boxed().shared();
        }

        let (tx, rx) = oneshot::channel::<Result<WordResult, String>>();
        let shared: SharedLookup = rx
            .map(|received| match received {
                Ok(outcome) => outcome,
                Err(_) => Err("phonetic lookup task dropped".to_string()),
            })
            .boxed()
            .shared();
        in_flight.insert(key.clone(), shared.clone());

        let source = Arc::clone(&self.source);
        let cache = self.cache.clone();
        let in_flight_map = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            let outcome = source.lookup(&key).await.map_err(|err| err.to_string());
            if let Ok(word_result) = &outcome {
                cache.insert(key.clone(), word_result.clone());
            }
            in_flight_map.lock().remove(&key);
            let _ = tx.send(outcome);
        });

        shared
    }

    /// (hits, misses, hit rate) of the enrichment cache
    pub fn cache_stats(&self) -> (usize, usize, f64) {
        self.cache.stats()
    }

    /// Number of lookups currently in flight
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl Clone for PhoneticEnricher {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: self.cache.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl Debug for PhoneticEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneticEnricher")
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}

static CLAUSE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.,!?;:。，！？；：]").unwrap());

/// Heuristic for dictionary-worthy output: short, at most three words, and
/// free of clause punctuation. "hello" qualifies; a full sentence does not.
pub fn is_short_phrase(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 40 {
        return false;
    }
    if trimmed.split_whitespace().count() > 3 {
        return false;
    }
    !CLAUSE_PUNCTUATION.is_match(trimmed)
}

/// Enrichment cache key: lower-cased, trimmed translated word
pub fn normalize_word(text: &str) -> String {
    text.trim().to_lowercase()
}
