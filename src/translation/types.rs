/*!
 * Value types exchanged between callers, the orchestrator, and providers.
 *
 * Requests and results are immutable records: enrichment never mutates a
 * result in place, it copies all unrelated fields and appends to the
 * phonetics collection, so a cached result visible to other callers is
 * never modified behind their back.
 */

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::language_utils;

/// A single translation request.
///
/// Equality for caching purposes is defined over
/// (provider id, source language, target language, text) via [`cache_key`].
///
/// [`cache_key`]: TranslationRequest::cache_key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Text to translate
    pub text: String,

    /// Source language code, or `"auto"` for provider-side detection
    pub source_language: String,

    /// Target language code
    pub target_language: String,

    /// Per-request timeout applied to every dispatch attempt, in milliseconds
    pub timeout_ms: u64,

    /// Skip the cache lookup and force a fresh dispatch
    pub no_cache: bool,
}

impl TranslationRequest {
    /// Default per-attempt timeout
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    /// Create a request with default timeout and caching enabled
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            no_cache: false,
        }
    }

    /// Set the per-attempt timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Bypass the result cache for this request
    pub fn with_cache_bypass(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Whether the source language is left to the provider to detect
    pub fn is_auto_source(&self) -> bool {
        language_utils::is_auto(&self.source_language)
    }

    /// Per-attempt timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache identity for this request when dispatched through `provider_id`.
    ///
    /// SHA-256 over the identifying fields, separated so that adjacent
    /// fields cannot collide by concatenation.
    pub fn cache_key(&self, provider_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(provider_id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.source_language.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.target_language.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Accent tag for a phonetic transcription.
///
/// Closed set: transcriptions either describe the source text (pinyin and
/// the like), the destination audience in general, or a specific English
/// accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneticAccent {
    /// Transcription of the source text (e.g. pinyin)
    Source,
    /// Generic destination-language transcription
    Destination,
    /// American English
    Us,
    /// British English
    Uk,
}

impl PhoneticAccent {
    /// Whether this accent describes the destination audience
    pub fn is_destination(self) -> bool {
        matches!(self, Self::Destination | Self::Us | Self::Uk)
    }
}

/// A single pronunciation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phonetic {
    /// Transcription text (IPA or provider-native)
    pub text: String,

    /// Accent this transcription applies to
    pub accent: PhoneticAccent,
}

impl Phonetic {
    /// Create a new pronunciation entry
    pub fn new(text: impl Into<String>, accent: PhoneticAccent) -> Self {
        Self { text: text.into(), accent }
    }
}

/// Dictionary-style data attached to single-word / short-phrase results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordResult {
    /// Pronunciation entries
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,

    /// Dictionary definitions
    #[serde(default)]
    pub definitions: Vec<String>,

    /// Usage examples
    #[serde(default)]
    pub examples: Vec<String>,
}

impl WordResult {
    /// Create an empty word result
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any entry is tagged for the destination audience
    pub fn has_destination_phonetic(&self) -> bool {
        self.phonetics.iter().any(|p| p.accent.is_destination())
    }

    /// Merge `incoming` into a copy of this word result.
    ///
    /// Appends, never replaces: an incoming destination-audience entry whose
    /// accent tag is already present is dropped (the existing entry stays
    /// authoritative), source-tagged entries are always preserved, and
    /// definitions/examples are appended with duplicates skipped.
    pub fn merged_with(&self, incoming: &WordResult) -> WordResult {
        let mut merged = self.clone();

        for phonetic in &incoming.phonetics {
            let already_authoritative = phonetic.accent.is_destination()
                && merged.phonetics.iter().any(|p| p.accent == phonetic.accent);
            if !already_authoritative && !merged.phonetics.contains(phonetic) {
                merged.phonetics.push(phonetic.clone());
            }
        }
        for definition in &incoming.definitions {
            if !merged.definitions.contains(definition) {
                merged.definitions.push(definition.clone());
            }
        }
        for example in &incoming.examples {
            if !merged.examples.contains(example) {
                merged.examples.push(example.clone());
            }
        }

        merged
    }

    /// Whether the word result carries no data at all
    pub fn is_empty(&self) -> bool {
        self.phonetics.is_empty() && self.definitions.is_empty() && self.examples.is_empty()
    }
}

/// The outcome of one successful translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Translated text
    pub translated_text: String,

    /// Original request text
    pub original_text: String,

    /// Source language as detected (or echoed) by the provider
    pub detected_language: String,

    /// Target language of the translation
    pub target_language: String,

    /// Display name of the producing provider
    pub provider_name: String,

    /// Wall-clock time spent producing this result
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,

    /// Whether this result was served from the cache
    pub from_cache: bool,

    /// Dictionary data, present only for single-word / short-phrase queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_result: Option<WordResult>,
}

impl TranslationResult {
    /// Create a result for freshly translated text
    pub fn new(
        translated_text: impl Into<String>,
        original_text: impl Into<String>,
        detected_language: impl Into<String>,
        target_language: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            translated_text: translated_text.into(),
            original_text: original_text.into(),
            detected_language: detected_language.into(),
            target_language: target_language.into(),
            provider_name: provider_name.into(),
            elapsed: Duration::ZERO,
            from_cache: false,
            word_result: None,
        }
    }

    /// Copy with the elapsed time recorded
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Copy with the cache flag set
    pub fn with_cache_flag(mut self, from_cache: bool) -> Self {
        self.from_cache = from_cache;
        self
    }

    /// Copy with `incoming` merged into the word result (copy + merge).
    ///
    /// All unrelated fields are carried over unchanged; the phonetics
    /// collection only ever grows.
    pub fn with_word_result(&self, incoming: &WordResult) -> Self {
        let merged = match &self.word_result {
            Some(existing) => existing.merged_with(incoming),
            None => incoming.clone(),
        };
        Self {
            word_result: Some(merged),
            ..self.clone()
        }
    }

    /// Whether the result lacks any destination-audience pronunciation.
    ///
    /// A source-only transcription (e.g. pinyin) does not count.
    pub fn needs_phonetics(&self) -> bool {
        match &self.word_result {
            Some(word) => !word.has_destination_phonetic(),
            None => true,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
