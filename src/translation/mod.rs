/*!
 * Translation orchestration across interchangeable AI providers.
 *
 * This module contains the core of the library, split into several
 * submodules:
 *
 * - `types`: request/result value types and word-level dictionary data
 * - `cache`: TTL + capacity bounded caching shared across callers
 * - `enrichment`: singleflight-deduplicated phonetic enrichment
 * - `stream`: provider-agnostic decoding of incremental event streams
 * - `core`: the orchestrator - routing, caching, retry, streaming
 */

// Re-export main types for easier usage
pub use self::cache::{CachePolicy, TtlCache};
pub use self::core::{OrchestratorConfig, TranslationOrchestrator};
pub use self::enrichment::{PhoneticEnricher, PhoneticSource, is_short_phrase};
pub use self::stream::{SseChunkParser, content_stream};
pub use self::types::{
    Phonetic, PhoneticAccent, TranslationRequest, TranslationResult, WordResult,
};

// Submodules
pub mod cache;
pub mod core;
pub mod enrichment;
pub mod stream;
pub mod types;
