/*!
 * # babelcore
 *
 * Translation orchestration core: route a translation request to one of
 * many interchangeable backend providers, cache and deduplicate work,
 * retry transient failures, and stream incremental output. Includes the
 * long-document pipeline that reuses the orchestrator to translate
 * paginated, block-structured documents.
 *
 * ## Features
 *
 * - Uniform provider contract with an optional streaming capability
 * - Shared result cache with sliding + absolute lifetimes and a capacity
 *   bound
 * - Retry policy with exponential backoff and rate-limit short-circuiting
 * - Singleflight-deduplicated phonetic enrichment for short English output
 * - Provider-agnostic decoding of incremental event streams
 * - Long-document pipeline with OCR fallback, formula protection,
 *   per-block failure isolation, and a quality report
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `providers`: the provider contract, registry, and test mocks
 * - `translation`: the orchestrator and its supporting pieces:
 *   - `translation::types`: request/result value types
 *   - `translation::cache`: bounded TTL caching
 *   - `translation::enrichment`: phonetic enrichment coordination
 *   - `translation::stream`: incremental stream decoding
 * - `document`: the long-document pipeline and its model
 * - `language_utils`: ISO language code utilities
 * - `errors`: typed failure kinds
 *
 * Dependencies flow leaf-first: providers know nothing of the
 * orchestrator, and the orchestrator knows nothing of the document
 * pipeline.
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod document;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use document::{DocumentPipeline, DocumentTranslationResult, PipelineOptions, QualityReport};
pub use errors::TranslationError;
pub use providers::{
    FragmentStream, ProviderRegistry, StreamingTranslationProvider, TranslationProvider,
};
pub use translation::{
    OrchestratorConfig, PhoneticSource, TranslationOrchestrator, TranslationRequest,
    TranslationResult, WordResult,
};
