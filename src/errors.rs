/*!
 * Error types for the babelcore library.
 *
 * This module contains the typed failure kinds shared by providers, the
 * orchestrator, and the document pipeline, using the thiserror crate for
 * ergonomic error definitions.
 */

use thiserror::Error;

/// Failures that can occur while dispatching a translation request.
///
/// Providers fail with one of these variants rather than a generic error so
/// the orchestrator's retry loop can make policy decisions (a rate-limited
/// provider must never be retried, everything else may be).
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error establishing or maintaining a connection to a provider
    #[error("network error: {0}")]
    Network(String),

    /// The per-attempt timeout elapsed before the provider responded
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The provider rejected the request due to rate limiting
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider rejected the configured credential
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The provider does not support the requested language pair
    #[error("unsupported language pair: {from} -> {to}")]
    UnsupportedLanguagePair {
        /// Requested source language
        from: String,
        /// Requested target language
        to: String,
    },

    /// The provider returned a payload that could not be interpreted
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// No provider is registered under the requested id
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Any other error
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl TranslationError {
    /// Whether the retry loop may re-dispatch after this failure.
    ///
    /// Retrying against a rate limiter amplifies the problem, so
    /// `RateLimited` always propagates immediately.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RateLimited(_))
    }
}

// Utility conversions for host callbacks and internal plumbing
impl From<anyhow::Error> for TranslationError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}
