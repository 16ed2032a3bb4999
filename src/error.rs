//! Error types shared across the similarity core.
//!
//! Every failure the index, ranker, or embedding adapter can produce is one
//! of these variants. Nothing is swallowed locally; callers (CLI, HTTP
//! handlers) decide the user-visible behavior.

use thiserror::Error;

/// Result type used throughout the similarity core.
pub type Result<T> = std::result::Result<T, RecallError>;

/// Failure kinds for case loading, embedding, and search.
#[derive(Debug, Error)]
pub enum RecallError {
    /// A search was attempted before the first successful index build.
    /// Distinct from an initialized-but-empty corpus, which searches fine
    /// and returns no results.
    #[error("case index is not initialized")]
    NotInitialized,

    /// The embedding provider was unreachable, rejected the request, or
    /// returned a non-success status.
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// The embedding provider did not answer within the configured timeout.
    #[error("embedding provider timed out after {0}s")]
    ProviderTimeout(u64),

    /// The provider responded, but the body did not have the expected shape
    /// (missing fields, or a different number of vectors than texts sent).
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    /// The case data file could not be read or parsed. A failed reload
    /// leaves any previously built index untouched.
    #[error("case source unavailable: {0}")]
    SourceUnavailable(String),
}
