//! HTTP client for the remote patient API
//!
//! - `retry` - two-counter retry policy and the async loop that drives it
//! - `api` - page fetch and assessment submission over `reqwest`
//! - `fetcher` - sequential pagination with partial-failure tolerance

pub mod api;
pub mod fetcher;
pub mod retry;

pub use api::PatientApiClient;
pub use fetcher::{PageSource, PaginatedFetcher};
pub use retry::{
    AttemptOutcome, RetryDecision, RetryExecutor, RetryPolicy, RetryReason, RetryState,
};

/// Failure of a single HTTP attempt, before the retry policy has ruled on it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Network(String),
}

impl AttemptError {
    /// How the retry policy sees this failure
    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            AttemptError::Status { status, .. } => AttemptOutcome::Status(*status),
            AttemptError::Network(_) => AttemptOutcome::NoStatus,
        }
    }
}

/// Terminal client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Rate limit retries exhausted after {attempts} consecutive 429 responses: {message}")]
    RateLimitExceeded { attempts: u32, message: String },

    #[error("Server error {status} persisted after {attempts} retries: {message}")]
    ServerErrorExhausted {
        status: u16,
        attempts: u32,
        message: String,
    },

    #[error("Request failed after {attempts} retries: {message}")]
    TransientRequestError { attempts: u32, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Whether the failure came from exhausting a retry budget
    pub fn is_exhausted(&self) -> bool {
        !matches!(self, ClientError::Configuration(_))
    }
}
