//! Embedding Provider: the only place that talks to hosted embedding APIs.
//!
//! Everything else sees the `EmbeddingProvider` trait, held by the retriever
//! as `Arc<dyn EmbeddingProvider>` and chosen at startup via EMBEDDING_PROVIDER.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod gemini;
pub mod openai;

pub use gemini::GeminiEmbedder;
pub use openai::OpenAiEmbedder;

const MAX_RETRIES: u32 = 3;
/// Sum of the backoff sleeps between attempts (1s + 2s).
const RETRY_BACKOFF_TOTAL: Duration = Duration::from_secs(3);
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Embedding request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider returned an empty embedding")]
    EmptyEmbedding,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// True for failures worth retrying later (network, timeouts, quota, 5xx).
    /// False for configuration problems (auth, bad model, dimension mismatch).
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EmbeddingError::Api { status, .. } => *status == 429 || *status >= 500,
            EmbeddingError::RateLimited { .. } | EmbeddingError::Timeout(_) => true,
            EmbeddingError::Parse(_)
            | EmbeddingError::EmptyEmbedding
            | EmbeddingError::DimensionMismatch { .. } => false,
        }
    }
}

/// Turns text into a fixed-length vector. Implementations must fail rather
/// than return a zero or empty vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier, reported in health and match metadata.
    fn model(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Sends a JSON request built by `build`, retrying on 429, 5xx and transport
/// errors with exponential backoff (1s, 2s).
pub(crate) async fn send_with_retry<T, F>(build: F) -> Result<T, EmbeddingError>
where
    T: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<EmbeddingError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "Embedding call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(EmbeddingError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("Embedding API returned {}: {}", status, body);
            last_error = Some(EmbeddingError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Embedding call succeeded ({} bytes)", body.len());
        return Ok(serde_json::from_str(&body)?);
    }

    Err(last_error.unwrap_or(EmbeddingError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

/// Per-attempt HTTP timeout for a call whose whole retry sequence must fit in
/// `budget`, so a hung attempt is retried before the caller's deadline.
pub(crate) fn attempt_timeout(budget: Duration) -> Duration {
    (budget.saturating_sub(RETRY_BACKOFF_TOTAL) / MAX_RETRIES).max(MIN_ATTEMPT_TIMEOUT)
}

/// Rejects empty vectors so a broken response never ranks as "no similarity".
pub(crate) fn non_empty(values: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if values.is_empty() {
        Err(EmbeddingError::EmptyEmbedding)
    } else {
        Ok(values)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    pub const DIMENSIONS: usize = 64;

    /// Deterministic bag-of-words embedder: each lowercase word bumps one bucket.
    pub struct HashEmbedder {
        calls: AtomicUsize,
        delay: Option<Duration>,
        dimensions: usize,
    }

    impl HashEmbedder {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: None,
                dimensions: DIMENSIONS,
            }
        }

        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub fn hash_vector(text: &str, dimensions: usize) -> Vec<f32> {
        let mut vector = vec![0.0_f32; dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % dimensions as u64) as usize] += 1.0;
        }
        // Keeps degenerate queries comparable instead of all-zero.
        vector[0] += 0.5;
        vector
    }

    #[async_trait]
    impl EmbeddingProvider for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(hash_vector(text, self.dimensions))
        }

        fn model(&self) -> &str {
            "hash-test"
        }
    }

    /// Always fails with an API error of the given status.
    pub struct FailingEmbedder {
        pub status: u16,
    }

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Api {
                status: self.status,
                message: "stubbed failure".to_string(),
            })
        }

        fn model(&self) -> &str {
            "failing-test"
        }
    }

    /// Never answers; exercises timeouts.
    pub struct HangingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for HangingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            std::future::pending().await
        }

        fn model(&self) -> &str {
            "hanging-test"
        }
    }
}
