//! OpenAI-compatible `/embeddings` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{attempt_timeout, non_empty, send_with_retry, EmbeddingError, EmbeddingProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        Ok(Self {
            client: Client::builder().timeout(attempt_timeout(timeout)).build()?,
            api_key,
            endpoint,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response: EmbeddingResponse = send_with_retry(|| {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
        })
        .await?;

        let first = response
            .data
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyEmbedding)?;
        non_empty(first.embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
