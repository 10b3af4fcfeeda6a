//! Gemini `embedContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{attempt_timeout, non_empty, send_with_retry, EmbeddingError, EmbeddingProvider};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "text-embedding-004";

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoint = format!(
            "{}/models/{}:embedContent",
            base_url.trim_end_matches('/'),
            model
        );
        Ok(Self {
            client: Client::builder().timeout(attempt_timeout(timeout)).build()?,
            api_key,
            endpoint,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request_body = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let response: EmbedContentResponse = send_with_retry(|| {
            self.client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
        })
        .await?;

        non_empty(response.embedding.values)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
