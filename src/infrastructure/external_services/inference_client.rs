use async_trait::async_trait;
use pgvector::Vector;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
};
use crate::application::services::retry::{AttemptError, PollError, RetryPolicy, poll_until};

#[derive(Serialize)]
struct EmbedChunksRequest<'a> {
    text: &'a [String],
}

#[derive(Deserialize)]
struct EmbedChunksResponse {
    success: bool,
    embeddings: Vec<Vector>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub model_name: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl EmbeddingsClientConfig {
    pub fn new(service_url: String) -> Self {
        Self {
            service_url,
            model_name: "default".to_string(),
            dimension: 768,
            timeout_secs: 30,
            retry: RetryPolicy::new(3, Duration::from_millis(500)),
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingsError {
    #[error("embeddings service unreachable: {0}")]
    Unreachable(String),
    #[error("embeddings service returned {status}")]
    Status { status: u16 },
    #[error("malformed embeddings response: {0}")]
    Malformed(String),
}

impl EmbeddingsError {
    // 4xx and unparseable bodies repeat on every attempt.
    fn into_attempt(self) -> AttemptError<EmbeddingsError> {
        match self {
            EmbeddingsError::Status { status } if status < 500 && status != 429 => {
                AttemptError::Fatal(self)
            }
            EmbeddingsError::Malformed(_) => AttemptError::Fatal(self),
            other => AttemptError::Transient(other),
        }
    }
}

/// Embeds chunk text for the pgvector backend through the self-hosted
/// embeddings service.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn embed_chunks(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingProviderError> {
        let response = poll_until(
            &self.config.retry,
            |_| async { self.post_once(texts).await.map_err(EmbeddingsError::into_attempt) },
            |_| true,
        )
        .await
        .map_err(into_provider_error)?;

        check_embeddings(response, texts.len(), self.config.dimension)
    }

    async fn post_once(&self, texts: &[String]) -> Result<EmbedChunksResponse, EmbeddingsError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .json(&EmbedChunksRequest { text: texts })
            .send()
            .await
            .map_err(|e| EmbeddingsError::Unreachable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingsError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingsError::Malformed(e.to_string()))
    }
}

fn into_provider_error(error: PollError<EmbeddingsError>) -> EmbeddingProviderError {
    match error {
        PollError::Aborted(EmbeddingsError::Malformed(msg)) => EmbeddingProviderError::ApiError(msg),
        PollError::Aborted(other) => EmbeddingProviderError::ApiError(other.to_string()),
        PollError::Exhausted {
            last_error: Some(EmbeddingsError::Unreachable(msg)),
            ..
        } => EmbeddingProviderError::NetworkError(msg),
        PollError::Exhausted { .. } => EmbeddingProviderError::ServiceUnavailable,
    }
}

fn check_embeddings(
    response: EmbedChunksResponse,
    expected: usize,
    dimension: usize,
) -> Result<Vec<Vector>, EmbeddingProviderError> {
    if !response.success || response.embeddings.len() != expected {
        return Err(EmbeddingProviderError::ApiError(format!(
            "expected {} embeddings, got {}",
            expected,
            response.embeddings.len()
        )));
    }
    if let Some(bad) = response
        .embeddings
        .iter()
        .find(|v| v.as_slice().len() != dimension)
    {
        return Err(EmbeddingProviderError::ApiError(format!(
            "embedding dimension {} does not match configured {}",
            bad.as_slice().len(),
            dimension
        )));
    }

    Ok(response.embeddings)
}

pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        if request.texts.is_empty() {
            return Err(EmbeddingProviderError::InvalidInput(
                "no chunk text to embed".to_string(),
            ));
        }

        let embeddings = self.client.embed_chunks(&request.texts).await?;

        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name: request
                .model_name
                .unwrap_or_else(|| self.client.config.model_name.clone()),
        })
    }
}
