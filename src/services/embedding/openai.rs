//! OpenAI Embedding Provider
//!
//! Implements [`EmbeddingProvider`] for the OpenAI embeddings API.
//!
//! - Endpoint: `POST https://api.openai.com/v1/embeddings`
//! - Body: `{ model, input: ["text1", ...] }`
//! - Response: `{ data: [{ embedding, index }], model }`
//!
//! Corpora larger than the configured batch size are sent in several
//! requests; results are re-ordered by `index` within each batch.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult};

/// Default OpenAI embedding API endpoint.
const OPENAI_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";

/// Hard limit on inputs per request imposed by the API.
const MAX_BATCH_SIZE: usize = 2048;

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: Option<OpenAIErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: Option<String>,
}

/// OpenAI embedding provider.
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    batch_size: usize,
}

impl OpenAIEmbeddingProvider {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        batch_size: usize,
        timeout_secs: u64,
    ) -> EmbeddingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| OPENAI_EMBEDDING_API_URL.to_string()),
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        })
    }

    fn build_request_body(&self, input: &[String]) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": input,
        })
    }

    async fn post_embeddings(&self, input: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if self.api_key.is_empty() {
            return Err(EmbeddingError::AuthenticationFailed(
                "OpenAI API key is not configured".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request_body(input))
            .send()
            .await
            .map_err(|e| EmbeddingError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Network(format!("failed to read response body: {}", e)))?;

        if status != 200 {
            return Err(map_http_error(status, &body_text));
        }

        let parsed: OpenAIEmbeddingResponse = serde_json::from_str(&body_text)
            .map_err(|e| EmbeddingError::Parse(format!("failed to parse embedding response: {}", e)))?;
        extract_embeddings(parsed, input.len())
    }
}

/// Map an HTTP error response to `EmbeddingError`.
fn map_http_error(status: u16, body_text: &str) -> EmbeddingError {
    let message = serde_json::from_str::<OpenAIErrorResponse>(body_text)
        .ok()
        .and_then(|r| r.error)
        .and_then(|d| d.message)
        .unwrap_or_else(|| body_text.to_string());

    match status {
        401 | 403 => EmbeddingError::AuthenticationFailed(message),
        _ => EmbeddingError::Server { status, message },
    }
}

/// Sort by `index` and check the count matches the request.
fn extract_embeddings(
    mut response: OpenAIEmbeddingResponse,
    expected_count: usize,
) -> EmbeddingResult<Vec<Vec<f32>>> {
    if response.data.len() != expected_count {
        return Err(EmbeddingError::Parse(format!(
            "expected {} embeddings but OpenAI returned {}",
            expected_count,
            response.data.len()
        )));
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed_documents(&self, documents: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(documents.len());
        for chunk in documents.chunks(self.batch_size) {
            vectors.extend(self.post_embeddings(chunk).await?);
        }
        tracing::debug!(
            model = %self.model,
            documents = documents.len(),
            "embedded corpus"
        );
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        let mut vectors = self.post_embeddings(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Parse("empty embedding response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_key: &str, batch_size: usize) -> OpenAIEmbeddingProvider {
        OpenAIEmbeddingProvider::new(
            api_key.to_string(),
            "text-embedding-3-small".to_string(),
            None,
            batch_size,
            30,
        )
        .unwrap()
    }

    #[test]
    fn test_batch_size_is_clamped() {
        assert_eq!(provider("k", 0).batch_size, 1);
        assert_eq!(provider("k", 10_000).batch_size, MAX_BATCH_SIZE);
        assert_eq!(provider("k", 16).base_url, OPENAI_EMBEDDING_API_URL);
    }

    #[test]
    fn test_build_request_body() {
        let body = provider("k", 8).build_request_body(&["a".to_string(), "b".to_string()]);
        assert_eq!(body["model"], "text-embedding-3-small");
        assert_eq!(body["input"][1], "b");
    }

    #[test]
    fn test_extract_embeddings_sorts_by_index() {
        let response: OpenAIEmbeddingResponse = serde_json::from_str(
            r#"{"data": [{"embedding": [2.0], "index": 1}, {"embedding": [1.0], "index": 0}]}"#,
        )
        .unwrap();
        let vectors = extract_embeddings(response, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_extract_embeddings_count_mismatch() {
        let response: OpenAIEmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [1.0], "index": 0}]}"#).unwrap();
        assert!(matches!(
            extract_embeddings(response, 2),
            Err(EmbeddingError::Parse(_))
        ));
    }

    #[test]
    fn test_map_http_error() {
        let err = map_http_error(401, r#"{"error": {"message": "bad key"}}"#);
        assert_eq!(err, EmbeddingError::AuthenticationFailed("bad key".to_string()));

        let err = map_http_error(503, "unavailable");
        assert_eq!(
            err,
            EmbeddingError::Server {
                status: 503,
                message: "unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let err = provider("", 8).embed_query("hi").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::AuthenticationFailed(_)));
    }
}
