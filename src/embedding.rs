//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`OpenAiProvider`]** — calls the OpenAI embeddings API.
//! - **[`GeminiProvider`]** — calls the Gemini `batchEmbedContents` endpoint.
//!
//! Also provides the vector utilities the index and ranker are built on:
//! - [`normalize_rows`] — row-wise L2 normalization with zero-row safety
//! - [`dot`] — dot product (cosine similarity for unit-length inputs)
//!
//! # Provider Selection
//!
//! Use [`create_provider`] to instantiate the provider named in the
//! configuration. The choice is made once at startup; every later embed
//! call goes through the same trait object, so the process dimensionality
//! is fixed for its whole lifetime.
//!
//! # Failure Model
//!
//! Provider calls carry the configured request timeout and are not retried
//! here; a caller that wants retries owns that policy. HTTP and network
//! failures surface as [`RecallError::Provider`], a timeout as
//! [`RecallError::ProviderTimeout`], and a response whose shape does not
//! match the request (missing fields, wrong vector count) as
//! [`RecallError::MalformedResponse`].

use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{RecallError, Result};

/// Trait for embedding providers.
///
/// Maps a batch of texts to one fixed-width `f32` vector per text, in input
/// order. Implementations are opaque to the rest of the system: the index
/// and ranker only ever see the returned matrix.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts.
    ///
    /// An empty batch returns an empty matrix without contacting the
    /// provider.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Create the [`EmbeddingProvider`] named in the configuration.
///
/// # Errors
///
/// Returns an error for unknown provider names or when the required API
/// key environment variable is not set.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(config)?)),
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        other => Err(RecallError::Provider(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RecallError::Provider(e.to_string()))
}

/// Map a transport-level failure onto the error model. Timeouts get their
/// own variant so callers can tell a slow provider from a broken one.
fn transport_error(err: reqwest::Error, timeout_secs: u64) -> RecallError {
    if err.is_timeout() {
        RecallError::ProviderTimeout(timeout_secs)
    } else {
        RecallError::Provider(err.to_string())
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Calls `POST /v1/embeddings` with the configured model. Requires the
/// `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAiProvider {
    model: String,
    dims: usize,
    api_key: String,
    timeout_secs: u64,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider from configuration.
    ///
    /// Defaults to `text-embedding-3-small` (1536 dims) when the config
    /// leaves model/dims unset.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| "text-embedding-3-small".to_string());
        let dims = config.dims.unwrap_or(match model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            _ => 1536,
        });
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RecallError::Provider("OPENAI_API_KEY not set".to_string()))?;

        Ok(Self {
            model,
            dims,
            api_key,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let client = http_client(self.timeout_secs)?;
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RecallError::Provider(format!(
                "OpenAI API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RecallError::MalformedResponse(e.to_string()))?;

        parse_openai_response(&json, texts.len())
    }
}

/// Parse the OpenAI embeddings API response JSON.
///
/// Extracts the `data[].embedding` arrays in order and checks the count
/// against the number of texts sent.
fn parse_openai_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| RecallError::MalformedResponse("missing data array".to_string()))?;

    if data.len() != expected {
        return Err(RecallError::MalformedResponse(format!(
            "requested {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| RecallError::MalformedResponse("missing embedding field".to_string()))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vec);
    }

    Ok(embeddings)
}

// ============ Gemini Provider ============

/// Embedding provider using the Gemini API.
///
/// Calls `POST /v1beta/models/{model}:batchEmbedContents` with the
/// `SEMANTIC_SIMILARITY` task type. Requires the `GEMINI_API_KEY`
/// environment variable to be set.
pub struct GeminiProvider {
    model: String,
    dims: usize,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiProvider {
    /// Create a new Gemini provider from configuration.
    ///
    /// Defaults to `gemini-embedding-001` (3072 dims) when the config
    /// leaves model/dims unset.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| "gemini-embedding-001".to_string());
        let dims = config.dims.unwrap_or(3072);
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| RecallError::Provider("GEMINI_API_KEY not set".to_string()))?;

        Ok(Self {
            model,
            dims,
            api_key,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let client = http_client(self.timeout_secs)?;

        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                serde_json::json!({
                    "model": format!("models/{}", self.model),
                    "content": { "parts": [{ "text": text }] },
                    "taskType": "SEMANTIC_SIMILARITY",
                })
            })
            .collect();
        let body = serde_json::json!({ "requests": requests });

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:batchEmbedContents",
            self.model
        );

        let response = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RecallError::Provider(format!(
                "Gemini API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RecallError::MalformedResponse(e.to_string()))?;

        parse_gemini_response(&json, texts.len())
    }
}

/// Parse the Gemini `batchEmbedContents` response JSON.
///
/// Extracts the `embeddings[].values` arrays in order and checks the count
/// against the number of texts sent.
fn parse_gemini_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| RecallError::MalformedResponse("missing embeddings array".to_string()))?;

    if embeddings.len() != expected {
        return Err(RecallError::MalformedResponse(format!(
            "requested {} embeddings, got {}",
            expected,
            embeddings.len()
        )));
    }

    let mut result = Vec::with_capacity(embeddings.len());
    for embedding in embeddings {
        let values = embedding
            .get("values")
            .and_then(|v| v.as_array())
            .ok_or_else(|| RecallError::MalformedResponse("missing values field".to_string()))?;

        let vec: Vec<f32> = values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        result.push(vec);
    }

    Ok(result)
}

// ============ Vector utilities ============

/// L2-normalize each row of a matrix.
///
/// Rows with norm exactly 0 are returned unchanged, so a zero vector stays
/// a zero vector instead of producing NaNs. An empty matrix is returned
/// as-is. Applying the function twice gives the same result as applying it
/// once.
pub fn normalize_rows(rows: Vec<Vec<f32>>) -> Vec<Vec<f32>> {
    rows.into_iter()
        .map(|row| {
            let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm == 0.0 {
                row
            } else {
                row.into_iter().map(|x| x / norm).collect()
            }
        })
        .collect()
}

/// Dot product of two equal-length vectors.
///
/// For unit-length inputs this is the cosine similarity, in `[-1.0, 1.0]`.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_norm(row: &[f32]) -> f32 {
        row.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_normalize_rows_unit_norm() {
        let rows = vec![vec![3.0, 4.0], vec![1.0, 1.0], vec![-2.0, 0.0]];
        let normalized = normalize_rows(rows);
        for row in &normalized {
            assert!((row_norm(row) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_normalize_rows_zero_row_unchanged() {
        let rows = vec![vec![0.0, 0.0, 0.0], vec![2.0, 0.0, 0.0]];
        let normalized = normalize_rows(rows);
        assert_eq!(normalized[0], vec![0.0, 0.0, 0.0]);
        assert!((row_norm(&normalized[1]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_rows_empty() {
        assert!(normalize_rows(Vec::new()).is_empty());
    }

    #[test]
    fn test_normalize_rows_idempotent() {
        let rows = vec![vec![3.0, 4.0], vec![0.0, 0.0], vec![-1.0, 7.0]];
        let once = normalize_rows(rows);
        let twice = normalize_rows(once.clone());
        for (a, b) in once.iter().zip(twice.iter()) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_dot_of_unit_vectors_is_cosine() {
        let rows = normalize_rows(vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]]);
        let sim = dot(&rows[0], &rows[1]);
        assert!((sim - 1.0).abs() < 1e-5);

        let ortho = normalize_rows(vec![vec![1.0, 0.0], vec![0.0, 5.0]]);
        assert!(dot(&ortho[0], &ortho[1]).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_provider_call() {
        std::env::set_var("OPENAI_API_KEY", "test-key");
        let config = crate::config::EmbeddingConfig {
            provider: "openai".to_string(),
            model: None,
            dims: None,
            timeout_secs: 1,
        };
        let provider = OpenAiProvider::new(&config).unwrap();
        // An empty batch returns without making a request, so a fake API
        // key succeeds here.
        let result = provider.embed(&[]).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(provider.dims(), 1536);
        assert_eq!(provider.model_name(), "text-embedding-3-small");
    }

    #[test]
    fn test_parse_openai_response() {
        let json = serde_json::json!({
            "data": [
                { "embedding": [0.1, 0.2] },
                { "embedding": [0.3, 0.4] },
            ]
        });
        let parsed = parse_openai_response(&json, 2).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], vec![0.3, 0.4]);
    }

    #[test]
    fn test_parse_openai_count_mismatch() {
        let json = serde_json::json!({
            "data": [ { "embedding": [0.1, 0.2] } ]
        });
        let err = parse_openai_response(&json, 2).unwrap_err();
        assert!(matches!(err, RecallError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_openai_missing_data() {
        let json = serde_json::json!({ "object": "list" });
        let err = parse_openai_response(&json, 1).unwrap_err();
        assert!(matches!(err, RecallError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_gemini_response() {
        let json = serde_json::json!({
            "embeddings": [
                { "values": [1.0, 0.0] },
                { "values": [0.0, 1.0] },
            ]
        });
        let parsed = parse_gemini_response(&json, 2).unwrap();
        assert_eq!(parsed[0], vec![1.0, 0.0]);
    }

    #[test]
    fn test_parse_gemini_missing_values() {
        let json = serde_json::json!({
            "embeddings": [ { "statistics": {} } ]
        });
        let err = parse_gemini_response(&json, 1).unwrap_err();
        assert!(matches!(err, RecallError::MalformedResponse(_)));
    }
}
