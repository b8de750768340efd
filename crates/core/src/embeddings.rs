use crate::error::RetrievalError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Maps text to a fixed-dimension dense vector. The same embedder (same
/// model, same dimension) must be used for ingestion and for queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// Client for an OpenAI-compatible `/embeddings` endpoint. Provider failures
/// surface as `EmbeddingService`; retry policy belongs to the caller.
pub struct OpenAiEmbedder {
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await
            .map_err(|error| RetrievalError::EmbeddingService {
                provider: self.model.clone(),
                details: error.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RetrievalError::EmbeddingService {
                provider: self.model.clone(),
                details: response.status().to_string(),
            });
        }

        let payload: Value =
            response
                .json()
                .await
                .map_err(|error| RetrievalError::EmbeddingService {
                    provider: self.model.clone(),
                    details: error.to_string(),
                })?;

        let vector = parse_embedding_payload(&payload).ok_or_else(|| {
            RetrievalError::EmbeddingService {
                provider: self.model.clone(),
                details: "response carried no embedding vector".to_string(),
            }
        })?;

        if vector.len() != self.dimensions {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimensions,
                found: vector.len(),
            });
        }

        Ok(vector)
    }
}

fn parse_embedding_payload(payload: &Value) -> Option<Vec<f32>> {
    payload
        .pointer("/data/0/embedding")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_f64)
                .map(|value| value as f32)
                .collect()
        })
}

/// Deterministic character-trigram hashing embedder. No network, stable
/// across runs; intended for tests and air-gapped deployments.
#[derive(Debug, Clone, Copy)]
pub struct HashedNgramEmbedder {
    pub dimensions: usize,
}

impl Default for HashedNgramEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

#[async_trait]
impl Embedder for HashedNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        for window in chars.windows(3) {
            let bucket = (fnv1a(window) % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

fn fnv1a(window: &[char]) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for character in window {
        let mut buf = [0u8; 4];
        for byte in character.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
    }
    hash
}
