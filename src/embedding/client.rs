use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn model(&self) -> &str;
}

/// Client for an Ollama server's `/api/embeddings` endpoint.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tracing::debug!(
            "Requesting embedding (model={}, chars={})",
            self.model,
            text.chars().count()
        );

        let body = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };
        let response = self.client.post(self.endpoint()).json(&body).send()?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(ProvisionError::embedding(format!(
                "embedding server returned {status}: {error_text}"
            )));
        }

        let parsed: EmbeddingResponse = response.json()?;
        if parsed.embedding.is_empty() {
            return Err(ProvisionError::embedding(format!(
                "model {} returned an empty embedding",
                self.model
            )));
        }
        Ok(parsed.embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
