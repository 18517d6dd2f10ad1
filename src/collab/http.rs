//! Remote embedding provider over HTTP.

use super::EmbeddingProvider;
use crate::error::{HolomemError, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
}

/// Posts `{"inputs": text}` with a bearer credential and expects a JSON array
/// of numbers back.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let api_key = api_key.into();
        if endpoint.trim().is_empty() {
            return Err(HolomemError::Configuration(
                "embedding endpoint is empty".into(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(HolomemError::Configuration(
                "embedding credential is empty".into(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        })
    }

    /// Read endpoint and credential from the named environment variables.
    pub fn from_env(endpoint_var: &str, key_var: &str) -> Result<Self> {
        let read = |var: &str| {
            std::env::var(var).map_err(|_| {
                HolomemError::Configuration(format!("environment variable {} is not set", var))
            })
        };
        Self::new(read(endpoint_var)?, read(key_var)?)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        debug!(endpoint = %self.endpoint, chars = text.len(), "requesting embedding");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest { inputs: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "embedding request rejected");
            return Err(HolomemError::Embedding(format!(
                "status {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let values: Vec<f64> = response.json().await?;
        Ok(values)
    }
}
