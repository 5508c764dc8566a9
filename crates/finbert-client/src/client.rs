use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClassifierConfig;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Serialize)]
struct PredictRequest<'a> {
    texts: &'a [String],
    model: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
}

/// Model identity as advertised by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub labels: Vec<String>,
}

/// HTTP client for the FinBERT inference service.
#[derive(Clone)]
pub struct FinBertClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl FinBertClient {
    pub fn new(config: &ClassifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Run inference over a batch of texts. Predictions come back in
    /// input order.
    pub async fn predict(&self, texts: &[String]) -> Result<PredictResponse, ServiceError> {
        let request = PredictRequest {
            texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Unavailable(format!(
                "status: {}",
                response.status()
            )));
        }

        Ok(response.json::<PredictResponse>().await?)
    }

    /// Fetch the served model id and its label set.
    pub async fn model_info(&self) -> Result<ModelInfo, ServiceError> {
        let response = self
            .client
            .get(format!("{}/model", self.base_url))
            .query(&[("model", self.model.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Unavailable(format!(
                "status: {}",
                response.status()
            )));
        }

        Ok(response.json::<ModelInfo>().await?)
    }

    /// Check service health.
    pub async fn health(&self) -> Result<bool, ServiceError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
