use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{model_catalog, recommend_model, system_info, BackendError, EnhancementBackend};
use super::{ModelDescriptor, SystemInfo};
use crate::config::AiFeatures;
use crate::enhance::build_prompt;
use crate::events::{EventBus, PullProgress};

const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagsModel>,
}

#[derive(Debug, Deserialize)]
struct TagsModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct NamedRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullChunk {
    status: String,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
}

/// Facade over the local Ollama daemon.
///
/// Pull progress is published on the shared [`EventBus`] rather than returned
/// from the call, so listeners subscribed before the pull see every update.
pub struct OllamaBackend {
    base_url: String,
    client: reqwest::Client,
    bus: Arc<EventBus>,
}

impl OllamaBackend {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self::with_base_url(OLLAMA_BASE_URL, bus)
    }

    /// Point the facade at a non-default daemon address (used by tests).
    pub fn with_base_url(base_url: impl Into<String>, bus: Arc<EventBus>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            bus,
        }
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                // Low temperature for consistent corrections
                temperature: 0.1,
                num_predict: 512,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Api(format!(
                "Ollama returned error: {}",
                response.status()
            )));
        }

        let result = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        Ok(result.response.trim().to_string())
    }
}

#[async_trait]
impl EnhancementBackend for OllamaBackend {
    async fn check_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .is_ok()
    }

    async fn list_installable_models(&self) -> Result<Vec<ModelDescriptor>, BackendError> {
        Ok(model_catalog())
    }

    async fn list_downloaded_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?
            .json::<TagsResponse>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        Ok(response.models.into_iter().map(|m| m.name).collect())
    }

    async fn recommended_model(&self) -> Result<String, BackendError> {
        Ok(recommend_model(&system_info()).to_string())
    }

    async fn pull_model(&self, model: &str) -> Result<(), BackendError> {
        info!("Pulling model: {}", model);

        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .json(&NamedRequest {
                name: model.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Api(format!(
                "Failed to pull model: {}",
                response.status()
            )));
        }

        // The daemon streams newline-delimited JSON status lines; each one
        // becomes a progress event.
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            if let Ok(text) = String::from_utf8(bytes.to_vec()) {
                for line in text.lines() {
                    if let Ok(chunk) = serde_json::from_str::<PullChunk>(line) {
                        let percentage = match (chunk.completed, chunk.total) {
                            (Some(c), Some(t)) if t > 0 => (c as f64 / t as f64) * 100.0,
                            _ => 0.0,
                        };

                        debug!("Pull {}: {} ({:.1}%)", model, chunk.status, percentage);

                        self.bus.emit_pull_progress(&PullProgress {
                            model_id: model.to_string(),
                            status: chunk.status,
                            completed: chunk.completed,
                            total: chunk.total,
                            percentage,
                        });
                    }
                }
            }
        }

        // Give the daemon a moment to finalize before announcing completion
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.bus.emit_pull_complete(model);

        Ok(())
    }

    async fn delete_model(&self, model: &str) -> Result<(), BackendError> {
        info!("Deleting model: {}", model);

        let response = self
            .client
            .delete(format!("{}/api/delete", self.base_url))
            .json(&NamedRequest {
                name: model.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Api(format!(
                "Failed to delete model: {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn system_info(&self) -> Result<SystemInfo, BackendError> {
        Ok(system_info())
    }

    async fn enhance_text(
        &self,
        text: &str,
        model: &str,
        features: &AiFeatures,
    ) -> Result<String, BackendError> {
        if !self.check_available().await {
            return Err(BackendError::Unavailable);
        }

        let prompt = build_prompt(text, features);
        self.generate(model, &prompt).await
    }
}
