mod catalog;
mod ollama;

pub use catalog::{model_catalog, recommend_model, system_info, ModelDescriptor, SystemInfo};
pub use ollama::OllamaBackend;

use async_trait::async_trait;

use crate::config::AiFeatures;

/// Errors from the model-serving backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Ollama is not available. Please ensure Ollama is running.")]
    Unavailable,
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned error: {0}")]
    Api(String),
    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

/// Command facade over the local model-serving daemon.
///
/// The lifecycle controller only talks to this trait; tests substitute a
/// scripted fake, production wires in [`OllamaBackend`].
#[async_trait]
pub trait EnhancementBackend: Send + Sync {
    /// Whether the serving daemon is reachable.
    async fn check_available(&self) -> bool;

    /// Catalog of models the daemon knows how to install.
    async fn list_installable_models(&self) -> Result<Vec<ModelDescriptor>, BackendError>;

    /// Identifiers of models already downloaded. Backend ids may carry a
    /// trailing tag suffix (e.g. a quantization marker) beyond the catalog id.
    async fn list_downloaded_models(&self) -> Result<Vec<String>, BackendError>;

    /// Catalog id suggested for this machine.
    async fn recommended_model(&self) -> Result<String, BackendError>;

    /// Download a model. Progress and completion are reported out of band on
    /// the pull event channel; this call resolves when the pull finishes.
    async fn pull_model(&self, model: &str) -> Result<(), BackendError>;

    /// Remove a downloaded model from the daemon's storage.
    async fn delete_model(&self, model: &str) -> Result<(), BackendError>;

    async fn system_info(&self) -> Result<SystemInfo, BackendError>;

    /// Run the correction prompt for `text` against `model`.
    async fn enhance_text(
        &self,
        text: &str,
        model: &str,
        features: &AiFeatures,
    ) -> Result<String, BackendError>;
}
