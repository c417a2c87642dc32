use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Enhancement backend is unavailable")]
    Unavailable,
    #[error("AI enhancement is not enabled")]
    EnhancementDisabled,
    #[error("No AI model selected")]
    NoModelSelected,
    #[error("Failed to persist settings: {0}")]
    Settings(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl LifecycleError {
    /// Returns a user-friendly message suitable for display in a notification
    pub fn user_message(&self) -> String {
        match self {
            LifecycleError::Unavailable => {
                "Ollama is not running. Start it and try again.".to_string()
            }
            LifecycleError::EnhancementDisabled => {
                "AI enhancement is turned off. Enable it in Settings.".to_string()
            }
            LifecycleError::NoModelSelected => {
                "No AI model selected. Pull or select a model first.".to_string()
            }
            LifecycleError::Settings(_) => {
                "Could not save your settings. Please try again.".to_string()
            }
            LifecycleError::Backend(e) => e.to_string(),
        }
    }
}
