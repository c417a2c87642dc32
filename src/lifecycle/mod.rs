mod controller;
mod error;
mod progress;
mod status;
mod ui;

pub use controller::ModelLifecycleController;
pub use error::LifecycleError;
pub use progress::DownloadProgress;
pub use status::{derive_status, display_line, LifecycleStatus, StatusInputs};
pub use ui::{ConfirmPrompt, NoticeLevel, UiEvent, UiSink};

/// Check whether a catalog model is present in the downloaded list.
///
/// Backend-reported identifiers may carry a trailing tag or quantization
/// suffix beyond the catalog id, so membership is a prefix match, not an
/// exact one.
pub fn is_model_downloaded(downloaded: &[String], catalog_id: &str) -> bool {
    downloaded.iter().any(|name| name.starts_with(catalog_id))
}
