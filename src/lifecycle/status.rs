use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::progress::DownloadProgress;

/// Overall state of the enhancement model lifecycle.
///
/// Derived, never set directly: [`derive_status`] recomputes it from the
/// controller's state on every relevant change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// A selected model is ready to serve enhancements
    Ready,
    /// At least one model pull is in flight
    Pulling,
    /// The last operation failed and nothing succeeded since
    Error,
    /// No model selected yet
    NotInstalled,
    /// The serving daemon is not reachable
    Unavailable,
}

/// Read-only view of the state that status derivation depends on.
pub struct StatusInputs<'a> {
    pub available: bool,
    pub selected: Option<&'a str>,
    pub progress: &'a HashMap<String, DownloadProgress>,
    pub last_error: Option<&'a str>,
}

/// Derive the lifecycle status. The rules form a strict priority chain;
/// the first match wins, so an active pull masks a stale error and an
/// unreachable daemon masks everything.
pub fn derive_status(inputs: &StatusInputs) -> LifecycleStatus {
    if !inputs.available {
        return LifecycleStatus::Unavailable;
    }
    if !inputs.progress.is_empty() {
        return LifecycleStatus::Pulling;
    }
    if inputs.last_error.is_some() {
        return LifecycleStatus::Error;
    }
    if inputs.selected.is_none() {
        return LifecycleStatus::NotInstalled;
    }
    LifecycleStatus::Ready
}

/// Render the one-line status shown by the settings badge.
pub fn display_line(inputs: &StatusInputs) -> String {
    match derive_status(inputs) {
        LifecycleStatus::Unavailable => "AI Unavailable - Ollama Not Running".to_string(),
        LifecycleStatus::Pulling => {
            // With several pulls in flight, show the one furthest along.
            let entry = inputs
                .progress
                .values()
                .max_by(|a, b| a.percentage.total_cmp(&b.percentage));
            match entry {
                Some(p) if p.percentage > 0.0 => format!("Downloading {:.0}%", p.percentage),
                Some(p) => p.status.clone(),
                None => "Downloading".to_string(),
            }
        }
        LifecycleStatus::Error => match inputs.last_error {
            Some(message) => format!("Error - {}", message),
            None => "Error".to_string(),
        },
        LifecycleStatus::NotInstalled => "No Model - Pull Required".to_string(),
        LifecycleStatus::Ready => format!("Ready - {}", inputs.selected.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        available: bool,
        selected: Option<String>,
        progress: HashMap<String, DownloadProgress>,
        last_error: Option<String>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                available: true,
                selected: None,
                progress: HashMap::new(),
                last_error: None,
            }
        }

        fn inputs(&self) -> StatusInputs<'_> {
            StatusInputs {
                available: self.available,
                selected: self.selected.as_deref(),
                progress: &self.progress,
                last_error: self.last_error.as_deref(),
            }
        }

        fn with_pull(mut self, id: &str, percentage: f64) -> Self {
            let mut entry = DownloadProgress::starting();
            entry.status = "pulling manifest".to_string();
            entry.percentage = percentage;
            self.progress.insert(id.to_string(), entry);
            self
        }
    }

    #[test]
    fn test_unavailable_overrides_everything() {
        let mut fixture = Fixture::new().with_pull("llama3.2:1b", 50.0);
        fixture.available = false;
        fixture.selected = Some("llama3.2:1b".to_string());
        fixture.last_error = Some("boom".to_string());

        assert_eq!(derive_status(&fixture.inputs()), LifecycleStatus::Unavailable);
    }

    #[test]
    fn test_pulling_masks_stale_error() {
        let mut fixture = Fixture::new().with_pull("gemma2:2b", 10.0);
        fixture.last_error = Some("earlier delete failed".to_string());

        assert_eq!(derive_status(&fixture.inputs()), LifecycleStatus::Pulling);
    }

    #[test]
    fn test_error_masks_selection() {
        let mut fixture = Fixture::new();
        fixture.selected = Some("llama3.2:1b".to_string());
        fixture.last_error = Some("pull failed".to_string());

        assert_eq!(derive_status(&fixture.inputs()), LifecycleStatus::Error);
    }

    #[test]
    fn test_no_selection_reads_not_installed() {
        let fixture = Fixture::new();
        assert_eq!(
            derive_status(&fixture.inputs()),
            LifecycleStatus::NotInstalled
        );
        assert_eq!(display_line(&fixture.inputs()), "No Model - Pull Required");
    }

    #[test]
    fn test_selected_model_reads_ready() {
        let mut fixture = Fixture::new();
        fixture.selected = Some("fast-1b".to_string());

        assert_eq!(derive_status(&fixture.inputs()), LifecycleStatus::Ready);
        assert_eq!(display_line(&fixture.inputs()), "Ready - fast-1b");
    }

    #[test]
    fn test_pulling_display_shows_percentage_or_phrase() {
        let fixture = Fixture::new().with_pull("llama3.2:1b", 42.4);
        assert_eq!(display_line(&fixture.inputs()), "Downloading 42%");

        let fixture = Fixture::new().with_pull("llama3.2:1b", 0.0);
        assert_eq!(display_line(&fixture.inputs()), "pulling manifest");
    }

    #[test]
    fn test_pulling_display_uses_furthest_pull() {
        let fixture = Fixture::new()
            .with_pull("llama3.2:1b", 10.0)
            .with_pull("gemma2:2b", 80.0);
        assert_eq!(display_line(&fixture.inputs()), "Downloading 80%");
    }

    #[test]
    fn test_error_display_carries_backend_message() {
        let mut fixture = Fixture::new();
        fixture.last_error = Some("Failed to pull model: 500".to_string());
        assert_eq!(
            display_line(&fixture.inputs()),
            "Error - Failed to pull model: 500"
        );
    }
}
