use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::backend::{EnhancementBackend, ModelDescriptor};
use crate::config::{ConfigKey, ConfigStore};
use crate::enhance;
use crate::events::{EventBus, PullProgress, Subscription};

use super::error::LifecycleError;
use super::progress::DownloadProgress;
use super::status::{derive_status, display_line, LifecycleStatus, StatusInputs};
use super::ui::{ConfirmPrompt, NoticeLevel, UiEvent, UiSink};

/// Signals forwarded from the event channel into the controller's pump.
enum PullSignal {
    Progress(PullProgress),
    Complete(String),
}

#[derive(Default)]
struct LifecycleState {
    available: bool,
    catalog: Vec<ModelDescriptor>,
    downloaded: Vec<String>,
    recommended: Option<String>,
    selected: Option<String>,
    progress: HashMap<String, DownloadProgress>,
    last_error: Option<String>,
}

impl LifecycleState {
    fn inputs(&self) -> StatusInputs<'_> {
        StatusInputs {
            available: self.available,
            selected: self.selected.as_deref(),
            progress: &self.progress,
            last_error: self.last_error.as_deref(),
        }
    }
}

/// Orchestrates selection, pull, and deletion of the enhancement model and
/// derives the status the settings UI renders.
///
/// All collaborators are injected: the backend facade, the pull event
/// channel, the settings store, the UI sink, and the delete confirmation
/// prompt. State mutation happens under one lock and the lock is never held
/// across an await, so interleaved backend results and events fold in one at
/// a time.
pub struct ModelLifecycleController<S> {
    backend: Arc<dyn EnhancementBackend>,
    bus: Arc<EventBus>,
    settings: Arc<S>,
    ui: Arc<dyn UiSink>,
    confirm: Arc<dyn ConfirmPrompt>,
    state: Mutex<LifecycleState>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<S> ModelLifecycleController<S>
where
    S: ConfigStore + Send + Sync + 'static,
{
    pub fn new(
        backend: Arc<dyn EnhancementBackend>,
        bus: Arc<EventBus>,
        settings: Arc<S>,
        ui: Arc<dyn UiSink>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Arc<Self> {
        let selected = settings.get(&ConfigKey::AI_SELECTED_MODEL);
        Arc::new(Self {
            backend,
            bus,
            settings,
            ui,
            confirm,
            state: Mutex::new(LifecycleState {
                selected,
                ..LifecycleState::default()
            }),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Subscribe to pull events and start the signal pump.
    ///
    /// Re-activating replaces the previous subscriptions, so there is never
    /// more than one live subscription per event type. Must run inside a
    /// tokio runtime.
    pub fn activate(self: &Arc<Self>) {
        self.deactivate();

        let (tx, mut rx) = mpsc::unbounded_channel();

        let progress_tx = tx.clone();
        let progress_sub = self.bus.subscribe_pull_progress(move |progress| {
            let _ = progress_tx.send(PullSignal::Progress(progress.clone()));
        });
        let complete_sub = self.bus.subscribe_pull_complete(move |model_id| {
            let _ = tx.send(PullSignal::Complete(model_id.to_string()));
        });

        *self.subscriptions.lock().unwrap() = vec![progress_sub, complete_sub];

        // Single pump keeps event handling in one cooperative context. It
        // ends when deactivate (or controller drop) releases the senders.
        let controller = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                match signal {
                    PullSignal::Progress(progress) => controller.apply_pull_progress(progress),
                    PullSignal::Complete(model_id) => controller.complete_pull(&model_id).await,
                }
            }
        });
    }

    /// Release the event subscriptions. Events arriving afterwards are
    /// dropped instead of updating disposed state.
    pub fn deactivate(&self) {
        self.subscriptions.lock().unwrap().clear();
    }

    /// Fetch availability, catalog, downloaded list, and the recommended
    /// model hint concurrently, replacing the cached copies wholesale.
    pub async fn refresh(&self) {
        let (available, catalog, downloaded, recommended) = tokio::join!(
            self.backend.check_available(),
            self.backend.list_installable_models(),
            self.backend.list_downloaded_models(),
            self.backend.recommended_model(),
        );

        {
            let mut state = self.state.lock().unwrap();
            state.available = available;
            match catalog {
                Ok(models) => state.catalog = models,
                Err(e) => warn!("Failed to fetch model catalog: {}", e),
            }
            match downloaded {
                Ok(models) => state.downloaded = models,
                Err(e) => warn!("Failed to fetch downloaded models: {}", e),
            }
            match recommended {
                Ok(id) if !id.is_empty() => state.recommended = Some(id),
                Ok(_) => {}
                Err(e) => warn!("Failed to fetch model recommendation: {}", e),
            }
        }

        self.emit_status();
    }

    /// Make `id` the active enhancement model.
    ///
    /// The selection is persisted before the in-memory copy changes, so a
    /// failed write leaves the prior selection intact.
    pub fn select_model(&self, id: &str) -> Result<(), LifecycleError> {
        if let Err(e) = self
            .settings
            .set(&ConfigKey::AI_SELECTED_MODEL, id.to_string())
        {
            warn!("Failed to persist model selection '{}': {}", id, e);
            let error = LifecycleError::Settings(e);
            self.notify(NoticeLevel::Error, error.user_message());
            return Err(error);
        }

        {
            let mut state = self.state.lock().unwrap();
            state.selected = Some(id.to_string());
            state.last_error = None;
        }

        info!("Selected model '{}'", id);
        self.ui.emit(UiEvent::CloseModelPicker);
        self.notify(NoticeLevel::Success, format!("{} is now the active model", id));
        self.emit_status();
        Ok(())
    }

    /// Download `id` and, on success, make it the active model.
    ///
    /// Rejected without touching the backend when the daemon is unreachable.
    /// The progress entry seeded here is cleared by the completion event
    /// (after a downloaded-list refresh) or by pull failure, whichever
    /// arrives.
    pub async fn pull_model(&self, id: &str) -> Result<(), LifecycleError> {
        if !self.state.lock().unwrap().available {
            let error = LifecycleError::Unavailable;
            self.notify(NoticeLevel::Error, error.user_message());
            self.emit_status();
            return Err(error);
        }

        {
            let mut state = self.state.lock().unwrap();
            state
                .progress
                .insert(id.to_string(), DownloadProgress::starting());
        }
        self.emit_status();

        info!("Starting pull of model '{}'", id);
        match self.backend.pull_model(id).await {
            Ok(()) => {
                // A freshly pulled model becomes the selected model.
                self.select_model(id)?;
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                {
                    let mut state = self.state.lock().unwrap();
                    state.progress.remove(id);
                    state.last_error = Some(if message.is_empty() {
                        "Model download failed".to_string()
                    } else {
                        message.clone()
                    });
                }
                warn!("Pull of '{}' failed: {}", id, message);
                self.notify(NoticeLevel::Error, message);
                self.emit_status();
                Err(e.into())
            }
        }
    }

    /// Delete a downloaded model after user confirmation.
    ///
    /// Declining the prompt is a silent no-op with zero backend calls. On
    /// success the downloaded list is refreshed and, when the deleted model
    /// was the active one, the selection is unset (persisted first).
    pub async fn delete_model(&self, id: &str) -> Result<(), LifecycleError> {
        let question = format!(
            "Delete model '{}'? It will need to be pulled again before use.",
            id
        );
        if !self.confirm.confirm(&question) {
            debug!("Delete of '{}' declined", id);
            return Ok(());
        }

        if let Err(e) = self.backend.delete_model(id).await {
            warn!("Delete of '{}' failed: {}", id, e);
            self.notify(NoticeLevel::Error, e.to_string());
            return Err(e.into());
        }

        match self.backend.list_downloaded_models().await {
            Ok(models) => self.state.lock().unwrap().downloaded = models,
            Err(e) => warn!("Failed to refresh downloaded models after delete: {}", e),
        }

        let was_selected = self.state.lock().unwrap().selected.as_deref() == Some(id);
        if was_selected {
            if let Err(e) = self.settings.delete(&ConfigKey::AI_SELECTED_MODEL) {
                warn!("Failed to clear persisted selection: {}", e);
                let error = LifecycleError::Settings(e);
                self.notify(NoticeLevel::Error, error.user_message());
                return Err(error);
            }
            self.state.lock().unwrap().selected = None;
        }

        self.state.lock().unwrap().last_error = None;
        info!("Deleted model '{}'", id);
        self.notify(NoticeLevel::Success, format!("Deleted {}", id));
        self.emit_status();
        Ok(())
    }

    /// Run the enhancement prompt over `text` with the persisted settings.
    pub async fn test_enhancement(&self, text: &str) -> Result<String, LifecycleError> {
        let enabled = self
            .settings
            .get(&ConfigKey::AI_ENHANCEMENT_ENABLED)
            .unwrap_or(false);
        if !enabled {
            return Err(LifecycleError::EnhancementDisabled);
        }

        let model = self
            .settings
            .get(&ConfigKey::AI_SELECTED_MODEL)
            .ok_or(LifecycleError::NoModelSelected)?;

        if enhance::is_too_short(text) {
            info!("Skipping AI enhancement for very short text (< 3 words)");
            return Ok(text.to_string());
        }

        let features = self
            .settings
            .get(&ConfigKey::AI_FEATURES)
            .unwrap_or_default();

        Ok(self.backend.enhance_text(text, &model, &features).await?)
    }

    /// Fold one pull-progress event into the tracked entry for its model,
    /// creating the entry when the id is not yet tracked.
    pub fn apply_pull_progress(&self, update: PullProgress) {
        {
            let mut state = self.state.lock().unwrap();
            state
                .progress
                .entry(update.model_id.clone())
                .or_default()
                .apply(&update);
        }
        self.emit_status();
    }

    /// Handle a pull-completion event for `id`.
    ///
    /// The downloaded list is refreshed before the progress entry is
    /// cleared, so status never reads ready off a stale list. Completion
    /// for an id that is no longer tracked is a no-op; that makes either
    /// ordering of the completion event and the pull call's own result
    /// valid.
    pub async fn complete_pull(&self, id: &str) {
        if !self.state.lock().unwrap().progress.contains_key(id) {
            debug!("Ignoring completion for untracked pull '{}'", id);
            return;
        }

        match self.backend.list_downloaded_models().await {
            Ok(models) => self.state.lock().unwrap().downloaded = models,
            Err(e) => warn!("Failed to refresh downloaded models after pull: {}", e),
        }

        {
            let mut state = self.state.lock().unwrap();
            state.progress.remove(id);
            state.last_error = None;
        }

        info!("Pull of '{}' complete", id);
        self.emit_status();
    }

    // ===== Read accessors =====

    pub fn status(&self) -> LifecycleStatus {
        derive_status(&self.state.lock().unwrap().inputs())
    }

    pub fn display(&self) -> String {
        display_line(&self.state.lock().unwrap().inputs())
    }

    pub fn selected_model(&self) -> Option<String> {
        self.state.lock().unwrap().selected.clone()
    }

    pub fn recommended_model(&self) -> Option<String> {
        self.state.lock().unwrap().recommended.clone()
    }

    pub fn catalog(&self) -> Vec<ModelDescriptor> {
        self.state.lock().unwrap().catalog.clone()
    }

    /// Whether a catalog model is downloaded, by the prefix rule.
    pub fn is_downloaded(&self, catalog_id: &str) -> bool {
        super::is_model_downloaded(&self.state.lock().unwrap().downloaded, catalog_id)
    }

    pub fn progress_for(&self, id: &str) -> Option<DownloadProgress> {
        self.state.lock().unwrap().progress.get(id).cloned()
    }

    fn notify(&self, level: NoticeLevel, message: String) {
        self.ui.emit(UiEvent::Notice { level, message });
    }

    fn emit_status(&self) {
        let (status, display) = {
            let state = self.state.lock().unwrap();
            (derive_status(&state.inputs()), display_line(&state.inputs()))
        };
        self.ui.emit(UiEvent::StatusChanged { status, display });
    }
}
