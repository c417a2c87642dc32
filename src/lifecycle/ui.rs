use serde::{Deserialize, Serialize};

use super::status::LifecycleStatus;

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Events the controller emits toward the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum UiEvent {
    /// Status (and its display line) changed and the badge should re-render
    #[serde(rename = "statusChanged")]
    StatusChanged {
        status: LifecycleStatus,
        display: String,
    },
    /// Non-blocking, auto-dismissing notification
    #[serde(rename = "notice")]
    Notice {
        level: NoticeLevel,
        message: String,
    },
    /// An open model picker should close (after a successful selection)
    #[serde(rename = "closeModelPicker")]
    CloseModelPicker,
}

/// Outbound sink for controller events. The desktop shell forwards these to
/// the frontend; tests record them.
pub trait UiSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

/// Blocking yes/no decision, asked before destructive operations.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}
