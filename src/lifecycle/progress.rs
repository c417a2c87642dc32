use crate::events::PullProgress;

/// Tracked state of one in-flight model pull, keyed by model id in the
/// controller's progress map. Created on the first progress event for an
/// unknown id, removed on completion or pull failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadProgress {
    /// Raw status phrase from the backend
    pub status: String,
    pub completed: Option<u64>,
    pub total: Option<u64>,
    /// Displayed percentage, 0-100. Never decreases while the pull is tracked.
    pub percentage: f64,
}

impl DownloadProgress {
    /// Placeholder entry inserted when a pull is started locally, before the
    /// first backend progress event arrives.
    pub fn starting() -> Self {
        Self {
            status: "starting".to_string(),
            ..Self::default()
        }
    }

    /// Fold a progress event into this entry. Status and byte counts are
    /// replaced; the percentage only moves forward and is clamped to 0-100,
    /// so out-of-order or noisy backend updates never walk the display
    /// backwards.
    pub fn apply(&mut self, update: &PullProgress) {
        self.status = update.status.clone();
        self.completed = update.completed;
        self.total = update.total;
        self.percentage = self.percentage.max(update.percentage.clamp(0.0, 100.0));
    }
}
