//! Pull event channel for the models module.
//!
//! The enhancement backend publishes two event types while a model pull is
//! running: per-chunk progress updates and a final completion notice. Any
//! number of listeners may subscribe; each subscription is an explicit
//! handle that releases its listener when dropped, so an owner that goes
//! away stops receiving events instead of leaking a callback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

/// Progress of an in-flight model pull, as reported by the serving daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullProgress {
    pub model_id: String,
    /// Raw status phrase from the daemon (e.g. "pulling manifest")
    pub status: String,
    pub completed: Option<u64>,
    pub total: Option<u64>,
    pub percentage: f64,
}

type ProgressListener = Box<dyn Fn(&PullProgress) + Send + Sync>;
type CompleteListener = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    PullProgress,
    PullComplete,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    progress: HashMap<u64, ProgressListener>,
    complete: HashMap<u64, CompleteListener>,
}

/// In-process publish/subscribe channel for pull events.
///
/// Delivery is synchronous fan-out: `emit_*` invokes every live listener
/// before returning. Fire-and-forget, at most once per emission, no
/// acknowledgment.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Listeners>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe_pull_progress<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&PullProgress) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.progress.insert(id, Box::new(listener));
        Subscription {
            bus: Arc::downgrade(self),
            kind: EventKind::PullProgress,
            id,
        }
    }

    pub fn subscribe_pull_complete<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.complete.insert(id, Box::new(listener));
        Subscription {
            bus: Arc::downgrade(self),
            kind: EventKind::PullComplete,
            id,
        }
    }

    pub fn emit_pull_progress(&self, progress: &PullProgress) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.progress.values() {
            listener(progress);
        }
    }

    pub fn emit_pull_complete(&self, model_id: &str) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.complete.values() {
            listener(model_id);
        }
    }

    /// Number of live pull-progress listeners.
    pub fn pull_progress_listeners(&self) -> usize {
        self.listeners.lock().unwrap().progress.len()
    }

    /// Number of live pull-complete listeners.
    pub fn pull_complete_listeners(&self) -> usize {
        self.listeners.lock().unwrap().complete.len()
    }

    fn unsubscribe(&self, kind: EventKind, id: u64) {
        let mut listeners = self.listeners.lock().unwrap();
        match kind {
            EventKind::PullProgress => {
                listeners.progress.remove(&id);
            }
            EventKind::PullComplete => {
                listeners.complete.remove(&id);
            }
        }
    }
}

/// Handle to a registered listener. Dropping it removes the listener.
pub struct Subscription {
    bus: Weak<EventBus>,
    kind: EventKind,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.kind, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn progress(model_id: &str, percentage: f64) -> PullProgress {
        PullProgress {
            model_id: model_id.to_string(),
            status: "pulling manifest".to_string(),
            completed: None,
            total: None,
            percentage,
        }
    }

    #[test]
    fn test_emit_reaches_every_listener() {
        let bus = EventBus::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_count = first.clone();
        let _sub_a = bus.subscribe_pull_progress(move |_| {
            first_count.fetch_add(1, Ordering::SeqCst);
        });
        let second_count = second.clone();
        let _sub_b = bus.subscribe_pull_progress(move |_| {
            second_count.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit_pull_progress(&progress("llama3.2:1b", 10.0));
        bus.emit_pull_progress(&progress("llama3.2:1b", 20.0));

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropping_subscription_removes_listener() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let count = calls.clone();
        let sub = bus.subscribe_pull_complete(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.pull_complete_listeners(), 1);

        bus.emit_pull_complete("gemma2:2b");
        drop(sub);
        assert_eq!(bus.pull_complete_listeners(), 0);

        bus.emit_pull_complete("gemma2:2b");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "no delivery after drop");
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus = EventBus::new();
        let sub = bus.subscribe_pull_progress(|_| {});
        drop(bus);
        drop(sub);
    }

    #[test]
    fn test_completion_carries_model_id() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_ids = seen.clone();
        let _sub = bus.subscribe_pull_complete(move |id| {
            seen_ids.lock().unwrap().push(id.to_string());
        });

        bus.emit_pull_complete("qwen2.5:0.5b");
        assert_eq!(*seen.lock().unwrap(), vec!["qwen2.5:0.5b".to_string()]);
    }
}
