//! Listener fan-out for call-state changes.
//!
//! UI layers register a [`CallManagerListener`] to be told when the call
//! set, the primary call, or the audio route changes. The registry iterates
//! a snapshot of the listener set, so listeners may register or unregister
//! from inside a callback without poisoning the iteration.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::audio::AudioRoute;
use crate::call::TelecomCall;

/// Callbacks delivered to UI layers on call-state changes.
///
/// For a single state-affecting event a listener receives exactly one of
/// [`on_state_changed`](CallManagerListener::on_state_changed) or
/// [`on_primary_call_changed`](CallManagerListener::on_primary_call_changed),
/// never both.
pub trait CallManagerListener: Send + Sync {
    /// The call set changed without the primary call moving.
    fn on_state_changed(&self);

    /// The audio route changed.
    fn on_audio_state_changed(&self, route: AudioRoute);

    /// A different call became primary.
    fn on_primary_call_changed(&self, call: Arc<dyn TelecomCall>);
}

/// Concurrent-safe observer registry with snapshot iteration.
///
/// Listeners are keyed by `Arc` identity; registering the same `Arc` twice
/// is a no-op.
pub(crate) struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn CallManagerListener>>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Arc<dyn CallManagerListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    pub(crate) fn remove(&self, listener: &Arc<dyn CallManagerListener>) {
        self.listeners.write().retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Current listener set, detached from the registry.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn CallManagerListener>> {
        self.listeners.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopListener;

    impl CallManagerListener for NoopListener {
        fn on_state_changed(&self) {}
        fn on_audio_state_changed(&self, _route: AudioRoute) {}
        fn on_primary_call_changed(&self, _call: Arc<dyn TelecomCall>) {}
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let registry = ListenerRegistry::new();
        let listener: Arc<dyn CallManagerListener> = Arc::new(NoopListener);
        registry.add(listener.clone());
        registry.add(listener.clone());
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn remove_only_drops_the_matching_listener() {
        let registry = ListenerRegistry::new();
        let first: Arc<dyn CallManagerListener> = Arc::new(NoopListener);
        let second: Arc<dyn CallManagerListener> = Arc::new(NoopListener);
        registry.add(first.clone());
        registry.add(second.clone());
        registry.remove(&first);
        let remaining = registry.snapshot();
        assert_eq!(remaining.len(), 1);
        assert!(Arc::ptr_eq(&remaining[0], &second));
    }
}
