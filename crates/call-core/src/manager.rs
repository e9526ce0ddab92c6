//! Call manager: the single source of truth for which calls exist and what
//! should happen to them.
//!
//! The manager is an explicitly constructed service instance owned by the
//! application's composition root, not a process-wide static; the in-call
//! service glue feeds platform callbacks into it and UI layers query it and
//! subscribe for change notifications.
//!
//! All operations complete synchronously and fast: they run on the
//! platform's call-event callback threads, which must not be stalled.
//! Notifications are fanned out over a snapshot of the listener set, and
//! exactly one of the state-changed / primary-changed callbacks fires per
//! recompute cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::audio::{AudioRoute, CallAudioState};
use crate::call::{CallDirection, CallObserver, CallState, PhoneHandle, TelecomCall};
use crate::config::CallManagerConfig;
use crate::error::{CallCoreError, Result};
use crate::events::{CallManagerListener, ListenerRegistry};
use crate::service::InCallService;
use crate::state::{classify, PhoneState};

/// Registry of active calls plus redial policy and listener fan-out.
pub struct CallManager {
    config: CallManagerConfig,
    service: RwLock<Option<Arc<dyn InCallService>>>,
    auto_redial_enabled: AtomicBool,
    listeners: ListenerRegistry,
    state: Mutex<ManagerState>,
}

/// Mutable manager state, guarded by one lock so every policy decision sees
/// a consistent view of the call set and the redial bookkeeping.
struct ManagerState {
    /// Active calls in registration order.
    calls: Vec<Arc<dyn TelecomCall>>,
    /// Cached primary call from the last recompute.
    primary: Option<Arc<dyn TelecomCall>>,
    /// Destination of the most recent outgoing call.
    last_outgoing_handle: Option<PhoneHandle>,
    /// Staged re-placement, executed once the prior call's teardown lands.
    pending_redial_handle: Option<PhoneHandle>,
    /// Consecutive auto-redial attempts for the current outgoing number.
    auto_redial_attempts: u32,
    /// Set when the user manually declined or hung up.
    user_hung_up: bool,
}

/// What `on_call_removed` decided to do after updating the call set.
enum RemovalAction {
    /// Re-place the dropped outgoing call; suppress notifications.
    AutoRedial(Option<PhoneHandle>),
    /// A staged redial matched the removed call; place it, then notify.
    PlacePending(PhoneHandle),
    /// Plain removal; recompute and notify.
    Notify,
}

impl CallManager {
    /// Create a manager with the given configuration.
    ///
    /// The returned `Arc` is required because per-call observers hold a weak
    /// back-reference to re-enter the manager on call events.
    pub fn new(config: CallManagerConfig) -> Arc<Self> {
        Arc::new(Self {
            auto_redial_enabled: AtomicBool::new(config.auto_redial_enabled),
            config,
            service: RwLock::new(None),
            listeners: ListenerRegistry::new(),
            state: Mutex::new(ManagerState {
                calls: Vec::new(),
                primary: None,
                last_outgoing_handle: None,
                pending_redial_handle: None,
                auto_redial_attempts: 0,
                user_hung_up: false,
            }),
        })
    }

    /// Attach the platform in-call service.
    pub fn attach_service(&self, service: Arc<dyn InCallService>) {
        *self.service.write() = Some(service);
    }

    /// Detach the platform in-call service (service teardown).
    pub fn detach_service(&self) {
        *self.service.write() = None;
    }

    // ===== PLATFORM CALLBACKS =====

    /// Called when the platform adds a call.
    ///
    /// The new call becomes the cached primary immediately and listeners
    /// are told unconditionally. An outgoing call also becomes the redial
    /// target and resets the auto-redial bookkeeping.
    pub fn on_call_added(self: &Arc<Self>, call: Arc<dyn TelecomCall>) {
        {
            let mut state = self.state.lock();
            state.primary = Some(call.clone());
            state.calls.push(call.clone());

            if call.direction() == CallDirection::Outgoing {
                state.last_outgoing_handle = call.handle();
                state.user_hung_up = false;
                state.auto_redial_attempts = 0;
            }
        }
        tracing::info!("Call added: {}", call.id());

        for listener in self.listeners.snapshot() {
            listener.on_primary_call_changed(call.clone());
        }

        let observer: Arc<dyn CallObserver> = Arc::new(ManagerCallObserver {
            manager: Arc::downgrade(self),
        });
        call.register_observer(observer);
    }

    /// Called when the platform removes a call.
    ///
    /// Auto-redial preempts everything else: when enabled, the removed call
    /// was outgoing, the user did not hang up, and attempts remain under
    /// the cap, the number is re-placed and no notification fires for this
    /// removal — the redial's own add/remove events drive the next ones.
    pub fn on_call_removed(&self, call: &Arc<dyn TelecomCall>) {
        let removed_handle = call.handle();
        let action = {
            let mut state = self.state.lock();
            state.calls.retain(|c| c.id() != call.id());

            if self.auto_redial_enabled.load(Ordering::Acquire)
                && !state.user_hung_up
                && call.direction() == CallDirection::Outgoing
                && state.auto_redial_attempts < self.config.max_auto_redial_attempts
            {
                state.auto_redial_attempts += 1;
                let handle = removed_handle.or_else(|| state.last_outgoing_handle.clone());
                RemovalAction::AutoRedial(handle)
            } else if state.pending_redial_handle.is_some()
                && removed_handle == state.pending_redial_handle
            {
                state
                    .pending_redial_handle
                    .take()
                    .map_or(RemovalAction::Notify, RemovalAction::PlacePending)
            } else {
                RemovalAction::Notify
            }
        };
        tracing::info!("Call removed: {}", call.id());

        match action {
            RemovalAction::AutoRedial(handle) => {
                if let Some(handle) = handle {
                    tracing::info!("Auto-redialing {}", handle);
                    self.place_call(&handle);
                }
            }
            RemovalAction::PlacePending(handle) => {
                self.place_call(&handle);
                self.update_state();
            }
            RemovalAction::Notify => self.update_state(),
        }
    }

    /// Called when the platform reports a new audio state.
    ///
    /// Composite or unknown route values carry no named route and are
    /// dropped without notifying.
    pub fn on_audio_state_changed(&self, audio_state: CallAudioState) {
        let Some(route) = AudioRoute::from_route(audio_state.route) else {
            return;
        };
        for listener in self.listeners.snapshot() {
            listener.on_audio_state_changed(route);
        }
    }

    // ===== REDIAL POLICY =====

    /// Record that the user manually declined or hung up, so auto-redial
    /// does not fight the user on the resulting removal.
    pub fn mark_user_hung_up(&self) {
        self.state.lock().user_hung_up = true;
    }

    /// Toggle auto-redial at runtime.
    pub fn set_auto_redial_enabled(&self, enabled: bool) {
        self.auto_redial_enabled.store(enabled, Ordering::Release);
    }

    /// Whether auto-redial is currently enabled.
    pub fn auto_redial_enabled(&self) -> bool {
        self.auto_redial_enabled.load(Ordering::Acquire)
    }

    /// Redial the in-progress outgoing call or the last outgoing number.
    ///
    /// A call still dialing is disconnected first and its handle staged as
    /// a pending redial; the re-placement happens in
    /// [`on_call_removed`](Self::on_call_removed) once the teardown
    /// completes. With no call in progress the last outgoing number is
    /// placed immediately. No-op when no handle is known.
    pub fn redial(&self) {
        enum RedialAction {
            Disconnect(Arc<dyn TelecomCall>),
            Place(PhoneHandle),
        }

        let action = {
            let mut state = self.state.lock();
            let outgoing = state
                .calls
                .iter()
                .find(|c| c.state().is_outgoing_in_progress())
                .cloned();

            match outgoing {
                Some(call) => {
                    let handle = call.handle().or_else(|| state.last_outgoing_handle.clone());
                    match handle {
                        Some(handle) => {
                            state.pending_redial_handle = Some(handle);
                            Some(RedialAction::Disconnect(call))
                        }
                        None => None,
                    }
                }
                None => state
                    .last_outgoing_handle
                    .clone()
                    .map(RedialAction::Place),
            }
        };

        match action {
            Some(RedialAction::Disconnect(call)) => {
                tracing::info!("Staging redial for {}", call.id());
                call.disconnect();
            }
            Some(RedialAction::Place(handle)) => self.place_call(&handle),
            None => {}
        }
    }

    // ===== QUERIES =====

    /// Derive the current phone state from the active-call set.
    pub fn phone_state(&self) -> PhoneState {
        classify(&self.state.lock().calls)
    }

    /// Number of calls currently tracked.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// The cached primary call.
    pub fn primary_call(&self) -> Option<Arc<dyn TelecomCall>> {
        self.state.lock().primary.clone()
    }

    /// State of the primary call, if any.
    pub fn primary_state(&self) -> Option<CallState> {
        self.primary_call().map(|call| call.state())
    }

    /// Children of the tracked conference call, if one exists.
    pub fn conference_children(&self) -> Vec<Arc<dyn TelecomCall>> {
        self.state
            .lock()
            .calls
            .iter()
            .find(|c| c.is_conference())
            .map(|c| c.children())
            .unwrap_or_default()
    }

    /// Routes the current audio hardware supports.
    pub fn supported_audio_routes(&self) -> Vec<AudioRoute> {
        let Some(audio_state) = self.call_audio_state() else {
            return Vec::new();
        };
        AudioRoute::entries()
            .into_iter()
            .filter(|route| audio_state.supported_route_mask & route.route_bit() == route.route_bit())
            .collect()
    }

    /// The audio route currently in effect.
    pub fn call_audio_route(&self) -> Option<AudioRoute> {
        AudioRoute::from_route(self.call_audio_state()?.route)
    }

    // ===== CALL CONTROLS =====

    /// Answer the primary call (audio only).
    pub fn accept(&self) {
        if let Some(call) = self.primary_call() {
            call.answer();
        }
    }

    /// Reject or hang up the primary call.
    ///
    /// A ringing call gets the reject signal (optionally with a text
    /// message); a connected call is disconnected; a call already tearing
    /// down is left alone.
    pub fn reject(&self, with_message: bool, text: Option<&str>) {
        let Some(call) = self.primary_call() else {
            return;
        };
        match call.state() {
            CallState::Ringing => call.reject(with_message, text),
            CallState::Disconnected | CallState::Disconnecting => {}
            _ => call.disconnect(),
        }
    }

    /// Toggle hold on the primary call.
    ///
    /// Only a held call can be resumed and only an active call can be
    /// held; any other state is a no-op. Returns whether a hold was
    /// requested.
    pub fn toggle_hold(&self) -> bool {
        let Some(call) = self.primary_call() else {
            return false;
        };
        match call.state() {
            CallState::Holding => {
                call.unhold();
                false
            }
            CallState::Active => {
                call.hold();
                true
            }
            _ => false,
        }
    }

    /// Swap the active and held calls by resuming the held one.
    pub fn swap(&self) {
        let held = {
            let state = self.state.lock();
            if state.calls.len() > 1 {
                state
                    .calls
                    .iter()
                    .find(|c| c.state() == CallState::Holding)
                    .cloned()
            } else {
                None
            }
        };
        if let Some(call) = held {
            call.unhold();
        }
    }

    /// Merge the primary call into a conference.
    ///
    /// Prefers conferencing with the first conferenceable call; falls back
    /// to the merge-conference capability when the platform advertises it.
    pub fn merge(&self) {
        let Some(call) = self.primary_call() else {
            return;
        };
        let mut conferenceable = call.conferenceable_calls();
        if !conferenceable.is_empty() {
            call.conference_with(conferenceable.remove(0));
        } else if call.can_merge_conference() {
            call.merge_conference();
        }
    }

    /// Play a keypad DTMF tone on the primary call, stopping it after the
    /// configured tone length via the platform's deferred executor.
    pub fn keypad(&self, digit: char) {
        let Some(call) = self.primary_call() else {
            return;
        };
        call.play_dtmf_tone(digit);
        if let Some(service) = self.service.read().clone() {
            service.defer(
                self.config.dtmf_tone_length,
                Box::new(move || call.stop_dtmf_tone()),
            );
        }
    }

    /// Ask the platform to switch the audio route.
    pub fn set_audio_route(&self, route: AudioRoute) {
        if let Some(service) = self.service.read().clone() {
            service.set_audio_route(route);
        }
    }

    // ===== LISTENERS =====

    /// Register a listener for state-change notifications.
    pub fn add_listener(&self, listener: Arc<dyn CallManagerListener>) {
        self.listeners.add(listener);
    }

    /// Unregister a previously added listener.
    pub fn remove_listener(&self, listener: &Arc<dyn CallManagerListener>) {
        self.listeners.remove(listener);
    }

    // ===== INTERNAL =====

    fn call_audio_state(&self) -> Option<CallAudioState> {
        self.service.read().as_ref()?.call_audio_state()
    }

    /// Launch a call placement, swallowing and logging failures.
    ///
    /// Placement is fire-and-forget: the call-added callback is the actual
    /// success signal, so a launch failure only costs this attempt.
    fn place_call(&self, handle: &PhoneHandle) {
        if let Err(e) = self.try_place_call(handle) {
            tracing::warn!("Failed to place call to {}: {}", handle, e);
        }
    }

    fn try_place_call(&self, handle: &PhoneHandle) -> Result<()> {
        let service = self
            .service
            .read()
            .clone()
            .ok_or(CallCoreError::ServiceNotAttached)?;
        service.place_call(handle)
    }

    /// Recompute the phone state and notify listeners.
    ///
    /// If the derived primary differs from the cached one, only the
    /// primary-changed callback fires; otherwise only state-changed does.
    /// As a final step any call already reporting a terminal state is
    /// purged, covering removal callbacks that have not fired yet.
    fn update_state(&self) {
        let primary_change = {
            let mut state = self.state.lock();
            let phone_state = classify(&state.calls);
            match phone_state.primary_call().cloned() {
                None => {
                    state.primary = None;
                    None
                }
                Some(primary) => {
                    let changed = state
                        .primary
                        .as_ref()
                        .map_or(true, |previous| previous.id() != primary.id());
                    if changed {
                        state.primary = Some(primary.clone());
                        Some(primary)
                    } else {
                        None
                    }
                }
            }
        };

        match primary_change {
            Some(primary) => {
                for listener in self.listeners.snapshot() {
                    listener.on_primary_call_changed(primary.clone());
                }
            }
            None => {
                for listener in self.listeners.snapshot() {
                    listener.on_state_changed();
                }
            }
        }

        self.state
            .lock()
            .calls
            .retain(|call| !call.state().is_terminal());
    }
}

/// Observer attached to every registered call; funnels all per-call events
/// into a state recompute.
struct ManagerCallObserver {
    manager: Weak<CallManager>,
}

impl CallObserver for ManagerCallObserver {
    fn on_state_changed(&self, _call: &Arc<dyn TelecomCall>, _state: CallState) {
        if let Some(manager) = self.manager.upgrade() {
            manager.update_state();
        }
    }

    fn on_details_changed(&self, _call: &Arc<dyn TelecomCall>) {
        if let Some(manager) = self.manager.upgrade() {
            manager.update_state();
        }
    }

    fn on_conferenceable_calls_changed(&self, _call: &Arc<dyn TelecomCall>) {
        if let Some(manager) = self.manager.upgrade() {
            manager.update_state();
        }
    }
}
