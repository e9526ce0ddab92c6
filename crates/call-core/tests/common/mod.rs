//! Test doubles for the platform seams.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use dialtone_call_core::{
    AudioRoute, CallAudioState, CallCoreError, CallDirection, CallId, CallManagerListener,
    CallObserver, CallState, DeferredTask, InCallService, PhoneHandle, TelecomCall,
};

/// Scriptable stand-in for a platform-owned telecom call.
pub struct FakeCall {
    id: CallId,
    direction: CallDirection,
    handle: Option<PhoneHandle>,
    state: Mutex<CallState>,
    conference: bool,
    children: Mutex<Vec<Arc<dyn TelecomCall>>>,
    conferenceable: Mutex<Vec<Arc<dyn TelecomCall>>>,
    can_merge: AtomicBool,
    observers: Mutex<Vec<Arc<dyn CallObserver>>>,

    pub answers: AtomicUsize,
    pub rejects: Mutex<Vec<(bool, Option<String>)>>,
    pub disconnects: AtomicUsize,
    pub holds: AtomicUsize,
    pub unholds: AtomicUsize,
    pub merges: AtomicUsize,
    pub conferenced_with: Mutex<Vec<CallId>>,
    pub dtmf_played: Mutex<Vec<char>>,
    pub dtmf_stops: AtomicUsize,
}

impl FakeCall {
    fn new(
        direction: CallDirection,
        state: CallState,
        handle: Option<PhoneHandle>,
        conference: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: CallId::new_v4(),
            direction,
            handle,
            state: Mutex::new(state),
            conference,
            children: Mutex::new(Vec::new()),
            conferenceable: Mutex::new(Vec::new()),
            can_merge: AtomicBool::new(false),
            observers: Mutex::new(Vec::new()),
            answers: AtomicUsize::new(0),
            rejects: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
            holds: AtomicUsize::new(0),
            unholds: AtomicUsize::new(0),
            merges: AtomicUsize::new(0),
            conferenced_with: Mutex::new(Vec::new()),
            dtmf_played: Mutex::new(Vec::new()),
            dtmf_stops: AtomicUsize::new(0),
        })
    }

    pub fn outgoing(number: &str) -> Arc<Self> {
        Self::new(
            CallDirection::Outgoing,
            CallState::Dialing,
            Some(PhoneHandle::new(number)),
            false,
        )
    }

    pub fn incoming(number: &str) -> Arc<Self> {
        Self::new(
            CallDirection::Incoming,
            CallState::Ringing,
            Some(PhoneHandle::new(number)),
            false,
        )
    }

    pub fn conference(children: Vec<Arc<dyn TelecomCall>>) -> Arc<Self> {
        let call = Self::new(CallDirection::Outgoing, CallState::Active, None, true);
        *call.children.lock() = children;
        call
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    /// Move to `state` and fire registered observers, as the platform does.
    pub fn transition(self: &Arc<Self>, state: CallState) {
        *self.state.lock() = state;
        let as_dyn: Arc<dyn TelecomCall> = self.clone();
        let observers = self.observers.lock().clone();
        for observer in observers {
            observer.on_state_changed(&as_dyn, state);
        }
    }

    /// Move to `state` without firing observers.
    pub fn set_state_silently(&self, state: CallState) {
        *self.state.lock() = state;
    }

    pub fn set_conferenceable(&self, calls: Vec<Arc<dyn TelecomCall>>) {
        *self.conferenceable.lock() = calls;
    }

    pub fn set_can_merge(&self, can_merge: bool) {
        self.can_merge.store(can_merge, Ordering::SeqCst);
    }
}

impl TelecomCall for FakeCall {
    fn id(&self) -> CallId {
        self.id
    }
    fn state(&self) -> CallState {
        *self.state.lock()
    }
    fn direction(&self) -> CallDirection {
        self.direction
    }
    fn handle(&self) -> Option<PhoneHandle> {
        self.handle.clone()
    }
    fn is_conference(&self) -> bool {
        self.conference
    }
    fn children(&self) -> Vec<Arc<dyn TelecomCall>> {
        self.children.lock().clone()
    }
    fn conferenceable_calls(&self) -> Vec<Arc<dyn TelecomCall>> {
        self.conferenceable.lock().clone()
    }
    fn can_merge_conference(&self) -> bool {
        self.can_merge.load(Ordering::SeqCst)
    }
    fn register_observer(&self, observer: Arc<dyn CallObserver>) {
        self.observers.lock().push(observer);
    }
    fn answer(&self) {
        self.answers.fetch_add(1, Ordering::SeqCst);
    }
    fn reject(&self, with_message: bool, text: Option<&str>) {
        self.rejects
            .lock()
            .push((with_message, text.map(str::to_owned)));
    }
    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
    fn hold(&self) {
        self.holds.fetch_add(1, Ordering::SeqCst);
    }
    fn unhold(&self) {
        self.unholds.fetch_add(1, Ordering::SeqCst);
    }
    fn merge_conference(&self) {
        self.merges.fetch_add(1, Ordering::SeqCst);
    }
    fn conference_with(&self, other: Arc<dyn TelecomCall>) {
        self.conferenced_with.lock().push(other.id());
    }
    fn play_dtmf_tone(&self, digit: char) {
        self.dtmf_played.lock().push(digit);
    }
    fn stop_dtmf_tone(&self) {
        self.dtmf_stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-call service double that records placements and deferred work.
pub struct FakeInCallService {
    pub placed: Mutex<Vec<PhoneHandle>>,
    pub audio: Mutex<Option<CallAudioState>>,
    pub routes_requested: Mutex<Vec<AudioRoute>>,
    pub fail_placement: AtomicBool,
    deferred: Mutex<Vec<(Duration, DeferredTask)>>,
}

impl FakeInCallService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            placed: Mutex::new(Vec::new()),
            audio: Mutex::new(None),
            routes_requested: Mutex::new(Vec::new()),
            fail_placement: AtomicBool::new(false),
            deferred: Mutex::new(Vec::new()),
        })
    }

    pub fn set_audio_state(&self, state: CallAudioState) {
        *self.audio.lock() = Some(state);
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.lock().len()
    }

    /// Run everything scheduled through `defer`, as the platform timer would.
    pub fn run_deferred(&self) {
        let tasks: Vec<_> = self.deferred.lock().drain(..).collect();
        for (_, task) in tasks {
            task();
        }
    }
}

impl InCallService for FakeInCallService {
    fn place_call(&self, handle: &PhoneHandle) -> dialtone_call_core::Result<()> {
        if self.fail_placement.load(Ordering::SeqCst) {
            return Err(CallCoreError::placement("activity launch rejected"));
        }
        self.placed.lock().push(handle.clone());
        Ok(())
    }

    fn call_audio_state(&self) -> Option<CallAudioState> {
        *self.audio.lock()
    }

    fn set_audio_route(&self, route: AudioRoute) {
        self.routes_requested.lock().push(route);
    }

    fn defer(&self, delay: Duration, task: DeferredTask) {
        self.deferred.lock().push((delay, task));
    }
}

/// Listener double that counts every notification it receives.
pub struct RecordingListener {
    pub state_changes: AtomicUsize,
    pub primary_changes: Mutex<Vec<CallId>>,
    pub audio_routes: Mutex<Vec<AudioRoute>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state_changes: AtomicUsize::new(0),
            primary_changes: Mutex::new(Vec::new()),
            audio_routes: Mutex::new(Vec::new()),
        })
    }

    pub fn state_change_count(&self) -> usize {
        self.state_changes.load(Ordering::SeqCst)
    }

    pub fn primary_change_ids(&self) -> Vec<CallId> {
        self.primary_changes.lock().clone()
    }

    pub fn notification_count(&self) -> usize {
        self.state_change_count() + self.primary_changes.lock().len()
    }
}

impl CallManagerListener for RecordingListener {
    fn on_state_changed(&self) {
        self.state_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_audio_state_changed(&self, route: AudioRoute) {
        self.audio_routes.lock().push(route);
    }

    fn on_primary_call_changed(&self, call: Arc<dyn TelecomCall>) {
        self.primary_changes.lock().push(call.id());
    }
}
