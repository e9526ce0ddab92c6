//! Call records and the platform call seam.
//!
//! This module provides the non-owning view of a telecom call that the
//! coordination core operates on. Calls are created and destroyed entirely
//! by the platform's telecom stack; the core only observes them and issues
//! imperative requests (answer, disconnect, hold) back through the same
//! handle.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a call
pub type CallId = Uuid;

/// Current state of a telecom call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    /// Call object exists but has not started signaling yet
    New,
    /// Outgoing call is being set up with the network
    Connecting,
    /// Outgoing call is ringing on the remote end
    Dialing,
    /// Incoming call is ringing locally
    Ringing,
    /// Call is connected and audio is flowing
    Active,
    /// Call is parked on hold
    Holding,
    /// Teardown has started but not completed
    Disconnecting,
    /// Call has ended
    Disconnected,
}

impl CallState {
    /// Check if the call has reached its terminal state.
    ///
    /// Calls transition monotonically toward [`CallState::Disconnected`];
    /// once there they are purged from the active set.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Disconnected)
    }

    /// Check if the call is an outgoing call still being set up.
    pub fn is_outgoing_in_progress(&self) -> bool {
        matches!(self, CallState::Dialing | CallState::Connecting)
    }
}

/// Direction of a call (from the device's perspective)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallDirection {
    /// Outgoing call (user initiated)
    Outgoing,
    /// Incoming call (received from the network)
    Incoming,
}

/// Destination address of a call, typically a `tel:` URI or raw dialable
/// number.
///
/// Handles are compared for equality when matching a pending redial against
/// the call being torn down.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneHandle(String);

impl PhoneHandle {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-call callback attached by the call manager.
///
/// Every detail, state, or conferenceability change re-triggers a full
/// phone-state recompute; the observer does not carry any decision logic of
/// its own.
pub trait CallObserver: Send + Sync {
    /// The call moved to a new state.
    fn on_state_changed(&self, call: &Arc<dyn TelecomCall>, state: CallState);

    /// Call details (handle, capabilities, …) changed without a state move.
    fn on_details_changed(&self, call: &Arc<dyn TelecomCall>);

    /// The set of calls this call can be conferenced with changed.
    fn on_conferenceable_calls_changed(&self, call: &Arc<dyn TelecomCall>);
}

/// Non-owning view of one platform-owned telecom call.
///
/// The coordination core never constructs or destroys a call; the platform
/// hands these out through its call-added callback and reclaims them after
/// the call-removed callback. All imperative operations are fire-and-forget
/// requests whose outcome is reported back through [`CallObserver`].
pub trait TelecomCall: Send + Sync {
    /// Stable identity of this call for the duration of its lifetime.
    fn id(&self) -> CallId;

    /// Current state as last reported by the telecom stack.
    fn state(&self) -> CallState;

    /// Whether the call was placed by the user or received from the network.
    fn direction(&self) -> CallDirection;

    /// Destination address, when the platform has one.
    fn handle(&self) -> Option<PhoneHandle>;

    /// Whether this call object represents a merged conference.
    fn is_conference(&self) -> bool {
        false
    }

    /// Child calls of a conference; empty for ordinary calls.
    fn children(&self) -> Vec<Arc<dyn TelecomCall>> {
        Vec::new()
    }

    /// Calls this call could currently be conferenced with.
    fn conferenceable_calls(&self) -> Vec<Arc<dyn TelecomCall>> {
        Vec::new()
    }

    /// Whether the platform advertises the merge-conference capability.
    fn can_merge_conference(&self) -> bool {
        false
    }

    /// Attach a change observer. The platform must invoke it from its
    /// callback context on every subsequent change.
    fn register_observer(&self, observer: Arc<dyn CallObserver>);

    /// Answer a ringing incoming call (audio only).
    fn answer(&self);

    /// Reject a ringing call, optionally with a text message.
    fn reject(&self, with_message: bool, text: Option<&str>);

    /// Tear the call down.
    fn disconnect(&self);

    /// Park the call on hold.
    fn hold(&self);

    /// Resume a held call.
    fn unhold(&self);

    /// Merge this call's existing conference.
    fn merge_conference(&self);

    /// Conference this call with another one.
    fn conference_with(&self, other: Arc<dyn TelecomCall>);

    /// Start playing a DTMF tone for `digit`.
    fn play_dtmf_tone(&self, digit: char);

    /// Stop the currently playing DTMF tone.
    fn stop_dtmf_tone(&self);
}
