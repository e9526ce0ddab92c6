//! In-call service seam.
//!
//! The call manager talks to the platform's in-call service exclusively
//! through this trait: launching new outgoing calls, reading and switching
//! audio routes, and scheduling deferred work (the DTMF stop-tone timer).
//! Implementations wrap the real telecom service; tests substitute fakes.

use std::time::Duration;

use crate::audio::{AudioRoute, CallAudioState};
use crate::call::PhoneHandle;
use crate::error::Result;

/// Deferred task handed to the platform for delayed execution.
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// Platform surface the call manager drives.
pub trait InCallService: Send + Sync {
    /// Launch a new outgoing call toward `handle`.
    ///
    /// A returned error means the launch itself failed (e.g. the activity
    /// start was rejected); whether the call actually connects is reported
    /// later through the call-added callback.
    fn place_call(&self, handle: &PhoneHandle) -> Result<()>;

    /// Current audio state, if a call bank is active.
    fn call_audio_state(&self) -> Option<CallAudioState>;

    /// Ask the platform to switch the audio route.
    fn set_audio_route(&self, route: AudioRoute);

    /// Run `task` after `delay` on a platform thread.
    fn defer(&self, delay: Duration, task: DeferredTask);
}
