//! Phone-state classification.
//!
//! [`classify`] is a pure function from the current active-call set to a
//! normalized [`PhoneState`]. It is re-run on every mutating event and has
//! no side effects, so the derived state is never stored — only the cached
//! primary call is, and that cache lives in the manager.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::call::{CallId, CallState, TelecomCall};

/// Normalized view of everything the dialer is currently tracking.
///
/// Whenever any call exists, exactly one call is primary. For two calls the
/// primary is picked by a fixed precedence; for conference scenarios the
/// conference call competes with the one call outside it.
#[derive(Clone)]
pub enum PhoneState {
    /// No tracked calls.
    NoCall,
    /// Exactly one call (possibly a conference standing alone).
    SingleCall(Arc<dyn TelecomCall>),
    /// Two logical calls; `primary` is the one the UI should focus.
    TwoCalls {
        primary: Arc<dyn TelecomCall>,
        secondary: Arc<dyn TelecomCall>,
    },
}

impl PhoneState {
    /// The call a UI should treat as focused, if any.
    pub fn primary_call(&self) -> Option<&Arc<dyn TelecomCall>> {
        match self {
            PhoneState::NoCall => None,
            PhoneState::SingleCall(call) => Some(call),
            PhoneState::TwoCalls { primary, .. } => Some(primary),
        }
    }
}

impl fmt::Debug for PhoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneState::NoCall => f.write_str("NoCall"),
            PhoneState::SingleCall(call) => {
                f.debug_tuple("SingleCall").field(&call.id()).finish()
            }
            PhoneState::TwoCalls { primary, secondary } => f
                .debug_struct("TwoCalls")
                .field("primary", &primary.id())
                .field("secondary", &secondary.id())
                .finish(),
        }
    }
}

/// Derive the phone state from the active-call set.
///
/// Two-call precedence, highest first:
/// 1. active + dialing/connecting → the new call is primary;
/// 2. dialing/connecting + holding → the new call is primary;
/// 3. active + holding → the active call is primary;
/// 4. anything else → the two calls in registration order.
///
/// With three or more calls, a conference call must be present; a set
/// without one is inconsistent data and classifies as [`PhoneState::NoCall`].
/// When the conference's children plus the conference itself do not account
/// for the whole set, the earliest-registered non-conference call outside
/// the conference's children is the second logical call; if no such call
/// exists the conference stands alone. A second call that is active or
/// still dialing takes primary over the conference.
pub fn classify(calls: &[Arc<dyn TelecomCall>]) -> PhoneState {
    match calls.len() {
        0 => PhoneState::NoCall,
        1 => PhoneState::SingleCall(calls[0].clone()),
        2 => classify_two(calls),
        _ => classify_conference(calls),
    }
}

fn classify_two(calls: &[Arc<dyn TelecomCall>]) -> PhoneState {
    let active = calls.iter().find(|c| c.state() == CallState::Active);
    let new_call = calls.iter().find(|c| c.state().is_outgoing_in_progress());
    let on_hold = calls.iter().find(|c| c.state() == CallState::Holding);

    let (primary, secondary) = match (active, new_call, on_hold) {
        (Some(active), Some(new_call), _) => (new_call, active),
        (None, Some(new_call), Some(on_hold)) => (new_call, on_hold),
        (Some(active), None, Some(on_hold)) => (active, on_hold),
        _ => (&calls[0], &calls[1]),
    };
    PhoneState::TwoCalls {
        primary: primary.clone(),
        secondary: secondary.clone(),
    }
}

fn classify_conference(calls: &[Arc<dyn TelecomCall>]) -> PhoneState {
    let Some(conference) = calls.iter().find(|c| c.is_conference()) else {
        // inconsistent data: >=3 calls but nothing marked as a conference
        return PhoneState::NoCall;
    };

    let children = conference.children();
    let second_call = if children.len() + 1 != calls.len() {
        let child_ids: HashSet<CallId> = children.iter().map(|c| c.id()).collect();
        calls
            .iter()
            .find(|c| !c.is_conference() && !child_ids.contains(&c.id()))
            .cloned()
    } else {
        None
    };

    match second_call {
        None => PhoneState::SingleCall(conference.clone()),
        Some(second) => {
            let state = second.state();
            if state == CallState::Active || state.is_outgoing_in_progress() {
                PhoneState::TwoCalls {
                    primary: second,
                    secondary: conference.clone(),
                }
            } else {
                PhoneState::TwoCalls {
                    primary: conference.clone(),
                    secondary: second,
                }
            }
        }
    }
}
