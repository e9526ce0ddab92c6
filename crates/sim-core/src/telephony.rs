//! Telephony subscription seam.
//!
//! Slot resolution and USSD transport go through [`TelephonyProvider`];
//! the subsystem never talks to radio hardware directly. USSD replies
//! arrive on a platform callback context via the closure handed to
//! [`TelephonyProvider::send_ussd_request`].

use serde::{Deserialize, Serialize};

/// Marker for a subscription ID that resolves to nothing.
pub const INVALID_SUBSCRIPTION_ID: i32 = -1;

/// One active subscription as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub subscription_id: i32,
    pub slot_index: i32,
    pub carrier_name: String,
    pub phone_number: String,
}

/// Hardware state of a SIM slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Unknown,
    Absent,
    PinRequired,
    PukRequired,
    NetworkLocked,
    Ready,
    NotReady,
    PermDisabled,
    CardIoError,
    CardRestricted,
}

impl SimState {
    /// Interpret a raw platform state value; anything unrecognized is
    /// [`SimState::Unknown`].
    pub fn from_raw(raw: i32) -> SimState {
        match raw {
            1 => SimState::Absent,
            2 => SimState::PinRequired,
            3 => SimState::PukRequired,
            4 => SimState::NetworkLocked,
            5 => SimState::Ready,
            6 => SimState::NotReady,
            7 => SimState::PermDisabled,
            8 => SimState::CardIoError,
            9 => SimState::CardRestricted,
            _ => SimState::Unknown,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            SimState::Unknown => 0,
            SimState::Absent => 1,
            SimState::PinRequired => 2,
            SimState::PukRequired => 3,
            SimState::NetworkLocked => 4,
            SimState::Ready => 5,
            SimState::NotReady => 6,
            SimState::PermDisabled => 7,
            SimState::CardIoError => 8,
            SimState::CardRestricted => 9,
        }
    }
}

/// A USSD reply: carrier text on success, the platform failure code
/// otherwise.
pub type UssdReply = std::result::Result<String, i32>;

/// Callback invoked by the platform when a USSD request completes.
pub type UssdCallback = Box<dyn FnOnce(UssdReply) + Send + 'static>;

/// Platform telephony surface the SIM subsystem consumes.
pub trait TelephonyProvider: Send + Sync {
    /// Currently active subscriptions, one per occupied slot.
    fn active_subscriptions(&self) -> Vec<SubscriptionInfo>;

    /// Raw hardware state of the SIM in `slot_index`.
    fn sim_state(&self, slot_index: i32) -> SimState;

    /// Dispatch a USSD request on the given subscription. `on_reply` runs
    /// later on a platform callback thread; requests that never complete
    /// simply drop the callback.
    fn send_ussd_request(&self, subscription_id: i32, code: &str, on_reply: UssdCallback);
}
