//! Audio route projection.
//!
//! The in-call service reports its audio state as a raw route value plus a
//! capability bitmask. This module narrows those into a closed set of named
//! routes that UI layers can render and select.

use serde::{Deserialize, Serialize};

/// Audio routing targets exposed by the in-call service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioRoute {
    Earpiece,
    Bluetooth,
    WiredHeadset,
    Speaker,
}

impl AudioRoute {
    /// The bit this route occupies in the platform's route bitmask.
    pub const fn route_bit(&self) -> u32 {
        match self {
            AudioRoute::Earpiece => 1,
            AudioRoute::Bluetooth => 2,
            AudioRoute::WiredHeadset => 4,
            AudioRoute::Speaker => 8,
        }
    }

    /// All known routes, in display order.
    pub const fn entries() -> [AudioRoute; 4] {
        [
            AudioRoute::Earpiece,
            AudioRoute::Bluetooth,
            AudioRoute::WiredHeadset,
            AudioRoute::Speaker,
        ]
    }

    /// Map a raw route value to a named route.
    ///
    /// Composite or unknown values (e.g. the platform's wired-or-earpiece
    /// pseudo-route) return `None` and are dropped by callers.
    pub fn from_route(route: u32) -> Option<AudioRoute> {
        Self::entries().into_iter().find(|r| r.route_bit() == route)
    }
}

/// Snapshot of the platform audio state for the current call bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallAudioState {
    /// Raw route value currently in effect.
    pub route: u32,
    /// Bitmask of routes the hardware currently supports.
    pub supported_route_mask: u32,
    /// Whether the microphone is muted.
    pub muted: bool,
}

impl CallAudioState {
    pub fn new(route: AudioRoute, supported_route_mask: u32) -> Self {
        Self {
            route: route.route_bit(),
            supported_route_mask,
            muted: false,
        }
    }
}
