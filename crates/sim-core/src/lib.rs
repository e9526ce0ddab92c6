//! # dialtone-sim-core
//!
//! Per-SIM minute tracking for the dialtone dialer: free and overflow
//! minute pools per hardware slot, consumption accounting on call
//! teardown, USSD/SMS-based usage ingestion, and billing-cycle resets.
//!
//! The registry ([`SimStateManager`]) is safe for concurrent mutation from
//! call-teardown accounting, USSD callbacks, and SMS receipt. Durable
//! storage and telephony access are trait seams ([`StateStore`],
//! [`TelephonyProvider`]), so the subsystem runs in tests without a
//! device.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dialtone_sim_core::{MemoryStore, SimCardState, SimStateManager};
//!
//! let manager = SimStateManager::new(Arc::new(MemoryStore::new()));
//! manager.update_sim(0, SimCardState {
//!     free_minutes_total: 100,
//!     ..SimCardState::new(0, "att", "+15550001")
//! });
//!
//! // a 25-minute call ended on slot 0
//! assert_eq!(manager.add_used_minutes(0, 25), 25);
//! assert_eq!(manager.total_remaining_minutes(0), 75);
//! ```

pub mod card;
pub mod error;
pub mod loader;
pub mod manager;
pub mod store;
pub mod telephony;

pub use card::SimCardState;
pub use error::{Result, SimCoreError};
pub use loader::{parse_ussd_minutes, SimInfoLoader, UssdDirectory, UssdMinutes};
pub use manager::{SimStateManager, LAST_RESET_KEY, SNAPSHOT_KEY};
pub use store::{MemoryStore, StateStore};
pub use telephony::{
    SimState, SubscriptionInfo, TelephonyProvider, UssdCallback, UssdReply,
    INVALID_SUBSCRIPTION_ID,
};
