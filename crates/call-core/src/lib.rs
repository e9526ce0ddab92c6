//! # dialtone-call-core
//!
//! Call-state coordination core for the dialtone dialer.
//!
//! This crate tracks every call the platform's telecom stack reports,
//! derives a normalized phone state (no call / single call / two calls,
//! with conference handling), arbitrates redial and auto-redial behavior,
//! and fans change notifications out to registered UI listeners.
//!
//! The platform is reached only through two seams: [`TelecomCall`] (the
//! non-owning view of one platform-owned call) and [`InCallService`] (call
//! placement, audio routing, deferred execution). Both are traits, so the
//! whole core runs in tests without a device.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dialtone_call_core::{CallManager, CallManagerConfig, PhoneState};
//!
//! let manager = CallManager::new(CallManagerConfig::new().with_auto_redial(true));
//!
//! // Platform glue feeds call events in:
//! // manager.on_call_added(call);
//! // manager.on_call_removed(&call);
//!
//! match manager.phone_state() {
//!     PhoneState::NoCall => println!("idle"),
//!     PhoneState::SingleCall(call) => println!("in call {}", call.id()),
//!     PhoneState::TwoCalls { primary, .. } => println!("focused on {}", primary.id()),
//! }
//! ```

pub mod audio;
pub mod call;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod service;
pub mod state;

pub use audio::{AudioRoute, CallAudioState};
pub use call::{CallDirection, CallId, CallObserver, CallState, PhoneHandle, TelecomCall};
pub use config::CallManagerConfig;
pub use error::{CallCoreError, Result};
pub use events::CallManagerListener;
pub use manager::CallManager;
pub use service::{DeferredTask, InCallService};
pub use state::{classify, PhoneState};
