//! Carrier signal ingestion.
//!
//! Two external signal types feed the registry: USSD balance replies and
//! carrier SMS bodies. Both are unstructured carrier text, parsed with
//! forgiving regexes; SMS updates are partial by design — a field the
//! message does not mention keeps its prior value.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::card::SimCardState;
use crate::manager::SimStateManager;
use crate::telephony::{TelephonyProvider, INVALID_SUBSCRIPTION_ID};

// SMS phrasing varies per carrier; each counter gets its own pattern
static SMS_FREE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:free|remaining|balance)\s*minutes[:\s]+(\d+)").unwrap());
static SMS_OVERFLOW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:bonus|overflow)\s*minutes[:\s]+(\d+)").unwrap());
static USED_MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)used\s*minutes[:\s]+(\d+)").unwrap());

// USSD replies are terser
static USSD_FREE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)free\s*minutes[:\s]+(\d+)").unwrap());
static USSD_OVERFLOW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)overflow\s*minutes\s*(?:remaining)?:?\s*(\d+)").unwrap());

fn capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|group| group.as_str().parse().ok())
}

/// Carrier-name to USSD balance-query-code lookup.
///
/// Injected configuration rather than a hardcoded switch; carriers without
/// an entry are never queried. Lookup is case-insensitive on the carrier
/// name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UssdDirectory {
    codes: HashMap<String, String>,
}

impl UssdDirectory {
    /// An empty directory: no carrier gets queried.
    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// The built-in carrier set.
    pub fn with_defaults() -> Self {
        Self::empty()
            .with_carrier("verizon", "*611#")
            .with_carrier("att", "*777#")
            .with_carrier("tmobile", "*123#")
    }

    /// Add or replace one carrier mapping.
    pub fn with_carrier(mut self, carrier: &str, code: &str) -> Self {
        self.codes.insert(carrier.to_lowercase(), code.to_string());
        self
    }

    /// The USSD code for a carrier, if mapped.
    pub fn code_for(&self, carrier: &str) -> Option<&str> {
        self.codes.get(&carrier.to_lowercase()).map(String::as_str)
    }
}

impl Default for UssdDirectory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Minute counters extracted from a USSD reply; unmatched fields read 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UssdMinutes {
    pub free: u32,
    pub used: u32,
    pub overflow: u32,
}

/// Parse a USSD balance reply.
pub fn parse_ussd_minutes(response: &str) -> UssdMinutes {
    UssdMinutes {
        free: capture_u32(&USSD_FREE_RE, response).unwrap_or(0),
        used: capture_u32(&USED_MINUTES_RE, response).unwrap_or(0),
        overflow: capture_u32(&USSD_OVERFLOW_RE, response).unwrap_or(0),
    }
}

/// Feeds telephony subscriptions, USSD replies, and carrier SMS into a
/// [`SimStateManager`].
pub struct SimInfoLoader {
    manager: Arc<SimStateManager>,
    telephony: Arc<dyn TelephonyProvider>,
    ussd_directory: UssdDirectory,
}

impl SimInfoLoader {
    pub fn new(manager: Arc<SimStateManager>, telephony: Arc<dyn TelephonyProvider>) -> Self {
        Self {
            manager,
            telephony,
            ussd_directory: UssdDirectory::default(),
        }
    }

    /// Replace the carrier directory.
    pub fn with_ussd_directory(mut self, directory: UssdDirectory) -> Self {
        self.ussd_directory = directory;
        self
    }

    /// Full refresh: load the persisted snapshot, run the day-gated reset,
    /// fold every active subscription over saved or fresh entries, kick
    /// off USSD queries for mapped carriers, and persist the result.
    ///
    /// USSD replies land later through their callbacks and persist again
    /// on arrival.
    pub fn load_sim_info(&self) {
        self.manager.load_all();
        self.manager.reset_if_needed();

        for sub in self.telephony.active_subscriptions() {
            let slot_index = sub.slot_index;
            let sim_state = self.telephony.sim_state(slot_index).as_raw();

            let sim = match self.manager.sim(slot_index) {
                Some(saved) => SimCardState {
                    carrier_name: sub.carrier_name.clone(),
                    phone_number: sub.phone_number.clone(),
                    sim_state,
                    ..saved
                },
                None => SimCardState {
                    sim_state,
                    ..SimCardState::new(slot_index, sub.carrier_name.clone(), sub.phone_number.clone())
                },
            };
            self.manager.update_sim(slot_index, sim);

            self.query_ussd_minutes(slot_index, &sub.carrier_name);
        }

        if let Err(e) = self.manager.save_all() {
            tracing::warn!("Failed to persist SIM info: {}", e);
        }
    }

    /// Fetch minute counters for one slot via USSD, if the carrier is
    /// mapped and the slot resolves to a subscription.
    fn query_ussd_minutes(&self, slot_index: i32, carrier_name: &str) {
        let Some(code) = self.ussd_directory.code_for(carrier_name) else {
            tracing::debug!("No USSD code for carrier {:?}, skipping", carrier_name);
            return;
        };
        let subscription_id = self.subscription_id_for_slot(slot_index);
        if subscription_id == INVALID_SUBSCRIPTION_ID {
            return;
        }

        let manager = Arc::clone(&self.manager);
        self.telephony.send_ussd_request(
            subscription_id,
            code,
            Box::new(move |reply| {
                let Ok(response) = reply else {
                    // failed queries leave the stored counters alone
                    return;
                };
                let minutes = parse_ussd_minutes(&response);
                let Some(sim) = manager.sim(slot_index) else {
                    return;
                };
                manager.update_sim(
                    slot_index,
                    SimCardState {
                        free_minutes_total: minutes.free,
                        free_minutes_used: minutes.used,
                        overflow_minutes_total: minutes.overflow,
                        overflow_minutes_used: 0,
                        ..sim
                    },
                );
                if let Err(e) = manager.save_all() {
                    tracing::warn!("Failed to persist USSD minute update: {}", e);
                }
            }),
        );
    }

    /// Merge a carrier SMS into the slot the subscription resolves to.
    ///
    /// Fields absent from the body keep their previous values; after the
    /// merge, overflow usage is re-clamped against the updated pools. An
    /// unresolvable subscription or untracked slot is a silent no-op.
    pub fn ingest_carrier_sms(&self, body: &str, subscription_id: i32) {
        let slot_index = self.slot_for_subscription(subscription_id);
        if slot_index < 0 {
            return;
        }
        let Some(current) = self.manager.sim(slot_index) else {
            return;
        };

        let free_total = capture_u32(&SMS_FREE_RE, body);
        let overflow_total = capture_u32(&SMS_OVERFLOW_RE, body);
        let used_total = capture_u32(&USED_MINUTES_RE, body);

        let updated = SimCardState {
            free_minutes_total: free_total.unwrap_or(current.free_minutes_total),
            overflow_minutes_total: overflow_total.unwrap_or(current.overflow_minutes_total),
            free_minutes_used: used_total.unwrap_or(current.free_minutes_used),
            ..current
        }
        .recalculate_overflow_usage();

        self.manager.update_sim(slot_index, updated);
    }

    fn subscription_id_for_slot(&self, slot_index: i32) -> i32 {
        self.telephony
            .active_subscriptions()
            .into_iter()
            .find(|sub| sub.slot_index == slot_index)
            .map(|sub| sub.subscription_id)
            .unwrap_or(INVALID_SUBSCRIPTION_ID)
    }

    /// Resolve a subscription ID to its slot index, or -1.
    pub fn slot_for_subscription(&self, subscription_id: i32) -> i32 {
        if subscription_id == INVALID_SUBSCRIPTION_ID {
            return -1;
        }
        self.telephony
            .active_subscriptions()
            .into_iter()
            .find(|sub| sub.subscription_id == subscription_id)
            .map(|sub| sub.slot_index)
            .unwrap_or(-1)
    }
}
