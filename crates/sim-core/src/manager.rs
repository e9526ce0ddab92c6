//! Concurrent registry of per-SIM minute state.
//!
//! Call-teardown accounting, USSD callbacks, and SMS receipt all mutate
//! the registry from different execution contexts, so entries live in a
//! concurrent keyed map rather than behind one ad hoc lock. Persistence is
//! a single JSON snapshot keyed by string slot index, plus an ISO date
//! stamp gating the monthly usage reset to once per calendar day.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use dashmap::DashMap;

use crate::card::SimCardState;
use crate::error::Result;
use crate::store::StateStore;

/// Store key holding the serialized registry snapshot.
pub const SNAPSHOT_KEY: &str = "sim_state_json";

/// Store key holding the last reset date stamp (ISO `yyyy-mm-dd`).
pub const LAST_RESET_KEY: &str = "sim_state_last_reset";

/// Registry of [`SimCardState`] keyed by hardware slot index.
pub struct SimStateManager {
    sims: DashMap<i32, SimCardState>,
    store: Arc<dyn StateStore>,
}

impl SimStateManager {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            sims: DashMap::new(),
            store,
        }
    }

    /// Drop every tracked SIM.
    pub fn clear(&self) {
        self.sims.clear();
    }

    /// Insert or replace the state for a slot.
    pub fn update_sim(&self, slot_index: i32, sim: SimCardState) {
        tracing::debug!("Updating SIM state for slot {}", slot_index);
        self.sims.insert(slot_index, sim);
    }

    /// State for one slot, if tracked.
    pub fn sim(&self, slot_index: i32) -> Option<SimCardState> {
        self.sims.get(&slot_index).map(|entry| entry.value().clone())
    }

    /// All tracked SIMs, in no particular order.
    pub fn all_sims(&self) -> Vec<SimCardState> {
        self.sims.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Total minutes still available on a slot (free plus overflow).
    pub fn total_remaining_minutes(&self, slot_index: i32) -> u32 {
        self.sim(slot_index)
            .map(|sim| sim.total_minutes_remaining())
            .unwrap_or(0)
    }

    /// Consume minutes for a finished call: free pool first, then
    /// overflow, each capped at its remaining capacity. Minutes beyond the
    /// total remaining capacity are dropped. Returns the amount actually
    /// consumed; an untracked slot consumes nothing.
    pub fn add_used_minutes(&self, slot_index: i32, minutes: u32) -> u32 {
        let Some(mut entry) = self.sims.get_mut(&slot_index) else {
            return 0;
        };
        let sim = entry.value_mut();
        let mut remaining = minutes;

        let from_free = remaining.min(sim.free_minutes_remaining());
        sim.free_minutes_used += from_free;
        remaining -= from_free;

        if remaining > 0 {
            let from_overflow = remaining.min(sim.overflow_minutes_remaining());
            sim.overflow_minutes_used += from_overflow;
            remaining -= from_overflow;
        }

        let consumed = minutes - remaining;
        tracing::debug!(
            "Recorded {} of {} requested minutes on slot {}",
            consumed,
            minutes,
            slot_index
        );
        consumed
    }

    // -------------------------
    // Persistence
    // -------------------------

    /// Serialize the whole registry as one JSON object keyed by string
    /// slot index and hand it to the store.
    pub fn save_all(&self) -> Result<()> {
        let mut snapshot = serde_json::Map::new();
        for entry in self.sims.iter() {
            snapshot.insert(entry.key().to_string(), serde_json::to_value(entry.value())?);
        }
        let blob = serde_json::Value::Object(snapshot).to_string();
        self.store.put(SNAPSHOT_KEY, &blob)
    }

    /// Load the persisted snapshot, replacing the in-memory registry.
    ///
    /// Best-effort: a missing blob keeps the registry as is, a corrupt one
    /// is logged and leaves the registry empty rather than partially
    /// populated.
    pub fn load_all(&self) {
        let Some(blob) = self.store.get(SNAPSHOT_KEY) else {
            return;
        };
        match serde_json::from_str::<HashMap<String, SimCardState>>(&blob) {
            Ok(parsed) => {
                self.sims.clear();
                for sim in parsed.into_values() {
                    self.sims.insert(sim.slot_index, sim);
                }
                tracing::debug!("Loaded {} SIM entries from snapshot", self.sims.len());
            }
            Err(e) => {
                tracing::warn!("Discarding corrupt SIM snapshot: {}", e);
                self.sims.clear();
            }
        }
    }

    // -------------------------
    // Monthly reset
    // -------------------------

    /// Reset monthly usage when a billing cycle day passes. Call at
    /// process start and once per day.
    pub fn reset_if_needed(&self) {
        self.reset_if_needed_on(Local::now().date_naive());
    }

    /// Date-injected variant of [`reset_if_needed`](Self::reset_if_needed).
    ///
    /// No-op when the check already ran today. Otherwise every SIM whose
    /// cycle reset day equals today's day-of-month has its usage counters
    /// zeroed; the date stamp is persisted either way so the comparison
    /// happens at most once per calendar day.
    pub fn reset_if_needed_on(&self, today: NaiveDate) {
        let stamp = today.to_string();
        if self.store.get(LAST_RESET_KEY).as_deref() == Some(stamp.as_str()) {
            return;
        }

        let day_of_month = today.day();
        let mut changed = false;
        for mut entry in self.sims.iter_mut() {
            let sim = entry.value_mut();
            if sim.cycle_reset_day == day_of_month {
                sim.free_minutes_used = 0;
                sim.overflow_minutes_used = 0;
                changed = true;
            }
        }

        if changed {
            tracing::info!("Monthly minute reset applied for day {}", day_of_month);
            if let Err(e) = self.save_all() {
                tracing::warn!("Failed to persist registry after reset: {}", e);
            }
        }
        if let Err(e) = self.store.put(LAST_RESET_KEY, &stamp) {
            tracing::warn!("Failed to persist reset stamp: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> SimStateManager {
        SimStateManager::new(Arc::new(MemoryStore::new()))
    }

    fn sim(slot: i32, free_total: u32, free_used: u32) -> SimCardState {
        SimCardState {
            free_minutes_total: free_total,
            free_minutes_used: free_used,
            ..SimCardState::new(slot, "carrier", "+15550000")
        }
    }

    #[test]
    fn minutes_within_free_capacity_are_fully_consumed() {
        let manager = manager();
        manager.update_sim(0, sim(0, 100, 0));

        assert_eq!(manager.add_used_minutes(0, 30), 30);
        let updated = manager.sim(0).expect("tracked");
        assert_eq!(updated.free_minutes_used, 30);
        assert_eq!(updated.overflow_minutes_used, 0);
    }

    #[test]
    fn overflow_pool_covers_what_free_cannot() {
        let manager = manager();
        let mut card = sim(0, 100, 90);
        card.overflow_minutes_total = 40;
        manager.update_sim(0, card);

        assert_eq!(manager.add_used_minutes(0, 20), 20);
        let updated = manager.sim(0).expect("tracked");
        assert_eq!(updated.free_minutes_used, 100);
        assert_eq!(updated.overflow_minutes_used, 10);
    }

    #[test]
    fn excess_minutes_are_dropped_not_carried() {
        let manager = manager();
        let mut card = sim(0, 100, 90);
        card.overflow_minutes_total = 5;
        manager.update_sim(0, card);

        assert_eq!(manager.add_used_minutes(0, 60), 15);
        let updated = manager.sim(0).expect("tracked");
        assert_eq!(updated.free_minutes_used, 100);
        assert_eq!(updated.overflow_minutes_used, 5);
        assert_eq!(manager.total_remaining_minutes(0), 0);
    }

    #[test]
    fn untracked_slots_consume_nothing() {
        let manager = manager();
        assert_eq!(manager.add_used_minutes(3, 10), 0);
    }
}
