//! Per-SIM minute pools.

use serde::{Deserialize, Serialize};

use crate::telephony::SimState;

/// Minute pools and billing cycle for one SIM card.
///
/// Serialized with the exact field names the persisted snapshot uses
/// (`slotIndex`, `freeMinutesTotal`, …). The counters come from carrier
/// reports that can be internally inconsistent, so derived remainders clamp
/// at zero instead of ever going negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimCardState {
    /// Hardware slot this SIM sits in.
    pub slot_index: i32,
    pub carrier_name: String,
    pub phone_number: String,
    /// Raw hardware state as last reported by telephony; kept raw so the
    /// persisted snapshot round-trips exactly. See [`SimState::from_raw`].
    pub sim_state: i32,

    // minute pools
    pub free_minutes_total: u32,
    pub free_minutes_used: u32,
    pub overflow_minutes_total: u32,
    pub overflow_minutes_used: u32,

    /// Billing cycle day (1..=31); 1 = first of month.
    pub cycle_reset_day: u32,
}

impl SimCardState {
    /// A fresh entry for a slot with nothing known beyond its identity.
    pub fn new(slot_index: i32, carrier_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            slot_index,
            carrier_name: carrier_name.into(),
            phone_number: phone_number.into(),
            sim_state: SimState::Unknown.as_raw(),
            free_minutes_total: 0,
            free_minutes_used: 0,
            overflow_minutes_total: 0,
            overflow_minutes_used: 0,
            cycle_reset_day: 1,
        }
    }

    pub fn free_minutes_remaining(&self) -> u32 {
        self.free_minutes_total.saturating_sub(self.free_minutes_used)
    }

    pub fn overflow_minutes_remaining(&self) -> u32 {
        self.overflow_minutes_total
            .saturating_sub(self.overflow_minutes_used)
    }

    pub fn total_minutes_remaining(&self) -> u32 {
        self.free_minutes_remaining() + self.overflow_minutes_remaining()
    }

    /// Clamp recorded overflow usage to the capacity actually left.
    ///
    /// Carrier SMS reports can claim more overflow usage than the pools
    /// allow; the clamp restores the invariant without rejecting the
    /// update. Idempotent: re-applying never changes the result.
    pub fn recalculate_overflow_usage(mut self) -> Self {
        let overflow_capacity = (self.free_minutes_total + self.overflow_minutes_total)
            .saturating_sub(self.free_minutes_used + self.overflow_minutes_used);
        if self.overflow_minutes_used > overflow_capacity {
            self.overflow_minutes_used = overflow_capacity;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> SimCardState {
        SimCardState {
            free_minutes_total: 100,
            overflow_minutes_total: 50,
            ..SimCardState::new(0, "carrier", "+15550000")
        }
    }

    #[test]
    fn remainders_clamp_at_zero() {
        let mut sim = sim();
        sim.free_minutes_used = 120;
        sim.overflow_minutes_used = 60;
        assert_eq!(sim.free_minutes_remaining(), 0);
        assert_eq!(sim.overflow_minutes_remaining(), 0);
        assert_eq!(sim.total_minutes_remaining(), 0);
    }

    #[test]
    fn consistent_usage_is_left_alone() {
        let mut sim = sim();
        sim.free_minutes_used = 80;
        sim.overflow_minutes_used = 20;
        let recalculated = sim.clone().recalculate_overflow_usage();
        assert_eq!(recalculated, sim);
    }

    #[test]
    fn excess_overflow_usage_is_clamped() {
        let mut sim = sim();
        sim.free_minutes_used = 100;
        sim.overflow_minutes_used = 200;
        let recalculated = sim.recalculate_overflow_usage();
        // capacity was (100 + 50) - (100 + 200), saturated to zero
        assert_eq!(recalculated.overflow_minutes_used, 0);
    }

    #[test]
    fn recalculation_is_idempotent() {
        let mut sim = sim();
        sim.free_minutes_used = 90;
        sim.overflow_minutes_used = 70;
        let once = sim.recalculate_overflow_usage();
        let twice = once.clone().recalculate_overflow_usage();
        assert_eq!(once, twice);
    }

    #[test]
    fn snapshot_field_names_match_the_persisted_layout() {
        let json = serde_json::to_value(sim()).expect("serialize");
        for key in [
            "slotIndex",
            "carrierName",
            "phoneNumber",
            "simState",
            "freeMinutesTotal",
            "freeMinutesUsed",
            "overflowMinutesTotal",
            "overflowMinutesUsed",
            "cycleResetDay",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }
}
