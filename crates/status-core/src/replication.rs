//! Replication snapshots of one entity's status state.
//!
//! The authoritative owner publishes a [`StatusSnapshot`] through the
//! substrate's replicated-state channel; every other participant installs it
//! as a read-only mirror with
//! [`StatusSimulation::apply_replicated`](crate::simulation::StatusSimulation::apply_replicated).
//!
//! Snapshots are plain serde data. The [`ActiveDebuffs`] summary lets
//! presentation code check flags without walking the slots.

use serde::{Deserialize, Serialize};

use crate::aura::{AuraBonuses, AuraState};
use crate::debuff::DebuffTable;
use crate::effect::{ActiveDebuffs, DebuffKind};
use crate::entity::EntityId;

/// Full status state of one entity at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Entity the state belongs to.
    pub entity: EntityId,
    /// Simulation tick the snapshot was taken at.
    pub tick: u64,
    /// Summary of live debuffs.
    pub active: ActiveDebuffs,
    /// Debuff slots.
    pub debuffs: DebuffTable,
    /// Broadcast slots and received bonuses.
    pub auras: AuraState,
}

impl StatusSnapshot {
    /// Builds a snapshot, deriving the summary flags from `debuffs`.
    #[must_use]
    pub fn new(entity: EntityId, tick: u64, debuffs: DebuffTable, auras: AuraState) -> Self {
        Self {
            entity,
            tick,
            active: debuffs.active_flags(),
            debuffs,
            auras,
        }
    }

    /// Returns `true` if `kind` is live in this snapshot.
    #[must_use]
    pub fn has(&self, kind: DebuffKind) -> bool {
        self.active.contains(kind.flag())
    }

    /// Returns `true` if Freeze or Stun is live.
    #[must_use]
    pub fn is_movement_locked(&self) -> bool {
        self.active.intersects(ActiveDebuffs::MOVEMENT_LOCK)
    }

    /// Received aura bonuses at snapshot time.
    #[must_use]
    pub fn received(&self) -> &AuraBonuses {
        self.auras.received()
    }

    /// Returns `true` if the summary flags agree with the slots.
    ///
    /// A mismatch means the snapshot was edited or corrupted in transit.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.active == self.debuffs.active_flags()
    }
}

/// Result of installing a replicated snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReplicationOutcome {
    /// The mirror was created or updated.
    Installed,
    /// The snapshot is older than the mirror's current state.
    Stale,
    /// The local participant owns the entity; its state is canonical here.
    OwnedLocally,
    /// The summary flags disagree with the slots.
    Inconsistent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::AuraKind;

    fn sample() -> StatusSnapshot {
        let table: DebuffTable = serde_json::from_value(serde_json::json!({
            "slots": [
                { "active": false, "remaining_duration": 0.0, "magnitude": 0.0, "next_tick_time": 0.0 },
                { "active": true, "remaining_duration": 2.5, "magnitude": 4.0, "next_tick_time": 1.25 },
                { "active": false, "remaining_duration": 0.0, "magnitude": 0.0, "next_tick_time": 0.0 },
                { "active": false, "remaining_duration": 0.0, "magnitude": 0.0, "next_tick_time": 0.0 },
                { "active": true, "remaining_duration": 1.0, "magnitude": 0.0, "next_tick_time": 0.0 },
                { "active": false, "remaining_duration": 0.0, "magnitude": 0.0, "next_tick_time": 0.0 },
                { "active": false, "remaining_duration": 0.0, "magnitude": 0.0, "next_tick_time": 0.0 },
                { "active": false, "remaining_duration": 0.0, "magnitude": 0.0, "next_tick_time": 0.0 }
            ],
            "frozen_base_speed": null
        }))
        .expect("valid table json");

        let mut auras = AuraState::new();
        auras.start(AuraKind::Armor, 6.0, 0.25, 8.0, 0.1);
        let mut received = AuraBonuses::NONE;
        received.raise(AuraKind::Damage, 0.15);
        auras.set_received(received);

        StatusSnapshot::new(EntityId::new(4), 120, table, auras)
    }

    #[test]
    fn summary_flags_follow_slots() {
        let snapshot = sample();
        assert!(snapshot.has(DebuffKind::Burn));
        assert!(snapshot.has(DebuffKind::Stun));
        assert!(!snapshot.has(DebuffKind::Poison));
        assert!(snapshot.is_movement_locked());
        assert!(snapshot.is_consistent());
    }

    #[test]
    fn json_round_trip() {
        let snapshot = sample();
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: StatusSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
        assert!((back.received().damage_multiplier() - 1.15).abs() < 1e-6);
    }

    #[test]
    fn tampered_flags_are_inconsistent() {
        let mut snapshot = sample();
        snapshot.active.remove(ActiveDebuffs::STUN);
        assert!(!snapshot.is_consistent());
    }
}
