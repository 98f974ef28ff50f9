//! Aura broadcast registry and received-bonus snapshot.
//!
//! Every entity plays two roles:
//! - **Provider**: up to six [`AuraBroadcast`]s (one per [`AuraKind`]) that it
//!   radiates to anybody in range. Broadcasts are timed and self-expire.
//! - **Receiver**: one [`AuraBonuses`] snapshot, rewritten wholesale by each
//!   aggregation pass (see [`crate::aggregator`]).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effect::{duration_steps, AuraBroadcast, AuraKind};
use crate::entity::EntityId;
use crate::events::StatusEvent;

/// The strongest in-range bonus of each aura kind, as fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AuraBonuses([f32; AuraKind::COUNT]);

impl AuraBonuses {
    /// All bonuses zero.
    pub const NONE: Self = Self([0.0; AuraKind::COUNT]);

    /// The bonus for `kind`.
    #[must_use]
    pub fn get(&self, kind: AuraKind) -> f32 {
        self.0[kind.index()]
    }

    /// Raises the bonus for `kind` to `magnitude` if larger.
    ///
    /// Same-kind bonuses never add up; only the strongest counts.
    pub fn raise(&mut self, kind: AuraKind, magnitude: f32) {
        let slot = &mut self.0[kind.index()];
        *slot = slot.max(magnitude);
    }

    /// Zeroes every bonus.
    pub fn reset(&mut self) {
        *self = Self::NONE;
    }

    /// `1 + attack speed bonus`.
    #[must_use]
    pub fn attack_speed_multiplier(&self) -> f32 {
        1.0 + self.get(AuraKind::AttackSpeed)
    }

    /// `1 + damage bonus`.
    #[must_use]
    pub fn damage_multiplier(&self) -> f32 {
        1.0 + self.get(AuraKind::Damage)
    }

    /// `1 + move speed bonus`.
    #[must_use]
    pub fn move_speed_multiplier(&self) -> f32 {
        1.0 + self.get(AuraKind::MoveSpeed)
    }

    /// Incoming damage reduction; subtracted by the combat resolver.
    #[must_use]
    pub fn damage_reduction(&self) -> f32 {
        self.get(AuraKind::Protection)
    }

    /// `1 + armor bonus`.
    #[must_use]
    pub fn armor_multiplier(&self) -> f32 {
        1.0 + self.get(AuraKind::Armor)
    }

    /// Additive critical chance bonus.
    #[must_use]
    pub fn critical_bonus(&self) -> f32 {
        self.get(AuraKind::Critical)
    }
}

/// One entity's aura state in both roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuraState {
    broadcasts: [AuraBroadcast; AuraKind::COUNT],
    received: AuraBonuses,
}

impl AuraState {
    /// Creates an empty aura state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The broadcast slot for `kind`.
    #[must_use]
    pub fn broadcast(&self, kind: AuraKind) -> &AuraBroadcast {
        &self.broadcasts[kind.index()]
    }

    /// All six broadcast slots, indexed by [`AuraKind::index`].
    #[must_use]
    pub fn broadcasts(&self) -> &[AuraBroadcast; AuraKind::COUNT] {
        &self.broadcasts
    }

    /// Iterates live broadcasts in kind order.
    pub fn active_broadcasts(&self) -> impl Iterator<Item = (AuraKind, &AuraBroadcast)> + '_ {
        AuraKind::ALL
            .into_iter()
            .map(|kind| (kind, &self.broadcasts[kind.index()]))
            .filter(|(_, b)| b.active)
    }

    /// Number of live broadcasts.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.broadcasts.iter().filter(|b| b.active).count()
    }

    /// Returns `true` if any broadcast is live.
    #[must_use]
    pub fn is_broadcasting(&self) -> bool {
        self.broadcasts.iter().any(|b| b.active)
    }

    /// The received-bonus snapshot from the last aggregation pass.
    #[must_use]
    pub fn received(&self) -> &AuraBonuses {
        &self.received
    }

    /// Replaces the received-bonus snapshot.
    pub fn set_received(&mut self, received: AuraBonuses) {
        self.received = received;
    }

    /// Starts or overwrites the `kind` broadcast, lasting `duration` at
    /// timestep `dt`. Returns `true` if it was already live.
    pub fn start(
        &mut self,
        kind: AuraKind,
        radius: f32,
        magnitude: f32,
        duration: f32,
        dt: f32,
    ) -> bool {
        let slot = &mut self.broadcasts[kind.index()];
        let refreshed = slot.active;
        *slot = AuraBroadcast {
            active: true,
            radius,
            magnitude,
            remaining_duration: duration,
            remaining_steps: duration_steps(duration, dt),
        };
        refreshed
    }

    /// Counts live broadcasts down by `dt`, ending the expired ones.
    pub fn advance(&mut self, entity: EntityId, dt: f32, out: &mut Vec<StatusEvent>) {
        for kind in AuraKind::ALL {
            let slot = &mut self.broadcasts[kind.index()];
            if !slot.active {
                continue;
            }
            slot.remaining_duration = (slot.remaining_duration - dt).max(0.0);
            slot.remaining_steps = slot.remaining_steps.saturating_sub(1);
            if slot.remaining_steps == 0 {
                slot.clear();
                debug!(%entity, %kind, "aura expired");
                out.push(StatusEvent::AuraEnded { entity, kind });
            }
        }
    }

    /// Ends every live broadcast, returning how many were removed.
    pub fn clear_all(&mut self, entity: EntityId, out: &mut Vec<StatusEvent>) -> usize {
        let mut removed = 0;
        for kind in AuraKind::ALL {
            let slot = &mut self.broadcasts[kind.index()];
            if slot.active {
                slot.clear();
                out.push(StatusEvent::AuraEnded { entity, kind });
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: EntityId = EntityId::new(9);

    mod bonus_tests {
        use super::*;

        #[test]
        fn raise_keeps_maximum() {
            let mut bonuses = AuraBonuses::default();
            bonuses.raise(AuraKind::AttackSpeed, 0.3);
            bonuses.raise(AuraKind::AttackSpeed, 0.25);
            assert!((bonuses.get(AuraKind::AttackSpeed) - 0.3).abs() < f32::EPSILON);
        }

        #[test]
        fn multipliers() {
            let mut bonuses = AuraBonuses::default();
            bonuses.raise(AuraKind::AttackSpeed, 0.2);
            bonuses.raise(AuraKind::Damage, 0.1);
            bonuses.raise(AuraKind::MoveSpeed, 0.15);
            bonuses.raise(AuraKind::Protection, 0.05);
            bonuses.raise(AuraKind::Armor, 0.4);
            bonuses.raise(AuraKind::Critical, 0.07);

            assert!((bonuses.attack_speed_multiplier() - 1.2).abs() < 1e-6);
            assert!((bonuses.damage_multiplier() - 1.1).abs() < 1e-6);
            assert!((bonuses.move_speed_multiplier() - 1.15).abs() < 1e-6);
            assert!((bonuses.damage_reduction() - 0.05).abs() < 1e-6);
            assert!((bonuses.armor_multiplier() - 1.4).abs() < 1e-6);
            assert!((bonuses.critical_bonus() - 0.07).abs() < 1e-6);
        }

        #[test]
        fn reset_zeroes() {
            let mut bonuses = AuraBonuses::default();
            bonuses.raise(AuraKind::Armor, 0.4);
            bonuses.reset();
            assert_eq!(bonuses, AuraBonuses::NONE);
            assert!((bonuses.armor_multiplier() - 1.0).abs() < f32::EPSILON);
        }
    }

    mod broadcast_tests {
        use super::*;

        #[test]
        fn start_and_refresh() {
            let mut auras = AuraState::new();
            assert!(!auras.start(AuraKind::Damage, 6.0, 0.2, 5.0, 0.1));
            assert!(auras.start(AuraKind::Damage, 8.0, 0.1, 2.0, 0.1));

            let b = auras.broadcast(AuraKind::Damage);
            assert!(b.active);
            assert!((b.radius - 8.0).abs() < f32::EPSILON);
            assert!((b.magnitude - 0.1).abs() < f32::EPSILON);
            assert!((b.remaining_duration - 2.0).abs() < f32::EPSILON);
            assert_eq!(auras.active_count(), 1);
        }

        #[test]
        fn expires_with_single_event() {
            let mut auras = AuraState::new();
            auras.start(AuraKind::Armor, 5.0, 0.3, 0.3, 0.1);
            let mut out = Vec::new();
            for _ in 0..10 {
                auras.advance(E, 0.1, &mut out);
            }
            assert_eq!(
                out,
                vec![StatusEvent::AuraEnded {
                    entity: E,
                    kind: AuraKind::Armor
                }]
            );
            assert!(!auras.is_broadcasting());
            assert_eq!(auras.broadcast(AuraKind::Armor), &AuraBroadcast::default());
        }

        #[test]
        fn partial_step_duration_lasts_one_more_step() {
            let mut auras = AuraState::new();
            // ceil(0.3005 / 0.1) = 4 steps.
            auras.start(AuraKind::Damage, 5.0, 0.2, 0.3005, 0.1);
            let mut out = Vec::new();
            for _ in 0..3 {
                auras.advance(E, 0.1, &mut out);
            }
            assert!(auras.is_broadcasting());
            assert!(out.is_empty());

            auras.advance(E, 0.1, &mut out);
            assert!(!auras.is_broadcasting());
            assert_eq!(out.len(), 1);
        }

        #[test]
        fn clear_all_counts() {
            let mut auras = AuraState::new();
            auras.start(AuraKind::Armor, 5.0, 0.3, 10.0, 0.1);
            auras.start(AuraKind::Critical, 5.0, 0.1, 10.0, 0.1);
            let mut out = Vec::new();
            assert_eq!(auras.clear_all(E, &mut out), 2);
            assert_eq!(out.len(), 2);
            assert_eq!(auras.active_broadcasts().count(), 0);
        }

        #[test]
        fn active_broadcasts_in_kind_order() {
            let mut auras = AuraState::new();
            auras.start(AuraKind::Critical, 5.0, 0.1, 10.0, 0.1);
            auras.start(AuraKind::AttackSpeed, 5.0, 0.1, 10.0, 0.1);
            let kinds: Vec<_> = auras.active_broadcasts().map(|(k, _)| k).collect();
            assert_eq!(kinds, vec![AuraKind::AttackSpeed, AuraKind::Critical]);
        }
    }
}
