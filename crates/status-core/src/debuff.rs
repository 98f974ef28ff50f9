//! Per-entity debuff state machine.
//!
//! A [`DebuffTable`] holds one [`DebuffInstance`] per [`DebuffKind`]. Each
//! slot runs its own timer:
//!
//! - **Apply** overwrites duration and magnitude (never stacks). A fresh DoT
//!   schedules its first tick just after `now`; a refresh keeps the existing
//!   schedule so it neither double-ticks nor delays. A fresh Freeze snapshots
//!   the entity's movement speed and slows it once.
//! - **Advance** (once per fixed step) fires due DoT ticks, pins
//!   movement-locked entities, counts durations down and expires slots.
//! - **Clear** zeroes every live slot at once.
//!
//! Slots are always visited in [`DebuffKind::ALL`] order, so the events a
//! step produces come out in a fixed order.
//!
//! The table never calls the event bus itself; it pushes [`StatusEvent`]s into
//! a caller-provided outbox.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::StatusConfig;
use crate::effect::{duration_steps, ActiveDebuffs, DebuffInstance, DebuffKind};
use crate::entity::EntityId;
use crate::events::StatusEvent;
use crate::world::{hp_fraction, EntityPhysics};

/// Whether an application started a slot or refreshed a live one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Application {
    /// The slot was inactive.
    Fresh,
    /// The slot was already live and has been overwritten.
    Refresh,
}

/// The eight debuff slots of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebuffTable {
    slots: [DebuffInstance; DebuffKind::COUNT],
    /// Movement speed captured when Freeze started.
    frozen_base_speed: Option<f32>,
}

impl DebuffTable {
    /// Creates a table with every slot inactive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `kind`.
    #[must_use]
    pub fn get(&self, kind: DebuffKind) -> &DebuffInstance {
        &self.slots[kind.index()]
    }

    /// Returns `true` if `kind` is live.
    #[must_use]
    pub fn is_active(&self, kind: DebuffKind) -> bool {
        self.slots[kind.index()].active
    }

    /// The set of live kinds.
    #[must_use]
    pub fn active_flags(&self) -> ActiveDebuffs {
        DebuffKind::ALL
            .iter()
            .filter(|kind| self.is_active(**kind))
            .fold(ActiveDebuffs::empty(), |acc, kind| acc | kind.flag())
    }

    /// Number of live slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    /// Returns `true` while Freeze or Stun is live.
    #[must_use]
    pub fn is_movement_locked(&self) -> bool {
        self.active_flags().intersects(ActiveDebuffs::MOVEMENT_LOCK)
    }

    /// Reduction fraction of a reduction kind, 0 when inactive.
    #[must_use]
    pub fn reduction(&self, kind: DebuffKind) -> f32 {
        let slot = self.get(kind);
        if kind.is_reduction() && slot.active {
            slot.magnitude
        } else {
            0.0
        }
    }

    /// Movement speed to restore when Freeze ends, if frozen.
    #[must_use]
    pub fn frozen_base_speed(&self) -> Option<f32> {
        self.frozen_base_speed
    }

    /// Writes an already-mitigated application into the `kind` slot.
    #[allow(clippy::too_many_arguments)]
    pub fn apply<P>(
        &mut self,
        entity: EntityId,
        kind: DebuffKind,
        duration: f32,
        magnitude: f32,
        now: f64,
        config: &StatusConfig,
        physics: &mut P,
        out: &mut Vec<StatusEvent>,
    ) -> Application
    where
        P: EntityPhysics + ?Sized,
    {
        let slot = &mut self.slots[kind.index()];
        let application = if slot.active {
            Application::Refresh
        } else {
            Application::Fresh
        };

        slot.active = true;
        slot.remaining_duration = duration;
        slot.remaining_steps = duration_steps(duration, config.dt);
        slot.magnitude = magnitude;

        if application == Application::Fresh {
            if kind.is_damage_over_time() {
                slot.next_tick_time = now + f64::from(config.first_tick_delay);
            }
            if kind == DebuffKind::Freeze {
                let base = physics.current_move_speed(entity);
                self.frozen_base_speed = Some(base);
                physics.set_move_speed(entity, base * config.freeze_speed_multiplier);
            }
        }

        debug!(%entity, %kind, duration, magnitude, ?application, "debuff applied");
        out.push(StatusEvent::StatusEffectChanged {
            entity,
            kind,
            active: true,
        });
        application
    }

    /// Runs one fixed step for every live slot.
    pub fn advance<P>(
        &mut self,
        entity: EntityId,
        now: f64,
        dt: f32,
        config: &StatusConfig,
        physics: &mut P,
        out: &mut Vec<StatusEvent>,
    ) where
        P: EntityPhysics + ?Sized,
    {
        for kind in DebuffKind::ALL {
            if !self.slots[kind.index()].active {
                continue;
            }

            if let (Some(interval), Some(class)) = (config.tick_interval(kind), kind.damage_class())
            {
                let slot = &mut self.slots[kind.index()];
                if now >= slot.next_tick_time {
                    let amount = tick_damage(kind, slot.magnitude, entity, config, &*physics);
                    slot.next_tick_time += f64::from(interval);
                    trace!(%entity, %kind, amount, "status tick");
                    out.push(StatusEvent::StatusDamage {
                        entity,
                        amount,
                        class,
                    });
                    out.push(StatusEvent::StatusDamageFlash { entity, kind });
                }
            }

            if kind.locks_movement() {
                physics.zero_velocity(entity);
            }

            let slot = &mut self.slots[kind.index()];
            slot.remaining_duration = (slot.remaining_duration - dt).max(0.0);
            slot.remaining_steps = slot.remaining_steps.saturating_sub(1);
            if slot.remaining_steps == 0 {
                debug!(%entity, %kind, "debuff expired");
                self.remove(entity, kind, physics, out);
            }
        }
    }

    /// Clears every live slot, returning how many were removed.
    pub fn clear_all<P>(
        &mut self,
        entity: EntityId,
        physics: &mut P,
        out: &mut Vec<StatusEvent>,
    ) -> usize
    where
        P: EntityPhysics + ?Sized,
    {
        let mut removed = 0;
        for kind in DebuffKind::ALL {
            if self.is_active(kind) {
                self.remove(entity, kind, physics, out);
                removed += 1;
            }
        }
        removed
    }

    /// Hands the speed captured by Freeze back to `physics`, without events.
    ///
    /// The Freeze slot itself is left as is.
    pub fn release_freeze<P>(&mut self, entity: EntityId, physics: &mut P)
    where
        P: EntityPhysics + ?Sized,
    {
        if let Some(base) = self.frozen_base_speed.take() {
            physics.set_move_speed(entity, base);
        }
    }

    fn remove<P>(
        &mut self,
        entity: EntityId,
        kind: DebuffKind,
        physics: &mut P,
        out: &mut Vec<StatusEvent>,
    ) where
        P: EntityPhysics + ?Sized,
    {
        self.slots[kind.index()].clear();
        if kind == DebuffKind::Freeze {
            self.release_freeze(entity, physics);
        }
        out.push(StatusEvent::StatusEffectChanged {
            entity,
            kind,
            active: false,
        });
    }
}

/// Damage dealt by one tick of a DoT slot.
///
/// Bleed scales with missing health; the others deal their magnitude.
fn tick_damage<P>(
    kind: DebuffKind,
    magnitude: f32,
    entity: EntityId,
    config: &StatusConfig,
    physics: &P,
) -> i32
where
    P: EntityPhysics + ?Sized,
{
    let scaled = if kind == DebuffKind::Bleed {
        magnitude * config.bleed_multiplier(hp_fraction(physics, entity))
    } else {
        magnitude
    };
    #[allow(clippy::cast_possible_truncation)]
    let amount = scaled.round().max(config.min_tick_damage) as i32;
    amount
}
