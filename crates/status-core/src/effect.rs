//! Effect kinds and per-kind instance state.
//!
//! Debuffs and auras are stored as fixed arrays indexed by their kind enum,
//! so every entity carries exactly one slot per kind. A slot is either live
//! (`active == true`) or fully zeroed.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Debuff kinds
// =============================================================================

/// Which resistance stat mitigates a debuff.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResistanceClass {
    /// Mitigated by magical resistance.
    Magical,
    /// Mitigated by physical resistance.
    Physical,
}

/// Damage class attached to status tick damage, for the combat resolver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageClass {
    /// Toxin damage (poison).
    Poison,
    /// Fire damage (burn).
    Fire,
    /// Physical wound damage (bleed).
    Bleed,
}

/// The eight debuffs an entity can carry.
///
/// Declaration order is the processing order within a simulation step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DebuffKind {
    /// Damage over time, ticks every second.
    Poison,
    /// Damage over time, ticks every half second.
    Burn,
    /// Damage over time that hits harder at low health.
    Bleed,
    /// Slows movement and pins the entity in place.
    Freeze,
    /// Pins the entity in place.
    Stun,
    /// Reduces armor by a fraction.
    ArmorBreak,
    /// Reduces accuracy by a fraction.
    Blind,
    /// Reduces outgoing damage by a fraction.
    Weakness,
}

impl DebuffKind {
    /// Number of debuff kinds.
    pub const COUNT: usize = 8;

    /// All kinds in processing order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Poison,
        Self::Burn,
        Self::Bleed,
        Self::Freeze,
        Self::Stun,
        Self::ArmorBreak,
        Self::Blind,
        Self::Weakness,
    ];

    /// Slot index of this kind.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for Poison, Burn and Bleed.
    #[must_use]
    pub const fn is_damage_over_time(self) -> bool {
        matches!(self, Self::Poison | Self::Burn | Self::Bleed)
    }

    /// Returns `true` for Freeze and Stun.
    #[must_use]
    pub const fn locks_movement(self) -> bool {
        matches!(self, Self::Freeze | Self::Stun)
    }

    /// Returns `true` for kinds whose magnitude is a reduction fraction.
    #[must_use]
    pub const fn is_reduction(self) -> bool {
        matches!(self, Self::ArmorBreak | Self::Blind | Self::Weakness)
    }

    /// The resistance stat used to mitigate this kind.
    #[must_use]
    pub const fn resistance_class(self) -> ResistanceClass {
        match self {
            Self::Poison | Self::Burn | Self::Bleed | Self::Freeze => ResistanceClass::Magical,
            Self::Stun | Self::ArmorBreak | Self::Blind | Self::Weakness => {
                ResistanceClass::Physical
            }
        }
    }

    /// Damage class of this kind's ticks, `None` for non-DoT kinds.
    #[must_use]
    pub const fn damage_class(self) -> Option<DamageClass> {
        match self {
            Self::Poison => Some(DamageClass::Poison),
            Self::Burn => Some(DamageClass::Fire),
            Self::Bleed => Some(DamageClass::Bleed),
            _ => None,
        }
    }

    /// The summary flag for this kind.
    #[must_use]
    pub const fn flag(self) -> ActiveDebuffs {
        match self {
            Self::Poison => ActiveDebuffs::POISON,
            Self::Burn => ActiveDebuffs::BURN,
            Self::Bleed => ActiveDebuffs::BLEED,
            Self::Freeze => ActiveDebuffs::FREEZE,
            Self::Stun => ActiveDebuffs::STUN,
            Self::ArmorBreak => ActiveDebuffs::ARMOR_BREAK,
            Self::Blind => ActiveDebuffs::BLIND,
            Self::Weakness => ActiveDebuffs::WEAKNESS,
        }
    }
}

impl fmt::Display for DebuffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Poison => "Poison",
            Self::Burn => "Burn",
            Self::Bleed => "Bleed",
            Self::Freeze => "Freeze",
            Self::Stun => "Stun",
            Self::ArmorBreak => "ArmorBreak",
            Self::Blind => "Blind",
            Self::Weakness => "Weakness",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Compact set of active debuff kinds, carried in replication snapshots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ActiveDebuffs: u8 {
        /// Poison is active.
        const POISON = 1 << 0;
        /// Burn is active.
        const BURN = 1 << 1;
        /// Bleed is active.
        const BLEED = 1 << 2;
        /// Freeze is active.
        const FREEZE = 1 << 3;
        /// Stun is active.
        const STUN = 1 << 4;
        /// Armor break is active.
        const ARMOR_BREAK = 1 << 5;
        /// Blind is active.
        const BLIND = 1 << 6;
        /// Weakness is active.
        const WEAKNESS = 1 << 7;
        /// Any movement-locking debuff.
        const MOVEMENT_LOCK = Self::FREEZE.bits() | Self::STUN.bits();
    }
}

// =============================================================================
// Aura kinds
// =============================================================================

/// The six team buffs an entity can broadcast.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuraKind {
    /// Attack speed bonus.
    AttackSpeed,
    /// Outgoing damage bonus.
    Damage,
    /// Movement speed bonus.
    MoveSpeed,
    /// Flat incoming damage reduction.
    Protection,
    /// Armor bonus.
    Armor,
    /// Critical chance bonus.
    Critical,
}

impl AuraKind {
    /// Number of aura kinds.
    pub const COUNT: usize = 6;

    /// All kinds in processing order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::AttackSpeed,
        Self::Damage,
        Self::MoveSpeed,
        Self::Protection,
        Self::Armor,
        Self::Critical,
    ];

    /// Slot index of this kind.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AuraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AttackSpeed => "AttackSpeed",
            Self::Damage => "Damage",
            Self::MoveSpeed => "MoveSpeed",
            Self::Protection => "Protection",
            Self::Armor => "Armor",
            Self::Critical => "Critical",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Instances
// =============================================================================

/// How far past a whole step count, in steps, a duration may land and
/// still count as aligned. Covers the error in representing `dt` as `f32`.
const STEP_ALIGNMENT_TOLERANCE: f64 = 1e-4;

/// Number of fixed steps a `duration` lasts at timestep `dt`: `ceil(duration / dt)`,
/// never less than one.
#[must_use]
pub fn duration_steps(duration: f32, dt: f32) -> u32 {
    let steps = (f64::from(duration) / f64::from(dt) - STEP_ALIGNMENT_TOLERANCE)
        .ceil()
        .max(1.0);
    if steps >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = steps as u32;
    steps
}

/// One debuff slot.
///
/// `magnitude` is damage per tick for DoT kinds (a whole number), or a
/// reduction fraction in `[0, 1]` for reduction kinds. `next_tick_time` is
/// only meaningful for DoT kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DebuffInstance {
    /// Whether the slot is live.
    pub active: bool,
    /// Seconds left before expiry.
    pub remaining_duration: f32,
    /// Steps left before expiry. Expiry is decided on this count.
    #[serde(default)]
    pub remaining_steps: u32,
    /// Damage per tick, or reduction fraction.
    pub magnitude: f32,
    /// Simulation time of the next damage tick.
    pub next_tick_time: f64,
}

impl DebuffInstance {
    /// Zeroes the slot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One aura the entity is broadcasting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AuraBroadcast {
    /// Whether the aura is live.
    pub active: bool,
    /// Reach of the aura (meters).
    pub radius: f32,
    /// Bonus granted to receivers, as a fraction.
    pub magnitude: f32,
    /// Seconds left before expiry.
    pub remaining_duration: f32,
    /// Steps left before expiry. Expiry is decided on this count.
    #[serde(default)]
    pub remaining_steps: u32,
}

impl AuraBroadcast {
    /// Zeroes the slot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
