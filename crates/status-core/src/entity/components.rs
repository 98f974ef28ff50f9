//! Body components backing the in-memory [`Arena`](crate::arena::Arena).
//!
//! The status core itself never owns these values: HP, movement and gear
//! resistances belong to external systems. The structs here are the minimal
//! state a reference world needs to answer the collaborator queries in
//! [`crate::world`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ParticipantId;

/// Gear-derived resistances, in percentage points (0 = none, 100 = full).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Resistances {
    /// Resistance against magical afflictions (poison, burn, bleed, freeze).
    pub magical: f32,
    /// Resistance against physical afflictions (stun, armor break, blind, weakness).
    pub physical: f32,
}

impl Resistances {
    /// Creates a resistance pair.
    #[must_use]
    pub const fn new(magical: f32, physical: f32) -> Self {
        Self { magical, physical }
    }
}

/// Everything the reference world tracks about one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    /// Participant holding state authority over this entity.
    pub owner: ParticipantId,
    /// Position in world space (meters).
    pub position: Vec2,
    /// Current velocity (m/s).
    pub velocity: Vec2,
    /// Current movement speed (m/s), as modified by status effects.
    pub move_speed: f32,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Gear-derived resistances.
    pub resistances: Resistances,
}

impl BodyState {
    /// Creates a body at `position` with 100 HP, 5 m/s speed and no resistances.
    #[must_use]
    pub fn at_position(owner: ParticipantId, position: Vec2) -> Self {
        Self {
            owner,
            position,
            velocity: Vec2::ZERO,
            move_speed: 5.0,
            hp: 100,
            max_hp: 100,
            resistances: Resistances::default(),
        }
    }

    /// Returns this body with the given resistances.
    #[must_use]
    pub fn with_resistances(mut self, resistances: Resistances) -> Self {
        self.resistances = resistances;
        self
    }

    /// Returns this body with the given HP values.
    #[must_use]
    pub fn with_hp(mut self, hp: i32, max_hp: i32) -> Self {
        self.hp = hp;
        self.max_hp = max_hp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_position_defaults() {
        let body = BodyState::at_position(ParticipantId::HOST, Vec2::new(1.0, 2.0));
        assert_eq!(body.position, Vec2::new(1.0, 2.0));
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.hp, body.max_hp);
        assert_eq!(body.resistances, Resistances::default());
    }

    #[test]
    fn builders_override_fields() {
        let body = BodyState::at_position(ParticipantId::HOST, Vec2::ZERO)
            .with_resistances(Resistances::new(40.0, 10.0))
            .with_hp(25, 200);
        assert!((body.resistances.magical - 40.0).abs() < f32::EPSILON);
        assert_eq!(body.hp, 25);
        assert_eq!(body.max_hp, 200);
    }

    #[test]
    fn body_is_serializable() {
        let body = BodyState::at_position(ParticipantId::new(3), Vec2::new(4.0, -1.0));
        let json = serde_json::to_string(&body).unwrap();
        let back: BodyState = serde_json::from_str(&json).unwrap();
        assert_eq!(body, back);
    }
}
