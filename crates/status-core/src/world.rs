//! Collaborator interfaces consumed by the status core.
//!
//! The core never stores HP, movement, gear or positions itself. It reads and
//! writes them through the traits below, which the embedding game implements
//! on top of its own entity/physics layer. [`Arena`](crate::arena::Arena) is
//! an in-memory implementation used by tests and benchmarks.
//!
//! All query methods take `&self`; the two physics writes
//! ([`EntityPhysics::set_move_speed`], [`EntityPhysics::zero_velocity`]) take
//! `&mut self` and are only ever issued for entities the local participant
//! owns.

use glam::Vec2;

use crate::entity::{EntityId, ParticipantId};

/// Gear-derived resistance queries.
pub trait ResistanceProvider {
    /// Magical resistance in percentage points.
    fn magical_resistance(&self, entity: EntityId) -> f32;

    /// Physical resistance in percentage points.
    fn physical_resistance(&self, entity: EntityId) -> f32;
}

/// Spatial queries used by aura aggregation.
pub trait SpatialQuery {
    /// Returns the entity's world position, if it has one.
    fn position(&self, entity: EntityId) -> Option<Vec2>;

    /// Returns the entities within `radius` of `center`.
    ///
    /// Implementations should return ids in ascending order; the aggregator
    /// does not depend on it for correctness since max is order-independent.
    fn query_entities_in_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId>;
}

/// Entity vitals and movement.
pub trait EntityPhysics {
    /// Current hit points.
    fn current_hp(&self, entity: EntityId) -> i32;

    /// Maximum hit points.
    fn max_hp(&self, entity: EntityId) -> i32;

    /// Current movement speed in m/s.
    fn current_move_speed(&self, entity: EntityId) -> f32;

    /// Overwrites the movement speed.
    fn set_move_speed(&mut self, entity: EntityId, speed: f32);

    /// Stops the entity in place.
    fn zero_velocity(&mut self, entity: EntityId);
}

/// State-authority designation provided by the network substrate.
pub trait AuthorityOracle {
    /// Returns `true` if `caller` may mutate `entity`'s canonical state.
    fn is_authoritative_owner(&self, entity: EntityId, caller: ParticipantId) -> bool;
}

/// Everything a [`StatusSimulation`](crate::simulation::StatusSimulation)
/// needs from its host world.
///
/// Blanket-implemented for any type providing all four collaborator traits.
pub trait StatusWorld: ResistanceProvider + SpatialQuery + EntityPhysics + AuthorityOracle {}

impl<T> StatusWorld for T where T: ResistanceProvider + SpatialQuery + EntityPhysics + AuthorityOracle {}

/// Current HP as a fraction of max HP, clamped to `[0, 1]`.
///
/// An entity with a non-positive max HP reports 1.0 (treated as unhurt).
#[must_use]
pub fn hp_fraction<P: EntityPhysics + ?Sized>(physics: &P, entity: EntityId) -> f32 {
    let max = physics.max_hp(entity);
    if max <= 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let fraction = physics.current_hp(entity) as f32 / max as f32;
    fraction.clamp(0.0, 1.0)
}
