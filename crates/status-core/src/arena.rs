//! In-memory host world.
//!
//! [`Arena`] stores a [`BodyState`] per entity and implements every
//! collaborator trait the status core consumes, so a simulation can run
//! without a game engine attached. Tests, benchmarks and small embedders use
//! it directly.
//!
//! # Spatial Index Synchronization
//!
//! The spatial index is not synchronized automatically when a body's
//! position changes through [`Arena::get_mut`]. Call
//! [`Arena::update_spatial`] afterwards, or use [`Arena::set_position`]
//! which does both. Spawning and despawning keep the index in sync.
//!
//! # Example
//!
//! ```
//! use status_core::arena::Arena;
//! use status_core::entity::{BodyState, ParticipantId};
//! use status_core::world::SpatialQuery;
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let a = arena.spawn(BodyState::at_position(ParticipantId::HOST, Vec2::ZERO));
//! let b = arena.spawn(BodyState::at_position(ParticipantId::HOST, Vec2::new(3.0, 4.0)));
//!
//! assert_eq!(arena.query_entities_in_radius(Vec2::ZERO, 5.0), vec![a, b]);
//! assert_eq!(arena.query_entities_in_radius(Vec2::ZERO, 4.9), vec![a]);
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{BodyState, EntityId, ParticipantId};
use crate::world::{AuthorityOracle, EntityPhysics, ResistanceProvider, SpatialQuery};

// =============================================================================
// Spatial Index
// =============================================================================

/// Brute-force position index for radius queries.
///
/// A full scan per query is fine at the sizes aura aggregation runs at; the
/// aggregation cadence bounds the total cost.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    positions: HashMap<EntityId, Vec2>,
}

impl SpatialIndex {
    /// Creates a new empty spatial index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates an entity's position.
    pub fn insert(&mut self, id: EntityId, pos: Vec2) {
        self.positions.insert(id, pos);
    }

    /// Removes an entity from the index.
    pub fn remove(&mut self, id: EntityId) {
        self.positions.remove(&id);
    }

    /// Returns the position of an entity, if indexed.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Entities within `radius` of `center` (inclusive), sorted by id.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let mut results: Vec<EntityId> = self
            .positions
            .iter()
            .filter(|(_, pos)| center.distance_squared(**pos) <= radius_sq)
            .map(|(id, _)| *id)
            .collect();

        // HashMap order is arbitrary
        results.sort();
        results
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Bodies keyed by id, with a spatial index and ownership table.
///
/// Iteration is always in ascending id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    next_id: u64,
    bodies: BTreeMap<EntityId, BodyState>,
    spatial: SpatialIndex,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body and returns its freshly assigned id.
    pub fn spawn(&mut self, body: BodyState) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.spatial.insert(id, body.position);
        self.bodies.insert(id, body);
        id
    }

    /// Removes a body, returning it if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<BodyState> {
        self.spatial.remove(id);
        self.bodies.remove(&id)
    }

    /// Returns a body by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&BodyState> {
        self.bodies.get(&id)
    }

    /// Returns a body by id for mutation.
    ///
    /// Call [`Arena::update_spatial`] after moving it.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut BodyState> {
        self.bodies.get_mut(&id)
    }

    /// Moves a body and re-indexes it. Returns `false` for unknown ids.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        body.position = position;
        self.spatial.insert(id, position);
        true
    }

    /// Re-reads a body's position into the spatial index.
    pub fn update_spatial(&mut self, id: EntityId) {
        if let Some(body) = self.bodies.get(&id) {
            self.spatial.insert(id, body.position);
        }
    }

    /// Hands authority over a body to another participant.
    ///
    /// Returns `false` for unknown ids.
    pub fn transfer_ownership(&mut self, id: EntityId, owner: ParticipantId) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) => {
                body.owner = owner;
                true
            }
            None => false,
        }
    }

    /// Body ids in ascending order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.bodies.keys().copied()
    }

    /// Number of bodies.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if the arena holds no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// The spatial index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }
}

impl ResistanceProvider for Arena {
    fn magical_resistance(&self, entity: EntityId) -> f32 {
        self.get(entity).map_or(0.0, |b| b.resistances.magical)
    }

    fn physical_resistance(&self, entity: EntityId) -> f32 {
        self.get(entity).map_or(0.0, |b| b.resistances.physical)
    }
}

impl SpatialQuery for Arena {
    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.spatial.get(entity)
    }

    fn query_entities_in_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.spatial.query_radius(center, radius)
    }
}

impl EntityPhysics for Arena {
    fn current_hp(&self, entity: EntityId) -> i32 {
        self.get(entity).map_or(0, |b| b.hp)
    }

    fn max_hp(&self, entity: EntityId) -> i32 {
        self.get(entity).map_or(0, |b| b.max_hp)
    }

    fn current_move_speed(&self, entity: EntityId) -> f32 {
        self.get(entity).map_or(0.0, |b| b.move_speed)
    }

    fn set_move_speed(&mut self, entity: EntityId, speed: f32) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.move_speed = speed;
        }
    }

    fn zero_velocity(&mut self, entity: EntityId) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.velocity = Vec2::ZERO;
        }
    }
}

impl AuthorityOracle for Arena {
    fn is_authoritative_owner(&self, entity: EntityId, caller: ParticipantId) -> bool {
        self.get(entity).is_some_and(|b| b.owner == caller)
    }
}

// =============================================================================
// Tests
// =============================================================================
