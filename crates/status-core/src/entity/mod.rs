//! Entity identity and ownership types.
//!
//! This module provides the identity types shared by every part of the core:
//! - [`EntityId`]: Unique identifier for a simulated entity
//! - [`ParticipantId`]: Identifier for a simulation participant (peer or host)
//! - [`Owner`]: Capability token proving authority over one entity
//!
//! # Authority
//!
//! Every entity has exactly one authoritative owner. Only the owner may
//! mutate the entity's status state; everybody else holds a read-only mirror.
//! Mutating calls on [`StatusSimulation`](crate::simulation::StatusSimulation)
//! take an [`Owner`] token, which can only be obtained through
//! [`Owner::claim`] against an [`AuthorityOracle`].
//!
//! # Example
//!
//! ```
//! use status_core::entity::{EntityId, Owner, ParticipantId};
//! use status_core::world::AuthorityOracle;
//!
//! struct HostOwnsEverything;
//!
//! impl AuthorityOracle for HostOwnsEverything {
//!     fn is_authoritative_owner(&self, _entity: EntityId, caller: ParticipantId) -> bool {
//!         caller == ParticipantId::HOST
//!     }
//! }
//!
//! let owner = Owner::claim(&HostOwnsEverything, EntityId::new(7), ParticipantId::HOST);
//! assert!(owner.is_some());
//!
//! let peer = Owner::claim(&HostOwnsEverything, EntityId::new(7), ParticipantId::new(3));
//! assert!(peer.is_none());
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::world::AuthorityOracle;

pub use components::{BodyState, Resistances};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Entity IDs are ordered by
/// their numeric value, which is used to give every per-step pass a
/// deterministic iteration order.
///
/// # Example
///
/// ```
/// use status_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Identifier for a participant in a networked session.
///
/// Participant 0 is conventionally the host, which owns server-side entities
/// (monsters, summons, environmental hazards).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// The session host.
    pub const HOST: Self = Self(0);

    /// Creates a new participant identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant:{}", self.0)
    }
}

/// Capability token for mutating one entity's status state.
///
/// A token names the entity it grants authority over and the participant
/// that claimed it. Tokens can go stale when ownership migrates, so the
/// simulation re-checks authority every time a token is used; a stale token
/// turns the call into a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
    entity: EntityId,
    participant: ParticipantId,
}

impl Owner {
    /// Claims authority over `entity` for `participant`.
    ///
    /// Returns `None` if the oracle does not recognise `participant` as the
    /// entity's authoritative owner.
    #[must_use]
    pub fn claim<A>(authority: &A, entity: EntityId, participant: ParticipantId) -> Option<Self>
    where
        A: AuthorityOracle + ?Sized,
    {
        authority
            .is_authoritative_owner(entity, participant)
            .then_some(Self {
                entity,
                participant,
            })
    }

    /// Returns the entity this token grants authority over.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Returns the participant that claimed this token.
    #[must_use]
    pub const fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Returns `true` if the token is still honoured by `authority`.
    #[must_use]
    pub fn is_valid<A>(&self, authority: &A) -> bool
    where
        A: AuthorityOracle + ?Sized,
    {
        authority.is_authoritative_owner(self.entity, self.participant)
    }
}
