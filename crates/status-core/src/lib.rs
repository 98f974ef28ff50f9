//! # Status Core
//!
//! Networked status-effect and aura simulation.
//!
//! Every entity carries eight timed debuffs and up to six broadcast auras.
//! State is written only by the entity's authoritative owner; everybody else
//! holds a read-only mirror fed by replication snapshots.
//!
//! - **Debuffs**: damage over time (Poison, Burn, Bleed), movement locks
//!   (Freeze, Stun) and reduction fractions (ArmorBreak, Blind, Weakness).
//!   Reapplication overwrites, never stacks.
//! - **Mitigation**: gear resistance can negate an application outright or
//!   shorten and weaken it.
//! - **Auras**: team buffs radiated to everybody within the provider's
//!   radius. Receivers take the strongest bonus per kind, recomputed on a
//!   slower cadence than the simulation step.
//! - **Events**: tick damage, effect changes, hit flashes and aura expiry
//!   leave the core through an observer bus. Observers cannot write back.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec2;
//! use status_core::{
//!     Arena, BodyState, EventKind, EventLog, Owner, ParticipantId, StatusSimulation,
//! };
//!
//! let host = ParticipantId::HOST;
//! let mut arena = Arena::new();
//! let paladin = arena.spawn(BodyState::at_position(host, Vec2::ZERO));
//! let squire = arena.spawn(BodyState::at_position(host, Vec2::new(3.0, 0.0)));
//!
//! let mut sim = StatusSimulation::new(host, 7);
//! sim.insert_entity(paladin);
//! sim.insert_entity(squire);
//!
//! let damage = Arc::new(EventLog::for_kinds(&[EventKind::StatusDamage]));
//! sim.subscribe(damage.clone());
//!
//! let paladin_owner = Owner::claim(&arena, paladin, host).expect("host owns");
//! let squire_owner = Owner::claim(&arena, squire, host).expect("host owns");
//! sim.broadcast_protection(&arena, &paladin_owner, 5.0, 0.2, 10.0);
//! sim.apply_burn(&mut arena, &squire_owner, 4.0, 2.0);
//!
//! // One second at 60 Hz: two aggregation passes, two burn ticks.
//! for _ in 0..60 {
//!     sim.step(&mut arena);
//! }
//!
//! assert!((sim.total_damage_reduction(squire) - 0.2).abs() < 1e-6);
//! assert_eq!(damage.event_count(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod arena;
pub mod aura;
pub mod config;
pub mod debuff;
pub mod effect;
pub mod entity;
pub mod error;
pub mod events;
pub mod mitigation;
pub mod replication;
pub mod simulation;
pub mod world;

// Re-exports for convenience
pub use aggregator::{AuraAggregator, ProviderTable};
pub use arena::{Arena, SpatialIndex};
pub use aura::{AuraBonuses, AuraState};
pub use config::StatusConfig;
pub use debuff::{Application, DebuffTable};
pub use effect::{
    ActiveDebuffs, AuraBroadcast, AuraKind, DamageClass, DebuffInstance, DebuffKind,
    ResistanceClass,
};
pub use entity::{BodyState, EntityId, Owner, ParticipantId, Resistances};
pub use error::ConfigError;
pub use events::{EventBus, EventEnvelope, EventKind, EventLog, StatusEvent, StatusObserver};
pub use mitigation::{MagnitudeScale, Mitigation, Mitigator};
pub use replication::{ReplicationOutcome, StatusSnapshot};
pub use simulation::{ApplyOutcome, SimClock, StatusSimulation};
pub use world::{AuthorityOracle, EntityPhysics, ResistanceProvider, SpatialQuery, StatusWorld};

#[cfg(test)]
mod tests;
