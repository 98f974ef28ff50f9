//! The status simulation for one participant.
//!
//! `StatusSimulation` owns every tracked entity's debuff table and aura state
//! and drives them on a fixed timestep:
//!
//! 1. **CLOCK**: advance the tick; `now = tick * dt`
//! 2. **ADVANCE**: for each locally-owned entity in id order, run the debuff
//!    state machine then count broadcasts down
//! 3. **AGGREGATE**: when the cadence is due, recompute received aura bonuses
//!    for owned entities from a frozen view of every provider
//! 4. **PUBLISH**: deliver the step's events to observers, in order
//!
//! # Authority
//!
//! Mutations take an [`Owner`] token and are re-checked against the world's
//! [`AuthorityOracle`] at call time. A token for the wrong participant, or
//! one gone stale after an ownership change, turns the call into a silent
//! no-op ([`ApplyOutcome::Unauthorized`]). Entities owned elsewhere are
//! read-only mirrors, updated through [`StatusSimulation::apply_replicated`].
//!
//! # Determinism
//!
//! Mitigation draws come from a `ChaCha8Rng` seeded with the master seed,
//! entities live in a `BTreeMap`, and every per-entity pass walks kinds in a
//! fixed order. The same seed and the same calls produce the same events.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use status_core::arena::Arena;
//! use status_core::effect::DebuffKind;
//! use status_core::entity::{BodyState, Owner, ParticipantId};
//! use status_core::simulation::{ApplyOutcome, StatusSimulation};
//!
//! let host = ParticipantId::HOST;
//! let mut arena = Arena::new();
//! let goblin = arena.spawn(BodyState::at_position(host, Vec2::ZERO));
//!
//! let mut sim = StatusSimulation::new(host, 42);
//! sim.insert_entity(goblin);
//!
//! let owner = Owner::claim(&arena, goblin, host).expect("host owns the goblin");
//! assert_eq!(sim.apply_stun(&mut arena, &owner, 0.0, 2.0), ApplyOutcome::Applied);
//! assert!(sim.has_effect(goblin, DebuffKind::Stun));
//!
//! for _ in 0..150 {
//!     sim.step(&mut arena);
//! }
//! assert!(!sim.has_effect(goblin, DebuffKind::Stun));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregator::{AuraAggregator, ProviderTable};
use crate::aura::{AuraBonuses, AuraState};
use crate::config::StatusConfig;
use crate::debuff::{Application, DebuffTable};
use crate::effect::{
    ActiveDebuffs, AuraBroadcast, AuraKind, DebuffInstance, DebuffKind, ResistanceClass,
};
use crate::entity::{EntityId, Owner, ParticipantId};
use crate::error::ConfigError;
use crate::events::{EventBus, StatusEvent, StatusObserver};
use crate::mitigation::{MagnitudeScale, Mitigation, Mitigator};
use crate::replication::{ReplicationOutcome, StatusSnapshot};
use crate::world::{AuthorityOracle, EntityPhysics, SpatialQuery, StatusWorld};

// =============================================================================
// Clock
// =============================================================================

/// Fixed-step simulation clock.
///
/// Time is derived from the tick count rather than accumulated, so it does
/// not drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    tick: u64,
    dt: f32,
}

impl SimClock {
    /// Creates a clock at tick 0.
    #[must_use]
    pub const fn new(dt: f32) -> Self {
        Self { tick: 0, dt }
    }

    /// Steps taken so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds per step.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Simulation time in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn now(&self) -> f64 {
        self.tick as f64 * f64::from(self.dt)
    }

    /// Moves to the next tick.
    pub fn advance(&mut self) {
        self.tick += 1;
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of an apply or broadcast call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new effect started.
    Applied,
    /// A live effect was overwritten.
    Refreshed,
    /// Mitigation negated the application.
    Resisted,
    /// The caller does not hold authority; nothing changed.
    Unauthorized,
    /// The entity is not tracked by this simulation.
    UnknownEntity,
}

impl ApplyOutcome {
    /// Returns `true` if the effect is now live.
    #[must_use]
    pub const fn took_effect(self) -> bool {
        matches!(self, Self::Applied | Self::Refreshed)
    }
}

impl From<Application> for ApplyOutcome {
    fn from(application: Application) -> Self {
        match application {
            Application::Fresh => Self::Applied,
            Application::Refresh => Self::Refreshed,
        }
    }
}

// =============================================================================
// Simulation
// =============================================================================

#[derive(Debug, Clone, Default)]
struct EntityStatus {
    debuffs: DebuffTable,
    auras: AuraState,
    /// Tick of the last snapshot installed, for mirrors.
    replicated_tick: Option<u64>,
}

/// Status-effect and aura state for every tracked entity, as seen by one
/// participant.
#[derive(Debug)]
pub struct StatusSimulation {
    local: ParticipantId,
    config: StatusConfig,
    mitigator: Mitigator,
    clock: SimClock,
    entities: BTreeMap<EntityId, EntityStatus>,
    aggregator: AuraAggregator,
    bus: EventBus,
    rng: ChaCha8Rng,
    master_seed: u64,
}

impl StatusSimulation {
    /// Creates a simulation with the default configuration.
    ///
    /// # Arguments
    ///
    /// * `local` - The participant this simulation runs for
    /// * `seed` - Master seed for mitigation draws
    #[must_use]
    pub fn new(local: ParticipantId, seed: u64) -> Self {
        Self::build(local, StatusConfig::default(), seed)
    }

    /// Creates a simulation with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns the first configuration field found out of range.
    pub fn with_config(
        local: ParticipantId,
        config: StatusConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(local, config, seed))
    }

    fn build(local: ParticipantId, config: StatusConfig, seed: u64) -> Self {
        Self {
            local,
            mitigator: Mitigator::from_config(&config),
            clock: SimClock::new(config.dt),
            entities: BTreeMap::new(),
            aggregator: AuraAggregator::from_config(&config),
            bus: EventBus::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            master_seed: seed,
            config,
        }
    }

    // -------------------------------------------------------------------------
    // Entities and observers
    // -------------------------------------------------------------------------

    /// Starts tracking `entity`. Returns `false` if it was already tracked.
    pub fn insert_entity(&mut self, entity: EntityId) -> bool {
        if self.entities.contains_key(&entity) {
            return false;
        }
        self.entities.insert(entity, EntityStatus::default());
        true
    }

    /// Stops tracking `entity`, dropping its state without events.
    ///
    /// If the entity is owned here and frozen, the speed Freeze captured is
    /// written back to `world` first.
    pub fn remove_entity<W>(&mut self, world: &mut W, entity: EntityId) -> bool
    where
        W: EntityPhysics + AuthorityOracle + ?Sized,
    {
        let Some(mut status) = self.entities.remove(&entity) else {
            return false;
        };
        if world.is_authoritative_owner(entity, self.local) {
            status.debuffs.release_freeze(entity, world);
        }
        true
    }

    /// Returns `true` if `entity` is tracked.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Tracked entity ids in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Adds an event observer.
    pub fn subscribe(&mut self, observer: Arc<dyn StatusObserver>) {
        self.bus.subscribe(observer);
    }

    // -------------------------------------------------------------------------
    // Debuffs
    // -------------------------------------------------------------------------

    /// Applies a debuff through mitigation.
    ///
    /// The magnitude is damage per tick for Poison, Burn and Bleed, a
    /// reduction fraction for ArmorBreak, Blind and Weakness, and unused for
    /// Freeze and Stun.
    pub fn apply_debuff<W>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        kind: DebuffKind,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome
    where
        W: StatusWorld,
    {
        let entity = owner.entity();
        if let Some(rejection) = self.check_access(&*world, owner) {
            return rejection;
        }

        let resistance = match kind.resistance_class() {
            ResistanceClass::Magical => world.magical_resistance(entity),
            ResistanceClass::Physical => world.physical_resistance(entity),
        };
        let scale = MagnitudeScale::for_debuff(kind);
        let (duration, magnitude) =
            match self
                .mitigator
                .mitigate(&mut self.rng, resistance, duration, magnitude, scale)
            {
                Mitigation::Resisted => {
                    debug!(%entity, %kind, resistance, "debuff resisted");
                    return ApplyOutcome::Resisted;
                }
                Mitigation::Applied {
                    duration,
                    magnitude,
                } => (duration, magnitude),
            };

        let now = self.clock.now();
        let mut out = Vec::new();
        let Some(status) = self.entities.get_mut(&entity) else {
            return ApplyOutcome::UnknownEntity;
        };
        let application = status.debuffs.apply(
            entity,
            kind,
            duration,
            magnitude,
            now,
            &self.config,
            &mut *world,
            &mut out,
        );
        self.publish(out);
        application.into()
    }

    /// Applies poison: `magnitude` damage every second.
    pub fn apply_poison<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::Poison, magnitude, duration)
    }

    /// Applies burn: `magnitude` damage every half second.
    pub fn apply_burn<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::Burn, magnitude, duration)
    }

    /// Applies bleed: `magnitude` damage every 0.7 s, scaled up at low HP.
    pub fn apply_bleed<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::Bleed, magnitude, duration)
    }

    /// Applies freeze.
    pub fn apply_freeze<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::Freeze, magnitude, duration)
    }

    /// Applies stun.
    pub fn apply_stun<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::Stun, magnitude, duration)
    }

    /// Applies armor break, reducing armor by the `magnitude` fraction.
    pub fn apply_armor_break<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::ArmorBreak, magnitude, duration)
    }

    /// Applies blind, reducing accuracy by the `magnitude` fraction.
    pub fn apply_blind<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::Blind, magnitude, duration)
    }

    /// Applies weakness, reducing outgoing damage by the `magnitude` fraction.
    pub fn apply_weakness<W: StatusWorld>(
        &mut self,
        world: &mut W,
        owner: &Owner,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.apply_debuff(world, owner, DebuffKind::Weakness, magnitude, duration)
    }

    // -------------------------------------------------------------------------
    // Auras
    // -------------------------------------------------------------------------

    /// Starts or overwrites an aura broadcast. No mitigation applies.
    ///
    /// Negative radius and magnitude are clamped to zero and the duration is
    /// floored at the configured minimum.
    pub fn broadcast_aura<A>(
        &mut self,
        authority: &A,
        owner: &Owner,
        kind: AuraKind,
        radius: f32,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome
    where
        A: AuthorityOracle + ?Sized,
    {
        let entity = owner.entity();
        if let Some(rejection) = self.check_access(authority, owner) {
            return rejection;
        }

        let radius = radius.max(0.0);
        let magnitude = magnitude.max(0.0);
        let duration = duration.max(self.config.min_duration);
        if radius > self.config.aura_outer_bound {
            warn!(
                %entity,
                %kind,
                radius,
                outer_bound = self.config.aura_outer_bound,
                "aura radius exceeds aggregation outer bound"
            );
        }

        let Some(status) = self.entities.get_mut(&entity) else {
            return ApplyOutcome::UnknownEntity;
        };
        let refreshed = status
            .auras
            .start(kind, radius, magnitude, duration, self.config.dt);
        debug!(%entity, %kind, radius, magnitude, duration, refreshed, "aura broadcast");
        if refreshed {
            ApplyOutcome::Refreshed
        } else {
            ApplyOutcome::Applied
        }
    }

    /// Broadcasts an attack speed aura.
    pub fn broadcast_attack_speed<A: AuthorityOracle + ?Sized>(
        &mut self,
        authority: &A,
        owner: &Owner,
        radius: f32,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.broadcast_aura(authority, owner, AuraKind::AttackSpeed, radius, magnitude, duration)
    }

    /// Broadcasts a damage aura.
    pub fn broadcast_damage<A: AuthorityOracle + ?Sized>(
        &mut self,
        authority: &A,
        owner: &Owner,
        radius: f32,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.broadcast_aura(authority, owner, AuraKind::Damage, radius, magnitude, duration)
    }

    /// Broadcasts a move speed aura.
    pub fn broadcast_move_speed<A: AuthorityOracle + ?Sized>(
        &mut self,
        authority: &A,
        owner: &Owner,
        radius: f32,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.broadcast_aura(authority, owner, AuraKind::MoveSpeed, radius, magnitude, duration)
    }

    /// Broadcasts a protection aura.
    pub fn broadcast_protection<A: AuthorityOracle + ?Sized>(
        &mut self,
        authority: &A,
        owner: &Owner,
        radius: f32,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.broadcast_aura(authority, owner, AuraKind::Protection, radius, magnitude, duration)
    }

    /// Broadcasts an armor aura.
    pub fn broadcast_armor<A: AuthorityOracle + ?Sized>(
        &mut self,
        authority: &A,
        owner: &Owner,
        radius: f32,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.broadcast_aura(authority, owner, AuraKind::Armor, radius, magnitude, duration)
    }

    /// Broadcasts a critical chance aura.
    pub fn broadcast_critical<A: AuthorityOracle + ?Sized>(
        &mut self,
        authority: &A,
        owner: &Owner,
        radius: f32,
        magnitude: f32,
        duration: f32,
    ) -> ApplyOutcome {
        self.broadcast_aura(authority, owner, AuraKind::Critical, radius, magnitude, duration)
    }

    // -------------------------------------------------------------------------
    // Clearing
    // -------------------------------------------------------------------------

    /// Removes every debuff, restoring frozen movement speed.
    ///
    /// Returns the number of debuffs removed; 0 without authority.
    pub fn clear_all_debuffs<W>(&mut self, world: &mut W, owner: &Owner) -> usize
    where
        W: EntityPhysics + AuthorityOracle + ?Sized,
    {
        if self.check_access(&*world, owner).is_some() {
            return 0;
        }
        let entity = owner.entity();
        let mut out = Vec::new();
        let removed = self
            .entities
            .get_mut(&entity)
            .map_or(0, |status| status.debuffs.clear_all(entity, world, &mut out));
        self.publish(out);
        removed
    }

    /// Ends every broadcast aura.
    ///
    /// Returns the number of auras ended; 0 without authority.
    pub fn clear_all_auras<A>(&mut self, authority: &A, owner: &Owner) -> usize
    where
        A: AuthorityOracle + ?Sized,
    {
        if self.check_access(authority, owner).is_some() {
            return 0;
        }
        let entity = owner.entity();
        let mut out = Vec::new();
        let removed = self
            .entities
            .get_mut(&entity)
            .map_or(0, |status| status.auras.clear_all(entity, &mut out));
        self.publish(out);
        removed
    }

    /// Removes every debuff and broadcast aura and zeroes received bonuses,
    /// in one synchronous call.
    ///
    /// Returns the total number of effects removed; 0 without authority.
    pub fn clear_all_effects<W>(&mut self, world: &mut W, owner: &Owner) -> usize
    where
        W: EntityPhysics + AuthorityOracle + ?Sized,
    {
        if self.check_access(&*world, owner).is_some() {
            return 0;
        }
        let entity = owner.entity();
        let mut out = Vec::new();
        let removed = self.entities.get_mut(&entity).map_or(0, |status| {
            let debuffs = status.debuffs.clear_all(entity, world, &mut out);
            let auras = status.auras.clear_all(entity, &mut out);
            status.auras.set_received(AuraBonuses::NONE);
            debuffs + auras
        });
        debug!(%entity, removed, "cleared all effects");
        self.publish(out);
        removed
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advances the simulation by one fixed step.
    pub fn step<W>(&mut self, world: &mut W)
    where
        W: StatusWorld + Sync,
    {
        self.clock.advance();
        let now = self.clock.now();
        let dt = self.clock.dt();
        let mut out = Vec::new();

        for (&entity, status) in &mut self.entities {
            if !world.is_authoritative_owner(entity, self.local) {
                continue;
            }
            status
                .debuffs
                .advance(entity, now, dt, &self.config, &mut *world, &mut out);
            status.auras.advance(entity, dt, &mut out);
        }

        if self.aggregator.tick(dt) {
            self.aggregate_now(&*world);
        }

        self.publish(out);
    }

    /// Runs an aura aggregation pass immediately, outside the cadence.
    ///
    /// Every tracked entity with a live broadcast is a provider, mirrors
    /// included. Only locally-owned entities receive results.
    pub fn aggregate_now<W>(&mut self, world: &W)
    where
        W: SpatialQuery + AuthorityOracle + Sync + ?Sized,
    {
        let providers = ProviderTable::capture(
            self.entities
                .iter()
                .map(|(id, status)| (*id, status.auras.broadcasts())),
            world,
        );
        let local = self.local;
        let receivers: Vec<EntityId> = self
            .entities
            .keys()
            .copied()
            .filter(|id| world.is_authoritative_owner(*id, local))
            .collect();

        for (id, bonuses) in self.aggregator.aggregate(&providers, &receivers, world) {
            if let Some(status) = self.entities.get_mut(&id) {
                status.auras.set_received(bonuses);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns `true` if `kind` is live on `entity`.
    #[must_use]
    pub fn has_effect(&self, entity: EntityId, kind: DebuffKind) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|s| s.debuffs.is_active(kind))
    }

    /// A copy of the `kind` debuff slot.
    #[must_use]
    pub fn debuff(&self, entity: EntityId, kind: DebuffKind) -> Option<DebuffInstance> {
        self.entities.get(&entity).map(|s| *s.debuffs.get(kind))
    }

    /// A copy of the `kind` broadcast slot.
    #[must_use]
    pub fn broadcast(&self, entity: EntityId, kind: AuraKind) -> Option<AuraBroadcast> {
        self.entities.get(&entity).map(|s| *s.auras.broadcast(kind))
    }

    /// Summary flags of live debuffs.
    #[must_use]
    pub fn active_debuffs(&self, entity: EntityId) -> ActiveDebuffs {
        self.entities
            .get(&entity)
            .map_or(ActiveDebuffs::empty(), |s| s.debuffs.active_flags())
    }

    /// Number of live debuffs.
    #[must_use]
    pub fn active_debuff_count(&self, entity: EntityId) -> usize {
        self.entities
            .get(&entity)
            .map_or(0, |s| s.debuffs.active_count())
    }

    /// Number of live broadcasts.
    #[must_use]
    pub fn active_broadcast_count(&self, entity: EntityId) -> usize {
        self.entities
            .get(&entity)
            .map_or(0, |s| s.auras.active_count())
    }

    /// Returns `true` while Freeze or Stun is live.
    #[must_use]
    pub fn is_movement_locked(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|s| s.debuffs.is_movement_locked())
    }

    /// Armor reduction fraction from ArmorBreak, 0 when inactive.
    #[must_use]
    pub fn armor_break_reduction(&self, entity: EntityId) -> f32 {
        self.reduction(entity, DebuffKind::ArmorBreak)
    }

    /// Accuracy reduction fraction from Blind, 0 when inactive.
    #[must_use]
    pub fn blind_reduction(&self, entity: EntityId) -> f32 {
        self.reduction(entity, DebuffKind::Blind)
    }

    /// Outgoing damage reduction fraction from Weakness, 0 when inactive.
    #[must_use]
    pub fn weakness_reduction(&self, entity: EntityId) -> f32 {
        self.reduction(entity, DebuffKind::Weakness)
    }

    /// Received aura bonuses from the last aggregation pass.
    #[must_use]
    pub fn received(&self, entity: EntityId) -> AuraBonuses {
        self.entities
            .get(&entity)
            .map_or(AuraBonuses::NONE, |s| *s.auras.received())
    }

    /// `1 + strongest attack speed aura`.
    #[must_use]
    pub fn total_attack_speed_multiplier(&self, entity: EntityId) -> f32 {
        self.received(entity).attack_speed_multiplier()
    }

    /// `1 + strongest damage aura`.
    #[must_use]
    pub fn total_damage_multiplier(&self, entity: EntityId) -> f32 {
        self.received(entity).damage_multiplier()
    }

    /// `1 + strongest move speed aura`.
    #[must_use]
    pub fn total_move_speed_multiplier(&self, entity: EntityId) -> f32 {
        self.received(entity).move_speed_multiplier()
    }

    /// Strongest protection aura.
    #[must_use]
    pub fn total_damage_reduction(&self, entity: EntityId) -> f32 {
        self.received(entity).damage_reduction()
    }

    /// `1 + strongest armor aura`.
    #[must_use]
    pub fn total_armor_multiplier(&self, entity: EntityId) -> f32 {
        self.received(entity).armor_multiplier()
    }

    /// Strongest critical aura.
    #[must_use]
    pub fn total_critical_bonus(&self, entity: EntityId) -> f32 {
        self.received(entity).critical_bonus()
    }

    // -------------------------------------------------------------------------
    // Replication
    // -------------------------------------------------------------------------

    /// Captures `entity`'s full status state at the current tick.
    #[must_use]
    pub fn snapshot(&self, entity: EntityId) -> Option<StatusSnapshot> {
        self.entities.get(&entity).map(|s| {
            StatusSnapshot::new(entity, self.clock.tick(), s.debuffs.clone(), s.auras.clone())
        })
    }

    /// Installs a snapshot received from the entity's owner as a mirror.
    ///
    /// Starts tracking the entity if needed. Presentation events are
    /// published for every debuff that turned on or off and every broadcast
    /// that ended since the previous mirror state.
    pub fn apply_replicated<A>(
        &mut self,
        snapshot: StatusSnapshot,
        authority: &A,
    ) -> ReplicationOutcome
    where
        A: AuthorityOracle + ?Sized,
    {
        let entity = snapshot.entity;
        if authority.is_authoritative_owner(entity, self.local) {
            warn!(
                %entity,
                tick = snapshot.tick,
                "refusing replicated state for locally owned entity"
            );
            return ReplicationOutcome::OwnedLocally;
        }
        if !snapshot.is_consistent() {
            warn!(%entity, tick = snapshot.tick, "replicated snapshot flags disagree with slots");
            return ReplicationOutcome::Inconsistent;
        }

        let status = self.entities.entry(entity).or_default();
        if status.replicated_tick.is_some_and(|t| snapshot.tick < t) {
            debug!(%entity, tick = snapshot.tick, "stale replicated snapshot");
            return ReplicationOutcome::Stale;
        }

        let mut out = Vec::new();
        let before = status.debuffs.active_flags();
        for kind in DebuffKind::ALL {
            let was = before.contains(kind.flag());
            let is = snapshot.active.contains(kind.flag());
            if was != is {
                out.push(StatusEvent::StatusEffectChanged {
                    entity,
                    kind,
                    active: is,
                });
            }
        }
        for kind in AuraKind::ALL {
            if status.auras.broadcast(kind).active && !snapshot.auras.broadcast(kind).active {
                out.push(StatusEvent::AuraEnded { entity, kind });
            }
        }

        status.replicated_tick = Some(snapshot.tick);
        status.debuffs = snapshot.debuffs;
        status.auras = snapshot.auras;
        self.publish(out);
        ReplicationOutcome::Installed
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The participant this simulation runs for.
    #[must_use]
    pub fn local(&self) -> ParticipantId {
        self.local
    }

    /// Steps taken so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// The simulation clock.
    #[must_use]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.master_seed
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &StatusConfig {
        &self.config
    }

    /// Number of aggregation passes run so far.
    #[must_use]
    pub fn aggregation_passes(&self) -> u64 {
        self.aggregator.passes()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// `None` if `owner` may mutate its entity here, otherwise the rejection.
    fn check_access<A>(&self, authority: &A, owner: &Owner) -> Option<ApplyOutcome>
    where
        A: AuthorityOracle + ?Sized,
    {
        let entity = owner.entity();
        if owner.participant() != self.local || !owner.is_valid(authority) {
            debug!(
                %entity,
                participant = %owner.participant(),
                "status mutation without authority"
            );
            return Some(ApplyOutcome::Unauthorized);
        }
        if !self.entities.contains_key(&entity) {
            debug!(%entity, "status mutation on untracked entity");
            return Some(ApplyOutcome::UnknownEntity);
        }
        None
    }

    fn reduction(&self, entity: EntityId, kind: DebuffKind) -> f32 {
        self.entities
            .get(&entity)
            .map_or(0.0, |s| s.debuffs.reduction(kind))
    }

    fn publish(&mut self, events: Vec<StatusEvent>) {
        let tick = self.clock.tick();
        for event in events {
            self.bus.publish(tick, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::entity::BodyState;
    use glam::Vec2;

    const GUEST: ParticipantId = ParticipantId::new(7);

    fn setup() -> (StatusSimulation, Arena, EntityId) {
        let mut arena = Arena::new();
        let id = arena.spawn(BodyState::at_position(ParticipantId::HOST, Vec2::ZERO));
        let mut sim = StatusSimulation::new(ParticipantId::HOST, 1);
        sim.insert_entity(id);
        (sim, arena, id)
    }

    fn owner(arena: &Arena, id: EntityId) -> Owner {
        Owner::claim(arena, id, ParticipantId::HOST).expect("host owns")
    }

    mod clock_tests {
        use super::*;

        #[test]
        fn now_is_tick_times_dt() {
            let mut clock = SimClock::new(0.25);
            for _ in 0..8 {
                clock.advance();
            }
            assert_eq!(clock.tick(), 8);
            assert!((clock.now() - 2.0).abs() < 1e-9);
        }
    }

    mod outcome_tests {
        use super::*;

        #[test]
        fn took_effect() {
            assert!(ApplyOutcome::Applied.took_effect());
            assert!(ApplyOutcome::Refreshed.took_effect());
            assert!(!ApplyOutcome::Resisted.took_effect());
            assert!(!ApplyOutcome::Unauthorized.took_effect());
            assert!(!ApplyOutcome::UnknownEntity.took_effect());
        }
    }

    mod access_tests {
        use super::*;

        #[test]
        fn foreign_participant_token_is_rejected() {
            let (mut sim, mut arena, id) = setup();
            arena.transfer_ownership(id, GUEST);
            let guest_token = Owner::claim(&arena, id, GUEST).expect("guest owns now");

            let outcome = sim.apply_poison(&mut arena, &guest_token, 5.0, 3.0);
            assert_eq!(outcome, ApplyOutcome::Unauthorized);
            assert!(!sim.has_effect(id, DebuffKind::Poison));
        }

        #[test]
        fn stale_token_is_rejected() {
            let (mut sim, mut arena, id) = setup();
            let token = owner(&arena, id);
            arena.transfer_ownership(id, GUEST);

            assert_eq!(
                sim.broadcast_damage(&arena, &token, 5.0, 0.2, 5.0),
                ApplyOutcome::Unauthorized
            );
            assert_eq!(sim.active_broadcast_count(id), 0);
        }

        #[test]
        fn untracked_entity() {
            let (mut sim, mut arena, _) = setup();
            let other = arena.spawn(BodyState::at_position(ParticipantId::HOST, Vec2::ONE));
            let token = owner(&arena, other);
            assert_eq!(
                sim.apply_blind(&mut arena, &token, 0.5, 3.0),
                ApplyOutcome::UnknownEntity
            );
        }

        #[test]
        fn insert_is_idempotent() {
            let (mut sim, mut arena, id) = setup();
            assert!(!sim.insert_entity(id));
            assert_eq!(sim.entity_count(), 1);
            assert!(sim.remove_entity(&mut arena, id));
            assert!(!sim.contains(id));
            assert!(!sim.remove_entity(&mut arena, id));
        }

        #[test]
        fn removing_frozen_entity_restores_speed() {
            let (mut sim, mut arena, id) = setup();
            let token = owner(&arena, id);
            let before = arena.current_move_speed(id);
            sim.apply_freeze(&mut arena, &token, 0.0, 5.0);
            assert!(arena.current_move_speed(id) < before);

            assert!(sim.remove_entity(&mut arena, id));
            assert!((arena.current_move_speed(id) - before).abs() < f32::EPSILON);
        }
    }

    mod aura_tests {
        use super::*;

        #[test]
        fn broadcast_clamps_inputs() {
            let (mut sim, arena, id) = setup();
            let token = owner(&arena, id);
            sim.broadcast_armor(&arena, &token, -3.0, -0.5, 0.1);

            let b = sim.broadcast(id, AuraKind::Armor).expect("tracked");
            assert!(b.active);
            assert!(b.radius.abs() < f32::EPSILON);
            assert!(b.magnitude.abs() < f32::EPSILON);
            assert!((b.remaining_duration - 0.5).abs() < f32::EPSILON);
        }

        #[test]
        fn rebroadcast_refreshes() {
            let (mut sim, arena, id) = setup();
            let token = owner(&arena, id);
            assert_eq!(
                sim.broadcast_critical(&arena, &token, 5.0, 0.1, 5.0),
                ApplyOutcome::Applied
            );
            assert_eq!(
                sim.broadcast_critical(&arena, &token, 5.0, 0.2, 5.0),
                ApplyOutcome::Refreshed
            );
        }

        #[test]
        fn aggregate_now_updates_owned_receivers() {
            let (mut sim, arena, id) = setup();
            let token = owner(&arena, id);
            sim.broadcast_move_speed(&arena, &token, 4.0, 0.15, 5.0);
            assert!((sim.total_move_speed_multiplier(id) - 1.0).abs() < f32::EPSILON);

            sim.aggregate_now(&arena);
            assert!((sim.total_move_speed_multiplier(id) - 1.15).abs() < 1e-6);
            assert_eq!(sim.aggregation_passes(), 1);
        }
    }

    mod reduction_tests {
        use super::*;

        #[test]
        fn reductions_default_to_zero() {
            let (sim, _, id) = setup();
            assert!(sim.armor_break_reduction(id).abs() < f32::EPSILON);
            assert!(sim.blind_reduction(id).abs() < f32::EPSILON);
            assert!(sim.weakness_reduction(id).abs() < f32::EPSILON);
        }

        #[test]
        fn reductions_are_clamped_fractions() {
            let (mut sim, mut arena, id) = setup();
            let token = owner(&arena, id);
            sim.apply_armor_break(&mut arena, &token, 0.4, 5.0);
            sim.apply_weakness(&mut arena, &token, 3.0, 5.0);

            assert!((sim.armor_break_reduction(id) - 0.4).abs() < 1e-6);
            assert!((sim.weakness_reduction(id) - 1.0).abs() < f32::EPSILON);
            assert_eq!(sim.active_debuff_count(id), 2);
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn invalid_config_is_rejected() {
            let config = StatusConfig::default().with_dt(0.0);
            assert!(StatusSimulation::with_config(ParticipantId::HOST, config, 0).is_err());
        }

        #[test]
        fn seed_is_kept() {
            let sim = StatusSimulation::new(ParticipantId::HOST, 99);
            assert_eq!(sim.seed(), 99);
            assert_eq!(sim.local(), ParticipantId::HOST);
            assert_eq!(sim.tick(), 0);
        }
    }
}
