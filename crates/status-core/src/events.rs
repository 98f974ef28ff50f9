//! Effect event bus.
//!
//! The status core never touches HP or presentation directly. Everything it
//! wants the outside world to know leaves through a [`StatusEvent`]:
//! - [`StatusEvent::StatusDamage`]: tick damage for the combat resolver
//! - [`StatusEvent::StatusEffectChanged`]: a debuff started or ended
//! - [`StatusEvent::StatusDamageFlash`]: a DoT ticked (hit flash, numbers)
//! - [`StatusEvent::AuraEnded`]: a broadcast aura stopped
//!
//! Events are wrapped in an [`EventEnvelope`] carrying the simulation tick and
//! a per-tick sequence number, and routed to every [`StatusObserver`] whose
//! [`handles()`](StatusObserver::handles) includes the event's [`EventKind`].
//! Observers receive shared references only and cannot reach back into the
//! simulation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use status_core::events::{EventBus, EventKind, EventLog, StatusEvent};
//! use status_core::effect::DebuffKind;
//! use status_core::entity::EntityId;
//!
//! let log = Arc::new(EventLog::for_kinds(&[EventKind::EffectChanged]));
//! let mut bus = EventBus::new();
//! bus.subscribe(log.clone());
//!
//! bus.publish(3, StatusEvent::StatusEffectChanged {
//!     entity: EntityId::new(1),
//!     kind: DebuffKind::Stun,
//!     active: true,
//! });
//! bus.publish(3, StatusEvent::StatusDamageFlash {
//!     entity: EntityId::new(1),
//!     kind: DebuffKind::Burn,
//! });
//!
//! // Only the kind the log subscribed to was delivered.
//! assert_eq!(log.event_count(), 1);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::effect::{AuraKind, DamageClass, DebuffKind};
use crate::entity::EntityId;

// =============================================================================
// Events
// =============================================================================

/// Routing category of a [`StatusEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// [`StatusEvent::StatusDamage`]
    StatusDamage,
    /// [`StatusEvent::StatusEffectChanged`]
    EffectChanged,
    /// [`StatusEvent::StatusDamageFlash`]
    DamageFlash,
    /// [`StatusEvent::AuraEnded`]
    AuraEnded,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [Self; 4] = [
        Self::StatusDamage,
        Self::EffectChanged,
        Self::DamageFlash,
        Self::AuraEnded,
    ];
}

/// Something the status core reports to the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusEvent {
    /// A damage-over-time effect ticked.
    StatusDamage {
        /// Entity taking damage.
        entity: EntityId,
        /// Damage before the resolver's own mitigation.
        amount: i32,
        /// Damage class for the resolver's mitigation pipeline.
        class: DamageClass,
    },
    /// A debuff became active or inactive.
    StatusEffectChanged {
        /// Affected entity.
        entity: EntityId,
        /// Debuff that changed.
        kind: DebuffKind,
        /// `true` on application or refresh, `false` on removal.
        active: bool,
    },
    /// A damage-over-time tick, for hit flashes and damage numbers.
    StatusDamageFlash {
        /// Entity that ticked.
        entity: EntityId,
        /// Debuff that ticked.
        kind: DebuffKind,
    },
    /// A broadcast aura stopped.
    AuraEnded {
        /// Entity that was broadcasting.
        entity: EntityId,
        /// Aura that ended.
        kind: AuraKind,
    },
}

impl StatusEvent {
    /// Routing category of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::StatusDamage { .. } => EventKind::StatusDamage,
            Self::StatusEffectChanged { .. } => EventKind::EffectChanged,
            Self::StatusDamageFlash { .. } => EventKind::DamageFlash,
            Self::AuraEnded { .. } => EventKind::AuraEnded,
        }
    }

    /// The entity the event is about.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match self {
            Self::StatusDamage { entity, .. }
            | Self::StatusEffectChanged { entity, .. }
            | Self::StatusDamageFlash { entity, .. }
            | Self::AuraEnded { entity, .. } => *entity,
        }
    }

    /// Returns `true` for removal events (debuff deactivated or aura ended).
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        matches!(
            self,
            Self::StatusEffectChanged { active: false, .. } | Self::AuraEnded { .. }
        )
    }
}

/// An event with its position in the simulation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event: StatusEvent,
    tick: u64,
    sequence: u32,
}

impl EventEnvelope {
    /// Creates a new envelope.
    #[must_use]
    pub const fn new(event: StatusEvent, tick: u64, sequence: u32) -> Self {
        Self {
            event,
            tick,
            sequence,
        }
    }

    /// The wrapped event.
    #[must_use]
    pub const fn event(&self) -> &StatusEvent {
        &self.event
    }

    /// Simulation tick the event was emitted on.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Emission order within the tick.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Unwraps the event.
    #[must_use]
    pub fn into_event(self) -> StatusEvent {
        self.event
    }
}

// =============================================================================
// Observers
// =============================================================================

/// Subscriber to status events.
///
/// Observers are shared across the bus and the embedding code, so they take
/// `&self`; use interior mutability to record events.
pub trait StatusObserver: Send + Sync {
    /// The event kinds this observer wants to receive.
    fn handles(&self) -> &[EventKind];

    /// Called once per published event whose kind is in [`handles()`](Self::handles).
    fn observe(&self, envelope: &EventEnvelope);
}

/// Observer that buffers events until drained.
#[derive(Debug)]
pub struct EventLog {
    kinds: Vec<EventKind>,
    log: Mutex<Vec<EventEnvelope>>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Creates a log that records every event kind.
    #[must_use]
    pub fn new() -> Self {
        Self::for_kinds(&EventKind::ALL)
    }

    /// Creates a log that records only `kinds`.
    #[must_use]
    pub fn for_kinds(kinds: &[EventKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Drains and returns all recorded events in emission order.
    pub fn take_events(&self) -> Vec<EventEnvelope> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns a copy of the recorded events without draining them.
    #[must_use]
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.lock().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discards all recorded events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventEnvelope>> {
        // A poisoned log only means an observer panicked mid-push; the Vec is intact.
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatusObserver for EventLog {
    fn handles(&self) -> &[EventKind] {
        &self.kinds
    }

    fn observe(&self, envelope: &EventEnvelope) {
        self.lock().push(envelope.clone());
    }
}

// =============================================================================
// Bus
// =============================================================================

/// Fan-out of status events to subscribed observers.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Arc<dyn StatusObserver>>,
    tick: u64,
    sequence: u32,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &format!("[{} observers]", self.observers.len()))
            .field("tick", &self.tick)
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl EventBus {
    /// Creates a bus with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer. Observers are notified in subscription order.
    pub fn subscribe(&mut self, observer: Arc<dyn StatusObserver>) {
        self.observers.push(observer);
    }

    /// Number of subscribed observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Stamps `event` with `tick` and the next sequence number, then delivers it.
    pub fn publish(&mut self, tick: u64, event: StatusEvent) {
        if tick != self.tick {
            self.tick = tick;
            self.sequence = 0;
        }
        let envelope = EventEnvelope::new(event, tick, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);

        let kind = envelope.event().kind();
        for observer in &self.observers {
            if observer.handles().contains(&kind) {
                observer.observe(&envelope);
            }
        }
    }
}
