//! Test helper functions for setting up simulations and bodies.

use std::sync::Arc;

use glam::Vec2;

use crate::arena::Arena;
use crate::config::StatusConfig;
use crate::entity::{BodyState, EntityId, Owner, ParticipantId, Resistances};
use crate::events::{EventLog, StatusEvent};
use crate::simulation::StatusSimulation;

/// The remote participant used by authority tests.
pub const GUEST: ParticipantId = ParticipantId::new(2);

/// Coarse timestep so durations map to round step counts.
pub const TEST_DT: f32 = 0.1;

/// Default config with a 0.1 s timestep.
pub fn test_config() -> StatusConfig {
    StatusConfig::default().with_dt(TEST_DT)
}

/// A host-side simulation using [`test_config`].
pub fn host_sim(seed: u64) -> StatusSimulation {
    StatusSimulation::with_config(ParticipantId::HOST, test_config(), seed)
        .expect("test config is valid")
}

/// A guest-side simulation using [`test_config`].
pub fn guest_sim(seed: u64) -> StatusSimulation {
    StatusSimulation::with_config(GUEST, test_config(), seed).expect("test config is valid")
}

/// Spawns a host-owned body at `pos` and tracks it in `sim`.
pub fn spawn_tracked(sim: &mut StatusSimulation, arena: &mut Arena, pos: Vec2) -> EntityId {
    spawn_with(sim, arena, BodyState::at_position(ParticipantId::HOST, pos))
}

/// Spawns a host-owned body with resistances and tracks it in `sim`.
pub fn spawn_resistant(
    sim: &mut StatusSimulation,
    arena: &mut Arena,
    pos: Vec2,
    resistances: Resistances,
) -> EntityId {
    spawn_with(
        sim,
        arena,
        BodyState::at_position(ParticipantId::HOST, pos).with_resistances(resistances),
    )
}

/// Spawns `body` and tracks it in `sim`.
pub fn spawn_with(sim: &mut StatusSimulation, arena: &mut Arena, body: BodyState) -> EntityId {
    let id = arena.spawn(body);
    sim.insert_entity(id);
    id
}

/// Claims the token for `id` as the participant that owns it in `arena`.
pub fn owner_of(arena: &Arena, id: EntityId) -> Owner {
    let participant = arena.get(id).expect("body exists").owner;
    Owner::claim(arena, id, participant).expect("body owner can claim")
}

/// Subscribes a log for every event kind.
pub fn attach_log(sim: &mut StatusSimulation) -> Arc<EventLog> {
    let log = Arc::new(EventLog::new());
    sim.subscribe(log.clone());
    log
}

/// Steps `sim` `n` times.
pub fn run_steps(sim: &mut StatusSimulation, arena: &mut Arena, n: usize) {
    for _ in 0..n {
        sim.step(arena);
    }
}

/// Drains `log` and returns the bare events.
pub fn drain(log: &EventLog) -> Vec<StatusEvent> {
    log.take_events()
        .into_iter()
        .map(crate::events::EventEnvelope::into_event)
        .collect()
}

/// Installs a test-writer subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
