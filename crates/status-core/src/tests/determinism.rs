//! Determinism verification tests.
//!
//! The simulation must produce identical results when started with the same
//! seed and given identical inputs. Replays, lockstep verification and
//! host migration all depend on it.

use glam::Vec2;

use crate::aggregator::{AuraAggregator, ProviderTable};
use crate::arena::Arena;
use crate::aura::AuraBonuses;
use crate::effect::{AuraBroadcast, AuraKind, DebuffKind};
use crate::entity::{BodyState, EntityId, ParticipantId, Resistances};
use crate::events::EventEnvelope;
use crate::replication::StatusSnapshot;
use crate::simulation::{ApplyOutcome, StatusSimulation};
use crate::world::SpatialQuery;

use super::helpers::{attach_log, host_sim, owner_of, spawn_resistant};

// =============================================================================
// Scenario
// =============================================================================

type ScenarioResult = (Vec<EventEnvelope>, Vec<ApplyOutcome>, Vec<StatusSnapshot>);

/// A ring of resistant entities trading debuffs and auras for a few seconds.
///
/// Returns the full event stream, every apply outcome and final snapshots.
fn run_scenario(seed: u64) -> ScenarioResult {
    let mut sim = host_sim(seed);
    let mut arena = Arena::new();
    let log = attach_log(&mut sim);

    #[allow(clippy::cast_precision_loss)]
    let ids: Vec<EntityId> = (0..8)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / 8.0;
            spawn_resistant(
                &mut sim,
                &mut arena,
                Vec2::new(angle.cos(), angle.sin()) * 4.0,
                Resistances::new(50.0, 35.0),
            )
        })
        .collect();

    let mut outcomes = Vec::new();
    for round in 0..6 {
        for (i, &id) in ids.iter().enumerate() {
            let owner = owner_of(&arena, id);
            let kind = DebuffKind::ALL[(i + round) % DebuffKind::COUNT];
            outcomes.push(sim.apply_debuff(&mut arena, &owner, kind, 6.0, 2.0));
            if (i + round) % 3 == 0 {
                let aura = AuraKind::ALL[(i + round) % AuraKind::COUNT];
                #[allow(clippy::cast_precision_loss)]
                let magnitude = 0.05 * (i + 1) as f32;
                outcomes.push(sim.broadcast_aura(&arena, &owner, aura, 5.0, magnitude, 1.5));
            }
        }
        for _ in 0..7 {
            sim.step(&mut arena);
        }
    }

    let snapshots = ids
        .iter()
        .map(|id| sim.snapshot(*id).expect("tracked"))
        .collect();
    (log.take_events(), outcomes, snapshots)
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn same_seed_same_event_stream() {
    let (events_a, outcomes_a, snapshots_a) = run_scenario(42);
    let (events_b, outcomes_b, snapshots_b) = run_scenario(42);

    assert!(!events_a.is_empty());
    assert_eq!(events_a, events_b);
    assert_eq!(outcomes_a, outcomes_b);
    assert_eq!(snapshots_a, snapshots_b);
}

#[test]
fn different_seed_different_resists() {
    let (_, outcomes_a, _) = run_scenario(1);
    let (_, outcomes_b, _) = run_scenario(2);
    assert_ne!(outcomes_a, outcomes_b);
}

#[test]
fn resists_actually_happen() {
    let (_, outcomes, _) = run_scenario(7);
    assert!(outcomes.contains(&ApplyOutcome::Resisted));
    assert!(outcomes.iter().any(|o| o.took_effect()));
}

#[test]
fn event_sequence_numbers_restart_each_tick() {
    let (events, _, _) = run_scenario(42);
    for pair in events.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(b.tick() >= a.tick());
        if b.tick() == a.tick() {
            assert_eq!(b.sequence(), a.sequence() + 1);
        } else {
            assert_eq!(b.sequence(), 0);
        }
    }
}

#[test]
fn snapshot_json_round_trip_is_lossless() {
    let (_, _, snapshots) = run_scenario(42);
    for snapshot in snapshots {
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: StatusSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
    }
}

#[test]
fn fresh_simulations_start_identical() {
    let a = StatusSimulation::new(ParticipantId::HOST, 5);
    let b = StatusSimulation::new(ParticipantId::HOST, 5);
    assert_eq!(a.tick(), b.tick());
    assert_eq!(a.seed(), b.seed());
}

// =============================================================================
// Parallel aggregation
// =============================================================================

/// One provider's frozen position and slots.
type ProviderRow = (Vec2, [AuraBroadcast; AuraKind::COUNT]);

/// A grid of providers, each broadcasting one kind.
fn grid(n: u64) -> (Arena, ProviderTable, Vec<EntityId>, Vec<ProviderRow>) {
    let mut arena = Arena::new();
    let mut providers = ProviderTable::new();
    let mut ids = Vec::new();
    let mut rows = Vec::new();
    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let pos = Vec2::new((i % 10) as f32 * 1.5, (i / 10) as f32 * 1.5);
        let id = arena.spawn(BodyState::at_position(ParticipantId::HOST, pos));
        let mut slots = [AuraBroadcast::default(); AuraKind::COUNT];
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        {
            slots[(i % 6) as usize] = AuraBroadcast {
                active: true,
                radius: 2.0 + (i % 4) as f32,
                magnitude: 0.01 * (i % 17) as f32,
                remaining_duration: 5.0,
                remaining_steps: 50,
            };
        }
        providers.insert(id, pos, slots);
        ids.push(id);
        rows.push((pos, slots));
    }
    (arena, providers, ids, rows)
}

/// Single-threaded reference: every provider against one receiver.
fn brute_force(arena: &Arena, rows: &[ProviderRow], receiver: EntityId) -> AuraBonuses {
    let mut bonuses = AuraBonuses::NONE;
    let Some(pos) = arena.position(receiver) else {
        return bonuses;
    };
    for (provider_pos, slots) in rows {
        let distance = pos.distance(*provider_pos);
        if distance > 10.0 {
            continue;
        }
        for kind in AuraKind::ALL {
            let b = &slots[kind.index()];
            if b.active && distance <= b.radius {
                bonuses.raise(kind, b.magnitude);
            }
        }
    }
    bonuses
}

#[test]
fn parallel_aggregation_matches_brute_force() {
    let (arena, providers, ids, rows) = grid(60);

    let mut aggregator = AuraAggregator::default();
    let results = aggregator.aggregate(&providers, &ids, &arena);

    assert_eq!(results.len(), ids.len());
    for ((id, bonuses), expected_id) in results.iter().zip(&ids) {
        assert_eq!(id, expected_id);
        assert_eq!(*bonuses, brute_force(&arena, &rows, *id));
    }
}

#[test]
fn repeated_passes_are_identical() {
    let (arena, providers, ids, _) = grid(40);
    let mut aggregator = AuraAggregator::default();
    let first = aggregator.aggregate(&providers, &ids, &arena);
    let second = aggregator.aggregate(&providers, &ids, &arena);
    assert_eq!(first, second);
}
