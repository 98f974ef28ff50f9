//! Periodic spatial aggregation of aura bonuses.
//!
//! An aggregation pass runs in two phases:
//!
//! 1. **Freeze**: capture every provider's position and broadcast slots into
//!    a [`ProviderTable`]. Nothing the pass computes can observe a later
//!    write.
//! 2. **Compute**: for each receiver (in parallel), query the spatial index
//!    within the outer bound and take, per kind, the maximum magnitude of
//!    any provider whose own radius covers the receiver.
//!
//! Results come back in receiver order and the caller commits them
//! sequentially, so the pass is atomic from the outside.
//!
//! The aggregator runs on its own cadence (default every 0.5 s), tracked by
//! [`AuraAggregator::tick`].

use std::collections::BTreeMap;

use glam::Vec2;
use rayon::prelude::*;
use tracing::debug;

use crate::aura::AuraBonuses;
use crate::config::StatusConfig;
use crate::effect::{AuraBroadcast, AuraKind};
use crate::entity::EntityId;
use crate::world::SpatialQuery;

/// Slack when comparing the cadence accumulator against the interval.
const CADENCE_EPSILON: f32 = 1e-4;

/// Frozen view of every live provider for one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    providers: BTreeMap<EntityId, (Vec2, [AuraBroadcast; AuraKind::COUNT])>,
}

impl ProviderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the entries that broadcast at least one aura and have a position.
    pub fn capture<'a, I, S>(entries: I, spatial: &S) -> Self
    where
        I: IntoIterator<Item = (EntityId, &'a [AuraBroadcast; AuraKind::COUNT])>,
        S: SpatialQuery + ?Sized,
    {
        let mut table = Self::new();
        for (id, broadcasts) in entries {
            if !broadcasts.iter().any(|b| b.active) {
                continue;
            }
            if let Some(position) = spatial.position(id) {
                table.insert(id, position, *broadcasts);
            }
        }
        table
    }

    /// Adds or replaces one provider.
    pub fn insert(
        &mut self,
        id: EntityId,
        position: Vec2,
        broadcasts: [AuraBroadcast; AuraKind::COUNT],
    ) {
        self.providers.insert(id, (position, broadcasts));
    }

    /// Number of providers captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if nobody is broadcasting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn get(&self, id: EntityId) -> Option<&(Vec2, [AuraBroadcast; AuraKind::COUNT])> {
        self.providers.get(&id)
    }
}

/// Aura aggregation cadence and pass execution.
#[derive(Debug, Clone)]
pub struct AuraAggregator {
    accumulator: f32,
    interval: f32,
    outer_bound: f32,
    passes: u64,
}

impl Default for AuraAggregator {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

impl AuraAggregator {
    /// Builds an aggregator with the configured cadence and outer bound.
    #[must_use]
    pub fn from_config(config: &StatusConfig) -> Self {
        Self {
            accumulator: 0.0,
            interval: config.aggregation_interval,
            outer_bound: config.aura_outer_bound,
            passes: 0,
        }
    }

    /// Seconds between passes.
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Radius of the provider search around each receiver.
    #[must_use]
    pub fn outer_bound(&self) -> f32 {
        self.outer_bound
    }

    /// Number of passes run so far.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Advances the cadence by `dt`. Returns `true` when a pass is due.
    ///
    /// At most one pass is reported per call, even if `dt` spans several
    /// intervals.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.accumulator += dt;
        if self.accumulator + CADENCE_EPSILON >= self.interval {
            self.accumulator = (self.accumulator - self.interval).max(0.0);
            true
        } else {
            false
        }
    }

    /// Computes fresh bonuses for every receiver from the frozen `providers`.
    ///
    /// Returns `(receiver, bonuses)` pairs in the order of `receivers`.
    /// Receivers with no position get [`AuraBonuses::NONE`].
    pub fn aggregate<S>(
        &mut self,
        providers: &ProviderTable,
        receivers: &[EntityId],
        spatial: &S,
    ) -> Vec<(EntityId, AuraBonuses)>
    where
        S: SpatialQuery + Sync + ?Sized,
    {
        self.passes += 1;
        let outer_bound = self.outer_bound;

        let results: Vec<(EntityId, AuraBonuses)> = receivers
            .par_iter()
            .map(|&receiver| {
                let bonuses = spatial.position(receiver).map_or(AuraBonuses::NONE, |pos| {
                    bonuses_at(pos, providers, spatial, outer_bound)
                });
                (receiver, bonuses)
            })
            .collect();

        debug!(
            pass = self.passes,
            providers = providers.len(),
            receivers = receivers.len(),
            "aura aggregation"
        );
        results
    }
}

/// Per-kind maximum over every in-range provider covering `position`.
fn bonuses_at<S>(
    position: Vec2,
    providers: &ProviderTable,
    spatial: &S,
    outer_bound: f32,
) -> AuraBonuses
where
    S: SpatialQuery + ?Sized,
{
    let mut bonuses = AuraBonuses::NONE;
    if providers.is_empty() {
        return bonuses;
    }

    for candidate in spatial.query_entities_in_radius(position, outer_bound) {
        let Some((provider_pos, broadcasts)) = providers.get(candidate) else {
            continue;
        };
        let distance = position.distance(*provider_pos);
        for kind in AuraKind::ALL {
            let broadcast = &broadcasts[kind.index()];
            if broadcast.active && distance <= broadcast.radius {
                bonuses.raise(kind, broadcast.magnitude);
            }
        }
    }
    bonuses
}
